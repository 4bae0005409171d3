//! Behavior-swap operators: rebind registry entries on one board.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::board::Board;
use crate::card::DeckKind;
use crate::dice::{DieDistribution, DieType};
use crate::error::{BoardError, BoardResult};
use crate::location::LocationKind;
use crate::registry::{ExtensionRegistry, HookId};
use crate::run_log::RunLog;

/// One hook rebind inside a compound operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRequest {
    pub hook: HookId,
    pub handler: String,
}

impl HookRequest {
    #[must_use]
    pub fn new(hook: HookId, handler: impl Into<String>) -> Self {
        Self {
            hook,
            handler: handler.into(),
        }
    }
}

/// Harsher jail rules: entering costs turns, the fine doubles, post-roll movement uses
/// the highest die, and a negative balance sends the player to jail.
#[must_use]
pub fn jail_overhaul() -> Vec<HookRequest> {
    vec![
        HookRequest::new(HookId::JailEntry, "jail_entry_with_lost_turns"),
        HookRequest::new(HookId::PostRollMovement, "max_die_post_roll_movement"),
        HookRequest::new(HookId::NegativeCash, "negative_cash_goes_to_jail"),
        HookRequest::new(HookId::JailFine, "doubled_jail_fine"),
    ]
}

fn target_dice(board: &Board, die: Option<usize>) -> BoardResult<Vec<usize>> {
    match die {
        None => Ok((0..board.dice.len()).collect()),
        Some(index) if index < board.dice.len() => Ok(vec![index]),
        Some(index) => Err(BoardError::validation(format!(
            "no die {index}; the board has {}",
            board.dice.len()
        ))),
    }
}

pub(super) fn die_distribution(
    board: &mut Board,
    die: Option<usize>,
    distribution: DieDistribution,
    registry: &ExtensionRegistry,
) -> BoardResult<()> {
    registry.resolve_die_roll(distribution.handler_name())?;
    for index in target_dice(board, die)? {
        board.dice[index].set_distribution(distribution, registry)?;
    }
    Ok(())
}

pub(super) fn die_type(
    board: &mut Board,
    die: Option<usize>,
    die_type: DieType,
) -> BoardResult<()> {
    let targets = target_dice(board, die)?;
    for &index in &targets {
        let faces = board.dice[index].faces();
        if !faces.iter().any(|face| die_type.admits(*face)) {
            return Err(BoardError::validation(format!(
                "die {index} has no faces left under {die_type:?}"
            )));
        }
    }
    for index in targets {
        board.dice[index].set_die_type(die_type)?;
    }
    Ok(())
}

fn check_card_names(board: &Board, deck: DeckKind, cards: &BTreeSet<String>) -> BoardResult<()> {
    let pile = board.pile(deck);
    if let Some(missing) = cards.iter().find(|name| pile.template(name).is_none()) {
        return Err(BoardError::validation(format!(
            "{} has no card named `{missing}`",
            deck.as_str()
        )));
    }
    Ok(())
}

pub(super) fn card_action(
    board: &mut Board,
    deck: DeckKind,
    cards: &BTreeSet<String>,
    handler: &str,
    registry: &ExtensionRegistry,
    log: &mut RunLog,
) -> BoardResult<()> {
    let binding = registry.resolve_card(handler)?;
    check_card_names(board, deck, cards)?;
    let changed = board.pile_mut(deck).rebind_action(cards, &binding);
    log.debug(format!("rebound action of {changed} {} cards to `{handler}`", deck.as_str()));
    Ok(())
}

/// Cards without a contingency slot are skipped.
pub(super) fn card_contingency(
    board: &mut Board,
    deck: DeckKind,
    cards: &BTreeSet<String>,
    handler: &str,
    registry: &ExtensionRegistry,
    log: &mut RunLog,
) -> BoardResult<()> {
    let binding = registry.resolve_card(handler)?;
    check_card_names(board, deck, cards)?;
    let changed = board.pile_mut(deck).rebind_contingency(cards, &binding);
    log.debug(format!(
        "rebound contingency of {changed} {} cards to `{handler}`",
        deck.as_str()
    ));
    Ok(())
}

pub(super) fn location_action(
    board: &mut Board,
    location: &str,
    handler: &str,
    registry: &ExtensionRegistry,
) -> BoardResult<()> {
    let binding = registry.resolve_location(handler)?;
    match &mut board.location_mut(location)?.kind {
        LocationKind::Action { perform_action } => {
            *perform_action = binding;
            Ok(())
        }
        _ => Err(BoardError::validation(format!(
            "`{location}` is not an action location"
        ))),
    }
}

pub(super) fn rent_strategy(
    board: &mut Board,
    handler: &str,
    registry: &ExtensionRegistry,
) -> BoardResult<()> {
    board.rent_strategy = registry.resolve_rent(handler)?;
    Ok(())
}

/// Resolve every binding first so an unknown name leaves all hooks untouched.
pub(super) fn compound_hooks(
    board: &mut Board,
    bindings: &[HookRequest],
    registry: &ExtensionRegistry,
) -> BoardResult<()> {
    if bindings.is_empty() {
        return Err(BoardError::validation("compound operator binds no hooks"));
    }
    let mut seen = HashSet::with_capacity(bindings.len());
    let mut resolved = Vec::with_capacity(bindings.len());
    for request in bindings {
        if !seen.insert(request.hook) {
            return Err(BoardError::validation(format!(
                "hook {:?} is bound twice",
                request.hook
            )));
        }
        resolved.push((request.hook, registry.resolve_hook(&request.handler)?));
    }
    for (hook, binding) in resolved {
        board.hooks.install(hook, binding);
    }
    Ok(())
}
