//! Novelty operators: named, categorized mutations applied to a board between games.
//!
//! A [`Novelty`] is a closed request type. Each variant maps onto one operator in
//! one of four families (attribute, cardinality, behavior swap, topology). Every
//! application runs against a working copy of the board, which replaces the
//! original only when the operator succeeds, and is recorded in the board's
//! mutation history with fingerprints taken before and after.
mod attribute;
mod behavior;
mod cardinality;
mod topology;

pub use attribute::{BoardUpdate, CardUpdate, LocationUpdate};
pub use behavior::{HookRequest, jail_overhaul};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::board::Board;
use crate::card::{DeckKind, ExpectedTotal};
use crate::dice::{DieDistribution, DieType};
use crate::error::{BoardResult, NoveltyError};
use crate::history::NoveltyCategory;
use crate::registry::{ExtensionRegistry, HookId};
use crate::run_log::RunLog;

/// One mutation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "novelty", rename_all = "snake_case")]
pub enum Novelty {
    LocationAttribute {
        location: String,
        update: LocationUpdate,
    },
    /// Applies to every copy of the named card and to its template.
    CardAttribute {
        deck: DeckKind,
        card: String,
        update: CardUpdate,
    },
    BoardAttribute {
        update: BoardUpdate,
    },
    DieFaces {
        die: usize,
        faces: Vec<u32>,
    },
    /// Replace every die; `faces` lists one face set per die.
    DieCount {
        count: usize,
        faces: Vec<Vec<u32>>,
    },
    DeckComposition {
        deck: DeckKind,
        counts: BTreeMap<String, usize>,
        #[serde(default)]
        expected_total: Option<ExpectedTotal>,
    },
    /// `die: None` targets every die.
    DieDistribution {
        #[serde(default)]
        die: Option<usize>,
        distribution: DieDistribution,
    },
    DieType {
        #[serde(default)]
        die: Option<usize>,
        die_type: DieType,
    },
    CardAction {
        deck: DeckKind,
        cards: BTreeSet<String>,
        handler: String,
    },
    CardContingency {
        deck: DeckKind,
        cards: BTreeSet<String>,
        handler: String,
    },
    LocationAction {
        location: String,
        handler: String,
    },
    RentStrategy {
        handler: String,
    },
    Hook {
        hook: HookId,
        handler: String,
    },
    /// Several hook rebinds applied as one named mutation.
    CompoundHooks {
        label: String,
        bindings: Vec<HookRequest>,
    },
    GlobalReordering {
        sequence: Vec<String>,
    },
    ColorReordering {
        color: String,
        locations: Vec<String>,
    },
    Granularity {
        location: String,
        new_end_position: usize,
    },
}

impl Novelty {
    #[must_use]
    pub const fn category(&self) -> NoveltyCategory {
        match self {
            Self::LocationAttribute { .. }
            | Self::CardAttribute { .. }
            | Self::BoardAttribute { .. } => NoveltyCategory::Attribute,
            Self::DieFaces { .. } | Self::DieCount { .. } | Self::DeckComposition { .. } => {
                NoveltyCategory::Cardinality
            }
            Self::DieDistribution { .. }
            | Self::DieType { .. }
            | Self::CardAction { .. }
            | Self::CardContingency { .. }
            | Self::LocationAction { .. }
            | Self::RentStrategy { .. }
            | Self::Hook { .. }
            | Self::CompoundHooks { .. } => NoveltyCategory::BehaviorSwap,
            Self::GlobalReordering { .. }
            | Self::ColorReordering { .. }
            | Self::Granularity { .. } => NoveltyCategory::Topology,
        }
    }

    /// Operator name used in errors, logs, and the mutation history.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::LocationAttribute { .. } => "location_attribute",
            Self::CardAttribute { .. } => "card_attribute",
            Self::BoardAttribute { .. } => "board_attribute",
            Self::DieFaces { .. } => "die_faces",
            Self::DieCount { .. } => "die_count",
            Self::DeckComposition { .. } => "deck_composition",
            Self::DieDistribution { .. } => "die_distribution",
            Self::DieType { .. } => "die_type",
            Self::CardAction { .. } => "card_action",
            Self::CardContingency { .. } => "card_contingency",
            Self::LocationAction { .. } => "location_action",
            Self::RentStrategy { .. } => "rent_strategy",
            Self::Hook { .. } => "hook",
            Self::CompoundHooks { .. } => "compound_hooks",
            Self::GlobalReordering { .. } => "global_reordering",
            Self::ColorReordering { .. } => "color_reordering",
            Self::Granularity { .. } => "granularity",
        }
    }

    /// Name of the entity the novelty targets.
    #[must_use]
    pub fn target(&self) -> String {
        match self {
            Self::LocationAttribute { location, .. }
            | Self::LocationAction { location, .. }
            | Self::Granularity { location, .. } => location.clone(),
            Self::CardAttribute { deck, card, .. } => format!("{}/{card}", deck.as_str()),
            Self::BoardAttribute { update } => update.knob().to_string(),
            Self::DieFaces { die, .. } => format!("die {die}"),
            Self::DieDistribution { die, .. } | Self::DieType { die, .. } => {
                die.map_or_else(|| "dice".to_string(), |die| format!("die {die}"))
            }
            Self::DieCount { .. } => "dice".to_string(),
            Self::DeckComposition { deck, .. } => deck.as_str().to_string(),
            Self::CardAction { deck, cards, .. } | Self::CardContingency { deck, cards, .. } => {
                let names: Vec<&str> = cards.iter().map(String::as_str).collect();
                format!("{}/{}", deck.as_str(), names.join(","))
            }
            Self::RentStrategy { .. } => "rent".to_string(),
            Self::Hook { hook, .. } => format!("{hook:?}"),
            Self::CompoundHooks { label, .. } => label.clone(),
            Self::GlobalReordering { .. } => "board".to_string(),
            Self::ColorReordering { color, .. } => color.clone(),
        }
    }

    /// Apply to `board`, leaving it untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns a [`NoveltyError`] naming this operator and its target when the board is
    /// leased to a running game or the operator rejects the request.
    pub fn apply(
        &self,
        board: &mut Board,
        registry: &ExtensionRegistry,
        log: &mut RunLog,
    ) -> Result<(), NoveltyError> {
        let mut working = board.clone();
        self.apply_in_place(&mut working, registry, log)?;
        *board = working;
        Ok(())
    }

    /// Apply directly; `board` may be partially changed when this fails.
    fn apply_in_place(
        &self,
        board: &mut Board,
        registry: &ExtensionRegistry,
        log: &mut RunLog,
    ) -> Result<(), NoveltyError> {
        let operator = self.operator();
        let target = self.target();
        let before = board.fingerprint();
        if let Err(err) = board
            .ensure_mutable()
            .and_then(|()| self.dispatch(board, registry, log))
        {
            log.warn(format!("{operator} on `{target}` rejected: {err}"));
            return Err(err.in_operator(operator, target));
        }
        let after = board.fingerprint();
        let record = board
            .history
            .append(operator, self.category(), target, before, after);
        log.info(format!(
            "#{} {} on `{}`{}",
            record.sequence,
            record.operator,
            record.target,
            if record.was_noop() { " (no change)" } else { "" }
        ));
        Ok(())
    }

    fn dispatch(
        &self,
        board: &mut Board,
        registry: &ExtensionRegistry,
        log: &mut RunLog,
    ) -> BoardResult<()> {
        match self {
            Self::LocationAttribute { location, update } => {
                attribute::update_location(board, location, update)
            }
            Self::CardAttribute { deck, card, update } => {
                attribute::update_card(board, *deck, card, update)
            }
            Self::BoardAttribute { update } => attribute::update_board(board, update),
            Self::DieFaces { die, faces } => cardinality::die_faces(board, *die, faces),
            Self::DieCount { count, faces } => {
                cardinality::die_count(board, *count, faces, registry)
            }
            Self::DeckComposition {
                deck,
                counts,
                expected_total,
            } => cardinality::deck_composition(board, *deck, counts, *expected_total, log),
            Self::DieDistribution { die, distribution } => {
                behavior::die_distribution(board, *die, *distribution, registry)
            }
            Self::DieType { die, die_type } => behavior::die_type(board, *die, *die_type),
            Self::CardAction {
                deck,
                cards,
                handler,
            } => behavior::card_action(board, *deck, cards, handler, registry, log),
            Self::CardContingency {
                deck,
                cards,
                handler,
            } => behavior::card_contingency(board, *deck, cards, handler, registry, log),
            Self::LocationAction { location, handler } => {
                behavior::location_action(board, location, handler, registry)
            }
            Self::RentStrategy { handler } => behavior::rent_strategy(board, handler, registry),
            Self::Hook { hook, handler } => registry.rebind(&mut board.hooks, *hook, handler),
            Self::CompoundHooks { bindings, .. } => {
                behavior::compound_hooks(board, bindings, registry)
            }
            Self::GlobalReordering { sequence } => topology::global_reordering(board, sequence),
            Self::ColorReordering { color, locations } => {
                topology::color_reordering(board, locations, color)
            }
            Self::Granularity {
                location,
                new_end_position,
            } => topology::granularity(board, location, *new_end_position),
        }
    }
}

/// Apply `novelties` in order as one unit.
///
/// The batch runs on a working copy; the first failure aborts it and `board` is left
/// exactly as it was. Returns the number of novelties applied.
///
/// # Errors
///
/// Returns the [`NoveltyError`] of the first novelty that fails.
pub fn apply_batch(
    board: &mut Board,
    novelties: &[Novelty],
    registry: &ExtensionRegistry,
    log: &mut RunLog,
) -> Result<usize, NoveltyError> {
    let mut working = board.clone();
    for (index, novelty) in novelties.iter().enumerate() {
        if let Err(err) = novelty.apply_in_place(&mut working, registry, log) {
            log.error(format!(
                "batch aborted at novelty {} of {}: {err}",
                index + 1,
                novelties.len()
            ));
            return Err(err);
        }
    }
    *board = working;
    Ok(novelties.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{GO, JAIL};
    use crate::location::RentTier;
    use crate::schema::BoardSchema;

    fn classic() -> (Board, ExtensionRegistry) {
        let registry = ExtensionRegistry::with_defaults();
        let board = Board::from_schema(&BoardSchema::classic().unwrap(), &registry).unwrap();
        (board, registry)
    }

    #[test]
    fn requests_deserialize_from_tagged_json() {
        let novelty: Novelty = serde_json::from_value(serde_json::json!({
            "novelty": "location_attribute",
            "location": "Boardwalk",
            "update": {"field": "rent", "value": {"tier": "hotel", "amount": 2500}}
        }))
        .unwrap();
        assert_eq!(
            novelty,
            Novelty::LocationAttribute {
                location: "Boardwalk".to_string(),
                update: LocationUpdate::Rent {
                    tier: RentTier::Hotel,
                    amount: 2500
                },
            }
        );
        assert_eq!(novelty.category(), NoveltyCategory::Attribute);

        let novelty: Novelty = serde_json::from_value(serde_json::json!({
            "novelty": "granularity",
            "location": "Go",
            "new_end_position": 3
        }))
        .unwrap();
        assert_eq!(novelty.operator(), "granularity");
        assert_eq!(novelty.target(), GO);
    }

    #[test]
    fn applied_novelty_is_recorded_with_fingerprints() {
        let (mut board, registry) = classic();
        let mut log = RunLog::new("history");
        let before = board.fingerprint();
        Novelty::Granularity {
            location: GO.to_string(),
            new_end_position: 2,
        }
        .apply(&mut board, &registry, &mut log)
        .unwrap();
        let record = board.history().last().unwrap();
        assert_eq!(record.operator, "granularity");
        assert_eq!(record.category, NoveltyCategory::Topology);
        assert_eq!(record.before, before);
        assert_eq!(record.after, board.fingerprint());
        assert!(!record.was_noop());
        assert_eq!(board.len(), 41);
        assert_eq!(board.jail_position(), 11);
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn failed_novelty_reports_operator_and_entity() {
        let (mut board, registry) = classic();
        let mut log = RunLog::new("errors");
        let before = board.fingerprint();
        let err = Novelty::Granularity {
            location: JAIL.to_string(),
            new_end_position: 3,
        }
        .apply(&mut board, &registry, &mut log)
        .unwrap_err();
        assert_eq!(err.operator, "granularity");
        assert_eq!(err.entity, JAIL);
        assert!(err.is_validation());
        assert_eq!(board.fingerprint(), before);
        assert!(board.history().is_empty());
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn leased_board_rejects_every_family() {
        let (mut board, registry) = classic();
        let mut log = RunLog::new("lease");
        board.start_game();
        let requests = [
            Novelty::BoardAttribute {
                update: BoardUpdate::JailFine(100),
            },
            Novelty::DieFaces {
                die: 0,
                faces: vec![1, 2, 3],
            },
            Novelty::RentStrategy {
                handler: "price_percentage_rent".to_string(),
            },
            Novelty::GlobalReordering {
                sequence: board.location_names(),
            },
        ];
        for novelty in &requests {
            let err = novelty.apply(&mut board, &registry, &mut log).unwrap_err();
            assert!(err.is_validation(), "{}", novelty.operator());
        }
        board.finish_game();
        for novelty in &requests {
            novelty.apply(&mut board, &registry, &mut log).unwrap();
        }
        assert_eq!(board.history().len(), requests.len());
    }
}
