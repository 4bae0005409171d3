//! Card variants, decks, and the template maps used to regenerate them.
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::board::Board;
use crate::error::{BoardError, BoardResult};
use crate::player::{Effect, Player};
use crate::registry::{Binding, CardFn, ExtensionRegistry};
use crate::run_log::RunLog;
use crate::schema::{CardKindSpec, CardSpec, DeckSchema};

/// Upper bound on the number of cards in one deck.
pub const MAX_DECK_CARDS: usize = 1024;

/// Which of the two decks a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

impl DeckKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chance => "chance",
            Self::CommunityChest => "community_chest",
        }
    }
}

/// Variant tag of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Movement,
    MovementPayment,
    ContingentMovement,
    MovementRelative,
    CashFromBank,
    ContingentCashFromBank,
    CashFromPlayers,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "card_type", rename_all = "snake_case")]
pub enum CardKind {
    Movement {
        destination: String,
    },
    MovementPayment {
        destination: String,
        amount: i64,
    },
    ContingentMovement {
        contingency: Binding<CardFn>,
    },
    MovementRelative {
        offset: i64,
    },
    CashFromBank {
        amount: i64,
    },
    ContingentCashFromBank {
        contingency: Binding<CardFn>,
    },
    CashFromPlayers {
        amount_per_player: i64,
    },
}

/// One physical card. Several cards may share a name.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub name: String,
    pub deck: DeckKind,
    pub action: Binding<CardFn>,
    #[serde(flatten)]
    pub kind: CardKind,
}

impl Card {
    /// Materialize one card from its declarative spec, resolving handlers by name.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] when the action or contingency is not registered.
    pub fn from_spec(
        spec: &CardSpec,
        deck: DeckKind,
        registry: &ExtensionRegistry,
    ) -> BoardResult<Self> {
        let action = registry.resolve_card(&spec.action)?;
        let kind = match &spec.kind {
            CardKindSpec::Movement { destination } => CardKind::Movement {
                destination: destination.clone(),
            },
            CardKindSpec::MovementPayment {
                destination,
                amount,
            } => CardKind::MovementPayment {
                destination: destination.clone(),
                amount: *amount,
            },
            CardKindSpec::ContingentMovement { contingency } => CardKind::ContingentMovement {
                contingency: registry.resolve_card(contingency)?,
            },
            CardKindSpec::MovementRelative {
                new_relative_position,
            } => CardKind::MovementRelative {
                offset: *new_relative_position,
            },
            CardKindSpec::CashFromBank { amount } => CardKind::CashFromBank { amount: *amount },
            CardKindSpec::ContingentCashFromBank { contingency } => {
                CardKind::ContingentCashFromBank {
                    contingency: registry.resolve_card(contingency)?,
                }
            }
            CardKindSpec::CashFromPlayers { amount_per_player } => CardKind::CashFromPlayers {
                amount_per_player: *amount_per_player,
            },
        };
        Ok(Self {
            name: spec.name.clone(),
            deck,
            action,
            kind,
        })
    }

    #[must_use]
    pub const fn card_type(&self) -> CardType {
        match self.kind {
            CardKind::Movement { .. } => CardType::Movement,
            CardKind::MovementPayment { .. } => CardType::MovementPayment,
            CardKind::ContingentMovement { .. } => CardType::ContingentMovement,
            CardKind::MovementRelative { .. } => CardType::MovementRelative,
            CardKind::CashFromBank { .. } => CardType::CashFromBank,
            CardKind::ContingentCashFromBank { .. } => CardType::ContingentCashFromBank,
            CardKind::CashFromPlayers { .. } => CardType::CashFromPlayers,
        }
    }

    /// The contingency slot, for variants that have one.
    #[must_use]
    pub const fn contingency(&self) -> Option<&Binding<CardFn>> {
        match &self.kind {
            CardKind::ContingentMovement { contingency }
            | CardKind::ContingentCashFromBank { contingency } => Some(contingency),
            _ => None,
        }
    }

    fn contingency_mut(&mut self) -> Option<&mut Binding<CardFn>> {
        match &mut self.kind {
            CardKind::ContingentMovement { contingency }
            | CardKind::ContingentCashFromBank { contingency } => Some(contingency),
            _ => None,
        }
    }

    /// Run the bound action for `player`.
    #[must_use]
    pub fn invoke(&self, player: &Player, board: &Board) -> Effect {
        (self.action.handler())(player, self, board)
    }
}

/// The live multiset of cards a game draws from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn shuffle(&mut self, rng: &mut dyn RngCore) {
        self.cards.shuffle(rng);
    }

    /// Pick a card uniformly at random without removing it.
    pub fn draw(&self, rng: &mut dyn RngCore) -> Option<&Card> {
        self.cards.choose(rng)
    }

    /// Copies per card name.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(card.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// How strictly a rebuilt deck's total must match a declared count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedTotal {
    /// A mismatch rejects the rebuild.
    Strict(usize),
    /// A mismatch is logged as a warning.
    Advisory(usize),
}

/// A deck together with one canonical template per card name.
#[derive(Debug, Clone, Serialize)]
pub struct CardPile {
    kind: DeckKind,
    deck: Deck,
    #[serde(skip)]
    templates: BTreeMap<String, Card>,
}

impl CardPile {
    /// Build the pile from a declarative deck description.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Configuration`] when the declared card count disagrees with
    /// the realized deck or a card name repeats with a different shape, and
    /// [`BoardError::UnknownExtension`] for unregistered handlers.
    pub fn from_schema(
        kind: DeckKind,
        schema: &DeckSchema,
        registry: &ExtensionRegistry,
    ) -> BoardResult<Self> {
        let mut cards = Vec::new();
        let mut templates = BTreeMap::new();
        for spec in &schema.card_states {
            let card = Card::from_spec(spec, kind, registry)?;
            if templates.contains_key(&card.name) {
                return Err(BoardError::configuration(format!(
                    "{} card `{}` is declared more than once; use `num` for copies",
                    kind.as_str(),
                    card.name
                )));
            }
            deck_total(kind, [cards.len(), spec.num])?;
            cards.extend(std::iter::repeat_n(card.clone(), spec.num));
            templates.insert(card.name.clone(), card);
        }
        if let Some(declared) = schema.card_count
            && declared != cards.len()
        {
            return Err(BoardError::configuration(format!(
                "{} declares {declared} cards but lists {}",
                kind.as_str(),
                cards.len()
            )));
        }
        Ok(Self {
            kind,
            deck: Deck { cards },
            templates,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> DeckKind {
        self.kind
    }

    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    pub const fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    #[must_use]
    pub fn template(&self, name: &str) -> Option<&Card> {
        self.templates.get(name)
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Discard the deck and rebuild it from templates.
    ///
    /// `counts` must name every card currently in the deck. Names with a zero count
    /// are dropped from the deck but stay in the template map.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Configuration`] for a partial map, an unknown card name, or a
    /// total that disagrees with a strict expected count. The deck is unchanged on error.
    pub fn rebuild(
        &mut self,
        counts: &BTreeMap<String, usize>,
        expected: Option<ExpectedTotal>,
        log: &mut RunLog,
    ) -> BoardResult<()> {
        let present: BTreeSet<&str> = self.deck.cards.iter().map(|c| c.name.as_str()).collect();
        let missing: Vec<&str> = present
            .into_iter()
            .filter(|name| !counts.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(BoardError::configuration(format!(
                "{} count map is missing {}",
                self.kind.as_str(),
                missing.join(", ")
            )));
        }
        if let Some(unknown) = counts.keys().find(|name| !self.templates.contains_key(*name)) {
            return Err(BoardError::configuration(format!(
                "{} has no template for `{unknown}`",
                self.kind.as_str()
            )));
        }
        let total = deck_total(self.kind, counts.values().copied())?;
        match expected {
            Some(ExpectedTotal::Strict(want)) if want != total => {
                return Err(BoardError::configuration(format!(
                    "{} rebuild yields {total} cards, expected {want}",
                    self.kind.as_str()
                )));
            }
            Some(ExpectedTotal::Advisory(want)) if want != total => {
                log.warn(format!(
                    "{} rebuild yields {total} cards, advisory count is {want}",
                    self.kind.as_str()
                ));
            }
            _ => {}
        }

        let mut cards = Vec::with_capacity(total);
        for (name, &count) in counts {
            if let Some(template) = self.templates.get(name) {
                cards.extend(std::iter::repeat_n(template.clone(), count));
            }
        }
        self.deck = Deck { cards };
        Ok(())
    }

    /// Rebind the contingency of every named card (deck copies and template).
    /// Cards without a contingency slot are skipped. Returns the number of cards changed.
    pub fn rebind_contingency(
        &mut self,
        names: &BTreeSet<String>,
        binding: &Binding<CardFn>,
    ) -> usize {
        let mut changed = 0;
        for card in self.cards_named_mut(names) {
            if let Some(slot) = card.contingency_mut() {
                *slot = binding.clone();
                changed += 1;
            }
        }
        changed
    }

    /// Rebind the action of every named card (deck copies and template).
    pub fn rebind_action(&mut self, names: &BTreeSet<String>, binding: &Binding<CardFn>) -> usize {
        let mut changed = 0;
        for card in self.cards_named_mut(names) {
            card.action = binding.clone();
            changed += 1;
        }
        changed
    }

    /// Deck copies and the template of every card whose name is in `names`.
    pub(crate) fn cards_named_mut<'a>(
        &'a mut self,
        names: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a mut Card> + 'a {
        self.deck
            .cards
            .iter_mut()
            .chain(self.templates.values_mut())
            .filter(move |card| names.contains(&card.name))
    }
}

/// Sum card counts, rejecting decks larger than [`MAX_DECK_CARDS`].
fn deck_total(kind: DeckKind, counts: impl IntoIterator<Item = usize>) -> BoardResult<usize> {
    counts
        .into_iter()
        .try_fold(0_usize, usize::checked_add)
        .filter(|total| *total <= MAX_DECK_CARDS)
        .ok_or_else(|| {
            BoardError::configuration(format!(
                "{} would hold more than {MAX_DECK_CARDS} cards",
                kind.as_str()
            ))
        })
}
