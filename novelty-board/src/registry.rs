//! Rule extension registry.
//!
//! Behavior is bound by symbolic name. The registry maps each name to a typed
//! function pointer ([`Handler`]); entities and the board keep a [`Binding`]
//! that carries both the name (for audit and serialization) and the resolved
//! pointer (for invocation). Looking up a name that is missing, or that was
//! registered under a different handler kind, is an
//! [`BoardError::UnknownExtension`].
use rand::RngCore;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::board::Board;
use crate::card::Card;
use crate::error::{BoardError, BoardResult};
use crate::location::Location;
use crate::player::{Effect, Player};

/// Card action or card contingency.
pub type CardFn = fn(&Player, &Card, &Board) -> Effect;
/// Action performed when a player lands on an action location.
pub type LocationFn = fn(&Player, &Location, &Board) -> Effect;
/// Board-level hook invoked at a fixed point of the turn.
pub type HookFn = fn(&Player, &Board) -> Effect;
/// Computed rent for a location given the current dice total.
pub type RentFn = fn(&Location, &Board, u32) -> i64;
/// Picks one face from the effective face set.
pub type DieRollFn = fn(&[u32], &mut dyn RngCore) -> u32;

/// A registered handler, tagged by calling convention.
#[derive(Clone, Copy)]
pub enum Handler {
    Card(CardFn),
    Location(LocationFn),
    Hook(HookFn),
    Rent(RentFn),
    DieRoll(DieRollFn),
}

impl Handler {
    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        match self {
            Self::Card(_) => HandlerKind::Card,
            Self::Location(_) => HandlerKind::Location,
            Self::Hook(_) => HandlerKind::Hook,
            Self::Rent(_) => HandlerKind::Rent,
            Self::DieRoll(_) => HandlerKind::DieRoll,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{}", self.kind().as_str())
    }
}

/// Calling-convention category of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Card,
    Location,
    Hook,
    Rent,
    DieRoll,
}

impl HandlerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Location => "location",
            Self::Hook => "hook",
            Self::Rent => "rent",
            Self::DieRoll => "die_roll",
        }
    }
}

/// A resolved handler together with the name it was resolved from.
#[derive(Clone)]
pub struct Binding<F> {
    name: String,
    handler: F,
}

impl<F: Copy> Binding<F> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn handler(&self) -> F {
        self.handler
    }
}

impl<F> fmt::Debug for Binding<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.name).finish()
    }
}

impl<F> Serialize for Binding<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Game phases that expose an arbitrary-action slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreRoll,
    PostRoll,
    OutOfTurn,
}

/// Board-level rebind targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookId {
    PostRollMovement,
    TaxPayment,
    Auction,
    Trade,
    PassGo,
    JailEntry,
    JailFine,
    NegativeCash,
    PreRollAction,
    PostRollAction,
    OutOfTurnAction,
}

impl HookId {
    pub const ALL: [Self; 11] = [
        Self::PostRollMovement,
        Self::TaxPayment,
        Self::Auction,
        Self::Trade,
        Self::PassGo,
        Self::JailEntry,
        Self::JailFine,
        Self::NegativeCash,
        Self::PreRollAction,
        Self::PostRollAction,
        Self::OutOfTurnAction,
    ];

    /// The arbitrary-action slot for a phase.
    #[must_use]
    pub const fn phase_action(phase: Phase) -> Self {
        match phase {
            Phase::PreRoll => Self::PreRollAction,
            Phase::PostRoll => Self::PostRollAction,
            Phase::OutOfTurn => Self::OutOfTurnAction,
        }
    }

    /// Name of the handler installed when a board is first built.
    #[must_use]
    pub const fn default_handler(self) -> &'static str {
        match self {
            Self::PostRollMovement => "default_post_roll_movement",
            Self::TaxPayment => "default_tax_payment",
            Self::Auction => "default_auction",
            Self::Trade => "default_trade",
            Self::PassGo => "default_pass_go",
            Self::JailEntry => "default_jail_entry",
            Self::JailFine => "default_jail_fine",
            Self::NegativeCash => "default_negative_cash",
            Self::PreRollAction | Self::PostRollAction | Self::OutOfTurnAction => {
                "default_phase_action"
            }
        }
    }
}

/// Hook binding sites owned by one board.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HookBindings {
    bindings: BTreeMap<HookId, Binding<HookFn>>,
}

impl HookBindings {
    #[must_use]
    pub fn get(&self, hook: HookId) -> Option<&Binding<HookFn>> {
        self.bindings.get(&hook)
    }

    /// Install a binding, returning the one it replaced.
    pub fn install(&mut self, hook: HookId, binding: Binding<HookFn>) -> Option<Binding<HookFn>> {
        self.bindings.insert(hook, binding)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HookId, &Binding<HookFn>)> {
        self.bindings.iter().map(|(hook, binding)| (*hook, binding))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Named, swappable behavior bindings.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    handlers: HashMap<String, Handler>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ExtensionRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl ExtensionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from the fixed startup table in [`crate::handlers`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::handlers::register_defaults(&mut registry);
        registry
    }

    /// Register `handler` under `name`, returning any handler it replaced.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) -> Option<Handler> {
        self.handlers.insert(name.into(), handler)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Resolve a name of any kind.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] when the name is not registered.
    pub fn resolve(&self, name: &str) -> BoardResult<Handler> {
        self.handlers
            .get(name)
            .copied()
            .ok_or_else(|| BoardError::UnknownExtension {
                name: name.to_string(),
                expected: "any",
            })
    }

    fn resolve_as<F>(
        &self,
        name: &str,
        kind: HandlerKind,
        pick: fn(Handler) -> Option<F>,
    ) -> BoardResult<Binding<F>> {
        self.handlers
            .get(name)
            .copied()
            .and_then(pick)
            .map(|handler| Binding {
                name: name.to_string(),
                handler,
            })
            .ok_or_else(|| BoardError::UnknownExtension {
                name: name.to_string(),
                expected: kind.as_str(),
            })
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a card handler.
    pub fn resolve_card(&self, name: &str) -> BoardResult<Binding<CardFn>> {
        self.resolve_as(name, HandlerKind::Card, |handler| match handler {
            Handler::Card(f) => Some(f),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a location handler.
    pub fn resolve_location(&self, name: &str) -> BoardResult<Binding<LocationFn>> {
        self.resolve_as(name, HandlerKind::Location, |handler| match handler {
            Handler::Location(f) => Some(f),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a hook handler.
    pub fn resolve_hook(&self, name: &str) -> BoardResult<Binding<HookFn>> {
        self.resolve_as(name, HandlerKind::Hook, |handler| match handler {
            Handler::Hook(f) => Some(f),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a rent strategy.
    pub fn resolve_rent(&self, name: &str) -> BoardResult<Binding<RentFn>> {
        self.resolve_as(name, HandlerKind::Rent, |handler| match handler {
            Handler::Rent(f) => Some(f),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a die roll strategy.
    pub fn resolve_die_roll(&self, name: &str) -> BoardResult<Binding<DieRollFn>> {
        self.resolve_as(name, HandlerKind::DieRoll, |handler| match handler {
            Handler::DieRoll(f) => Some(f),
            _ => None,
        })
    }

    /// Look up `name` and store it at the `hook` binding site.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] unless `name` is a hook handler;
    /// the binding site is left untouched in that case.
    pub fn rebind(&self, sites: &mut HookBindings, hook: HookId, name: &str) -> BoardResult<()> {
        let binding = self.resolve_hook(name)?;
        sites.install(hook, binding);
        Ok(())
    }

    /// Registered names of one kind, sorted.
    #[must_use]
    pub fn names(&self, kind: HandlerKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .iter()
            .filter(|(_, handler)| handler.kind() == kind)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
