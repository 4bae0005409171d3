//! Novelty Board Engine
//!
//! Builds a Monopoly-style board from a declarative description and mutates it
//! between games with named novelty operators: attribute edits, cardinality
//! changes, behavior swaps through a handler registry, and topology changes that
//! resize or reorder the board while keeping every derived index consistent.
//! The game loop itself lives elsewhere; it reads the board and applies the
//! [`Effect`]s that handlers return.

pub mod board;
pub mod card;
pub mod dice;
pub mod error;
pub mod handlers;
pub mod history;
pub mod location;
pub mod novelty;
pub mod numbers;
pub mod player;
pub mod registry;
pub mod run_log;
pub mod schema;
pub mod topology;

// Re-export commonly used types
pub use board::{Board, BoardPhase, BoardSnapshot, GO, IndexSet, JAIL, MAX_CELLS, TopologyNovelty};
pub use card::{Card, CardKind, CardPile, CardType, Deck, DeckKind, ExpectedTotal, MAX_DECK_CARDS};
pub use dice::{DiceStreams, Die, DieDistribution, DieType, biased_weights};
pub use error::{BoardError, BoardResult, NoveltyError};
pub use history::{MutationHistory, MutationRecord, NoveltyCategory};
pub use location::{
    LocClass, Location, LocationId, LocationKind, Railroad, RealEstate, RentTier, RentTiers,
    Utility,
};
pub use novelty::{
    BoardUpdate, CardUpdate, HookRequest, LocationUpdate, Novelty, apply_batch, jail_overhaul,
};
pub use player::{Effect, Player};
pub use registry::{
    Binding, CardFn, DieRollFn, ExtensionRegistry, Handler, HandlerKind, HookBindings, HookFn,
    HookId, LocationFn, Phase, RentFn,
};
pub use run_log::{LogEntry, LogLevel, RunLog};
pub use schema::{BoardKnobs, BoardSchema};

/// Trait for abstracting where board descriptions come from
/// Platform-specific implementations should provide this
pub trait BoardLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a declarative board description by name
    ///
    /// # Errors
    ///
    /// Returns an error if the description cannot be found or parsed.
    fn load_board_schema(&self, name: &str) -> Result<BoardSchema, Self::Error>;
}

/// Builds boards from a loader and applies novelty batches to them
pub struct NoveltyEngine<L>
where
    L: BoardLoader,
{
    loader: L,
    registry: ExtensionRegistry,
}

impl<L> NoveltyEngine<L>
where
    L: BoardLoader,
{
    /// Create an engine backed by the built-in handler table
    pub fn new(loader: L) -> Self {
        Self::with_registry(loader, ExtensionRegistry::with_defaults())
    }

    pub const fn with_registry(loader: L, registry: ExtensionRegistry) -> Self {
        Self { loader, registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Register additional handlers before building boards.
    pub const fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }

    /// Load and construct the named board
    ///
    /// # Errors
    ///
    /// Returns an error if the description cannot be loaded or the board fails to build.
    pub fn instantiate(&self, name: &str) -> anyhow::Result<Board>
    where
        L::Error: Into<anyhow::Error>,
    {
        let schema = self.loader.load_board_schema(name).map_err(Into::into)?;
        let board = Board::from_schema(&schema, &self.registry)
            .map_err(|err| anyhow::Error::new(err).context(format!("building board `{name}`")))?;
        Ok(board)
    }

    /// Construct the named board and apply `novelties` as one batch
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be built or any novelty fails.
    pub fn prepare(
        &self,
        name: &str,
        novelties: &[Novelty],
        log: &mut RunLog,
    ) -> anyhow::Result<Board>
    where
        L::Error: Into<anyhow::Error>,
    {
        let mut board = self.instantiate(name)?;
        let applied = apply_batch(&mut board, novelties, &self.registry, log).map_err(|err| {
            anyhow::Error::new(err).context(format!("preparing board `{name}`"))
        })?;
        log.info(format!("board `{name}` ready after {applied} novelties"));
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, thiserror::Error)]
    enum FixtureError {
        #[error("no board named `{0}`")]
        Missing(String),
        #[error(transparent)]
        Parse(#[from] serde_json::Error),
    }

    #[derive(Default)]
    struct FixtureLoader {
        boards: HashMap<String, String>,
    }

    impl FixtureLoader {
        fn with_classic() -> Self {
            let mut boards = HashMap::new();
            boards.insert(
                "classic".to_string(),
                serde_json::to_string(&BoardSchema::classic().unwrap()).unwrap(),
            );
            boards.insert("broken".to_string(), "{\"locations\": 3}".to_string());
            Self { boards }
        }
    }

    impl BoardLoader for FixtureLoader {
        type Error = FixtureError;

        fn load_board_schema(&self, name: &str) -> Result<BoardSchema, Self::Error> {
            let json = self
                .boards
                .get(name)
                .ok_or_else(|| FixtureError::Missing(name.to_string()))?;
            Ok(BoardSchema::from_json(json)?)
        }
    }

    #[test]
    fn engine_instantiates_and_prepares_boards() {
        let engine = NoveltyEngine::new(FixtureLoader::with_classic());
        let board = engine.instantiate("classic").unwrap();
        assert_eq!(board.len(), 40);

        let mut log = RunLog::new("engine");
        let board = engine
            .prepare(
                "classic",
                &[
                    Novelty::Granularity {
                        location: GO.to_string(),
                        new_end_position: 3,
                    },
                    Novelty::RentStrategy {
                        handler: "price_percentage_rent".to_string(),
                    },
                ],
                &mut log,
            )
            .unwrap();
        assert_eq!(board.len(), 42);
        assert_eq!(board.rent_strategy(), "price_percentage_rent");
        assert_eq!(board.history().len(), 2);
        assert!(
            log.entries()
                .last()
                .is_some_and(|entry| entry.message.contains("ready after 2"))
        );
    }

    #[test]
    fn engine_reports_loader_and_batch_failures() {
        let engine = NoveltyEngine::new(FixtureLoader::with_classic());
        assert!(engine.instantiate("missing").is_err());
        assert!(engine.instantiate("broken").is_err());

        let mut log = RunLog::new("engine");
        let err = engine
            .prepare(
                "classic",
                &[Novelty::Hook {
                    hook: HookId::Trade,
                    handler: "haggle".to_string(),
                }],
                &mut log,
            )
            .unwrap_err();
        let source = err.downcast_ref::<NoveltyError>().unwrap();
        assert_eq!(source.operator, "hook");
    }

    #[test]
    fn custom_handlers_can_be_registered() {
        fn free_trade(_player: &Player, _board: &Board) -> Effect {
            Effect::ReceiveFromBank(10)
        }

        let mut engine = NoveltyEngine::new(FixtureLoader::with_classic());
        engine
            .registry_mut()
            .register("free_trade", Handler::Hook(free_trade));
        let mut log = RunLog::new("custom");
        let board = engine
            .prepare(
                "classic",
                &[Novelty::Hook {
                    hook: HookId::Trade,
                    handler: "free_trade".to_string(),
                }],
                &mut log,
            )
            .unwrap();
        let player = Player::new("p", 1500);
        assert_eq!(
            board.invoke_hook(HookId::Trade, &player),
            Effect::ReceiveFromBank(10)
        );
    }
}
