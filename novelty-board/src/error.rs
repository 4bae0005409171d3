//! Error taxonomy shared by board construction and novelty operators.
use thiserror::Error;

/// Structural, configuration, and lookup failures raised by the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    /// A structural invariant would be violated (bad permutation, span mismatch, count mismatch).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Declarative input is malformed or incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A symbolic handler name is not registered under the requested kind.
    #[error("unknown {expected} extension `{name}`")]
    UnknownExtension {
        name: String,
        expected: &'static str,
    },
}

impl BoardError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Attach operator and entity context for mutation-time reporting.
    #[must_use]
    pub fn in_operator(self, operator: &'static str, entity: impl Into<String>) -> NoveltyError {
        NoveltyError {
            operator,
            entity: entity.into(),
            source: self,
        }
    }
}

/// A mutation-time failure annotated with the operator and the entity it targeted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operator} on `{entity}`: {source}")]
pub struct NoveltyError {
    pub operator: &'static str,
    pub entity: String,
    #[source]
    pub source: BoardError,
}

impl NoveltyError {
    /// True when the underlying failure is a structural validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.source, BoardError::Validation(_))
    }
}

pub type BoardResult<T> = Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_context_is_rendered() {
        let err =
            BoardError::validation("duplicate name `Go`").in_operator("global_reordering", "Go");
        assert_eq!(
            err.to_string(),
            "global_reordering on `Go`: validation failed: duplicate name `Go`"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn unknown_extension_names_kind() {
        let err = BoardError::UnknownExtension {
            name: "missing".to_string(),
            expected: "card",
        };
        assert_eq!(err.to_string(), "unknown card extension `missing`");
    }
}
