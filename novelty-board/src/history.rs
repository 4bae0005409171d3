//! Append-only audit trail of applied novelties.
use serde::{Deserialize, Serialize};

/// Operator family a novelty belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyCategory {
    Attribute,
    Cardinality,
    BehaviorSwap,
    Topology,
}

/// One applied mutation, with board fingerprints taken around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub sequence: u64,
    pub operator: String,
    pub category: NoveltyCategory,
    pub target: String,
    pub before: u64,
    pub after: u64,
}

impl MutationRecord {
    /// True when the mutation left the board fingerprint unchanged.
    #[must_use]
    pub const fn was_noop(&self) -> bool {
        self.before == self.after
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationHistory {
    records: Vec<MutationRecord>,
}

impl MutationHistory {
    pub(crate) fn append(
        &mut self,
        operator: &str,
        category: NoveltyCategory,
        target: String,
        before: u64,
        after: u64,
    ) -> &MutationRecord {
        let sequence = self.records.len() as u64;
        self.records.push(MutationRecord {
            sequence,
            operator: operator.to_string(),
            category,
            target,
            before,
            after,
        });
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    #[must_use]
    pub fn last(&self) -> Option<&MutationRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
