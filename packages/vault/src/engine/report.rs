//! Outcome reports for multi-record operations

use super::id::EngineId;
use serde::Serialize;

/// Result of deleting one storage key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteStatus {
    /// Key removed, or it was never there
    Deleted,
    /// Store refused the delete
    Failed {
        /// Store error message
        error: String,
    },
}

/// Per-key delete outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Storage key
    pub key: String,
    /// What happened
    #[serde(flatten)]
    pub status: DeleteStatus,
}

/// Aggregate result of deleting an engine's three records
///
/// Deletes are attempted independently; a failure on one key does not stop
/// the others and nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Engine the report is for
    pub engine_id: EngineId,
    /// Outcomes in the order attempted
    pub outcomes: Vec<DeleteOutcome>,
}

impl DeleteReport {
    pub(crate) fn new(engine_id: EngineId) -> Self {
        Self {
            engine_id,
            outcomes: Vec::with_capacity(3),
        }
    }

    pub(crate) fn record(&mut self, key: String, status: DeleteStatus) {
        self.outcomes.push(DeleteOutcome { key, status });
    }

    /// Whether every key was deleted
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == DeleteStatus::Deleted)
    }

    /// Outcomes that failed
    pub fn failures(&self) -> impl Iterator<Item = &DeleteOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeleteStatus::Failed { .. }))
    }
}

/// Which records of an engine are present and whether they agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineHealth {
    /// No records at all
    Absent,
    /// Config and a matching key pair
    Consistent,
    /// Some records missing
    Partial {
        /// Config record present
        config: bool,
        /// Private key envelope present
        private_key: bool,
        /// Public key envelope present
        public_key: bool,
    },
    /// All three present but the keys do not form a pair or fail to decode
    Mismatched,
}

impl EngineHealth {
    /// Health computed from record presence alone
    pub fn from_presence(config: bool, private_key: bool, public_key: bool) -> Self {
        match (config, private_key, public_key) {
            (false, false, false) => Self::Absent,
            (true, true, true) => Self::Consistent,
            _ => Self::Partial {
                config,
                private_key,
                public_key,
            },
        }
    }

    /// Absent or consistent
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Absent | Self::Consistent)
    }
}
