//! Error taxonomy for drop resolution and commits
//!
//! None of these is fatal: every failure is recovered by resynchronizing
//! from the store's authoritative state.

/// Error type returned by store implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for the store seam
pub type StoreResult<T> = std::result::Result<T, BoxError>;

pub type Result<T> = std::result::Result<T, ReorderError>;

#[derive(Debug, thiserror::Error)]
pub enum ReorderError {
    /// Self-drop or a drop that would create a cycle; rejected silently
    #[error("Invalid drop target for '{node_id}': {reason}")]
    InvalidTarget { node_id: String, reason: String },

    /// A node referenced by the candidate vanished or moved since the snapshot
    #[error("Stale snapshot: node '{node_id}' is missing or no longer in place")]
    StaleSnapshot { node_id: String },

    #[error("Failed to persist move of '{node_id}': {source}")]
    Persistence {
        node_id: String,
        #[source]
        source: BoxError,
    },
}

impl ReorderError {
    pub fn invalid_target(node_id: &str, reason: impl Into<String>) -> Self {
        ReorderError::InvalidTarget {
            node_id: node_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn stale(node_id: &str) -> Self {
        ReorderError::StaleSnapshot {
            node_id: node_id.to_string(),
        }
    }

    pub fn persistence(node_id: &str, source: BoxError) -> Self {
        ReorderError::Persistence {
            node_id: node_id.to_string(),
            source,
        }
    }

    /// Stale snapshots and store failures are retried against a fresh read
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReorderError::InvalidTarget { .. })
    }
}
