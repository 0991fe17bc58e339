//! Key-based commit suppression
//!
//! Debouncing is keyed on the placement, not on time: pointer jitter that
//! keeps resolving to the same `(scope, parent, before, after)` produces one
//! commit, and any change of placement produces exactly one more.

use std::fmt;

use crate::resolver::Candidate;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitKey {
    pub scope_id: String,
    pub parent_id: Option<String>,
    pub before_id: String,
    pub after_id: String,
}

impl CommitKey {
    pub fn new(scope_id: &str, candidate: &Candidate) -> Self {
        Self {
            scope_id: scope_id.to_string(),
            parent_id: candidate.parent_id.clone(),
            before_id: candidate.before_id().unwrap_or_default().to_string(),
            after_id: candidate.after_id().unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for CommitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.scope_id,
            self.parent_id.as_deref().unwrap_or("null"),
            self.before_id,
            self.after_id
        )
    }
}

/// Remembers the last key issued during one drag session
#[derive(Debug, Default)]
pub struct CommitDebouncer {
    last_issued: Option<CommitKey>,
}

impl CommitDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key to commit, or `None` when it equals the last one issued
    pub fn offer(&mut self, scope_id: &str, candidate: &Candidate) -> Option<CommitKey> {
        let key = CommitKey::new(scope_id, candidate);
        if self.last_issued.as_ref() == Some(&key) {
            return None;
        }
        self.last_issued = Some(key.clone());
        Some(key)
    }

    pub fn last_issued(&self) -> Option<&CommitKey> {
        self.last_issued.as_ref()
    }
}
