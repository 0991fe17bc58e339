//! Reorder engine configuration
//!
//! ```rust,ignore
//! use trellis_core::{NestingPolicy, ReorderConfig};
//!
//! let config = ReorderConfig::new()
//!     .with_indent_threshold(24.0)
//!     .with_nesting(NestingPolicy::Unlimited);
//! ```

use serde::{Deserialize, Serialize};

use crate::classifier::DEFAULT_INDENT_THRESHOLD;

/// How deep "drop inside" may nest a dragged node
///
/// Depth is counted from 0 at the root level. `SingleLevel` only lets root
/// rows act as containers, which is how task lists behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "depth")]
pub enum NestingPolicy {
    #[default]
    SingleLevel,
    /// A dragged node may be placed at most at this depth
    MaxDepth(usize),
    Unlimited,
}

impl NestingPolicy {
    /// Whether a node at `hovered_depth` may take the dragged node as a child
    pub fn allows_container_at(&self, hovered_depth: usize) -> bool {
        match self {
            NestingPolicy::SingleLevel => hovered_depth == 0,
            NestingPolicy::MaxDepth(max) => hovered_depth < *max,
            NestingPolicy::Unlimited => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Horizontal offset from a row's left edge that requests nesting
    pub indent_threshold: f64,
    pub nesting: NestingPolicy,
    /// Attempts per commit, including the first (one retry by default)
    pub max_commit_attempts: u32,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            indent_threshold: DEFAULT_INDENT_THRESHOLD,
            nesting: NestingPolicy::SingleLevel,
            max_commit_attempts: 2,
        }
    }
}

impl ReorderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent_threshold(mut self, threshold: f64) -> Self {
        self.indent_threshold = threshold;
        self
    }

    pub fn with_nesting(mut self, nesting: NestingPolicy) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    /// Parse host-provided settings; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let mut config: ReorderConfig = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Invalid reorder config: {}", e))?;
        config.max_commit_attempts = config.max_commit_attempts.max(1);
        Ok(config)
    }
}
