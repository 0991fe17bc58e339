//! Drop target resolution
//!
//! Maps a classified hover over a row to a tree edit: the new parent of the
//! dragged node and where among that parent's children it lands. Sibling
//! lists are always computed without the dragged node, so hovering a row
//! adjacent to the dragged node's current slot still yields a valid bound.

use trellis_api::TreeNode;

use crate::classifier::{Classification, Zone};
use crate::config::NestingPolicy;
use crate::cycle_guard::CycleGuard;
use crate::error::{ReorderError, Result};
use crate::snapshot::TreeSnapshot;

/// Where among the target parent's children the dragged node is inserted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// Ahead of every sibling; `first` is the sibling that was first when resolved
    Start { first: Option<String> },
    /// Behind every sibling; `last` is the sibling that was last when resolved
    End { last: Option<String> },
    /// Directly between two adjacent siblings
    Between { after: String, before: String },
}

impl Boundary {
    /// The sibling that will follow the inserted node
    pub fn before_id(&self) -> Option<&str> {
        match self {
            Boundary::Start { first } => first.as_deref(),
            Boundary::End { .. } => None,
            Boundary::Between { before, .. } => Some(before),
        }
    }

    /// The sibling that will precede the inserted node
    pub fn after_id(&self) -> Option<&str> {
        match self {
            Boundary::Start { .. } => None,
            Boundary::End { last } => last.as_deref(),
            Boundary::Between { after, .. } => Some(after),
        }
    }
}

/// Proposed placement awaiting debounce and commit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub parent_id: Option<String>,
    pub boundary: Boundary,
}

impl Candidate {
    pub fn new(parent_id: Option<&str>, boundary: Boundary) -> Self {
        Self {
            parent_id: parent_id.map(|p| p.to_string()),
            boundary,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn before_id(&self) -> Option<&str> {
        self.boundary.before_id()
    }

    pub fn after_id(&self) -> Option<&str> {
        self.boundary.after_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DropTargetResolver {
    nesting: NestingPolicy,
}

impl DropTargetResolver {
    pub fn new(nesting: NestingPolicy) -> Self {
        Self { nesting }
    }

    pub fn nesting(&self) -> NestingPolicy {
        self.nesting
    }

    pub fn resolve<N: TreeNode>(
        &self,
        snapshot: &TreeSnapshot<N>,
        dragged_id: &str,
        hovered_id: &str,
        classification: Classification,
    ) -> Result<Candidate> {
        if hovered_id == dragged_id {
            return Err(ReorderError::invalid_target(
                dragged_id,
                "cannot drop a node onto itself",
            ));
        }
        if !snapshot.contains(dragged_id) {
            return Err(ReorderError::stale(dragged_id));
        }
        let hovered_depth = snapshot
            .depth_of(hovered_id)
            .ok_or_else(|| ReorderError::stale(hovered_id))?;

        let candidate = if classification.indent_requested
            && self.nesting.allows_container_at(hovered_depth)
        {
            Self::into_container(snapshot, dragged_id, hovered_id, classification.zone)
        } else {
            Self::beside(snapshot, dragged_id, hovered_id, classification.zone)
        };

        if !CycleGuard::permits(snapshot, dragged_id, candidate.parent_id()) {
            return Err(ReorderError::invalid_target(
                dragged_id,
                format!(
                    "'{}' is the node itself or one of its descendants",
                    candidate.parent_id().unwrap_or_default()
                ),
            ));
        }

        Ok(candidate)
    }

    /// The hovered row becomes the parent; the zone picks the top or bottom of its children
    fn into_container<N: TreeNode>(
        snapshot: &TreeSnapshot<N>,
        dragged_id: &str,
        hovered_id: &str,
        zone: Zone,
    ) -> Candidate {
        let children = snapshot.children_excluding(Some(hovered_id), dragged_id);
        let boundary = match zone {
            Zone::Before => Boundary::Start {
                first: children.first().map(|id| id.to_string()),
            },
            Zone::After => Boundary::End {
                last: children.last().map(|id| id.to_string()),
            },
        };
        Candidate::new(Some(hovered_id), boundary)
    }

    /// The dragged node becomes a sibling of the hovered row
    fn beside<N: TreeNode>(
        snapshot: &TreeSnapshot<N>,
        dragged_id: &str,
        hovered_id: &str,
        zone: Zone,
    ) -> Candidate {
        let parent = snapshot.parent_of(hovered_id);
        let siblings = snapshot.children_excluding(parent, dragged_id);
        let index = siblings
            .iter()
            .position(|id| *id == hovered_id)
            .unwrap_or_default();

        let boundary = match zone {
            Zone::Before => match index.checked_sub(1).and_then(|i| siblings.get(i)) {
                Some(prev) => Boundary::Between {
                    after: prev.to_string(),
                    before: hovered_id.to_string(),
                },
                None => Boundary::Start {
                    first: Some(hovered_id.to_string()),
                },
            },
            Zone::After => match siblings.get(index + 1) {
                Some(next) => Boundary::Between {
                    after: hovered_id.to_string(),
                    before: next.to_string(),
                },
                None => Boundary::End {
                    last: Some(hovered_id.to_string()),
                },
            },
        };
        Candidate::new(parent, boundary)
    }
}
