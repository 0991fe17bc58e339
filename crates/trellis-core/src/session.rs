//! Drag session: the explicit, per-gesture state
//!
//! A session is created on gesture start and dropped on release. It owns the
//! dragged id, the last accepted candidate, the debounce state and the
//! preview rows; nothing in it is persisted. Hover handling is synchronous
//! and never touches the store: it returns the commit to issue, if any.

use trellis_api::{DragOrigin, Point, Rect, TreeNode};

use crate::classifier::PositionClassifier;
use crate::committer::CommitRequest;
use crate::config::ReorderConfig;
use crate::debounce::CommitDebouncer;
use crate::error::ReorderError;
use crate::preview::PreviewMutator;
use crate::resolver::{Candidate, DropTargetResolver};
use crate::snapshot::{FlatRow, TreeSnapshot};

#[derive(Debug)]
pub enum HoverOutcome {
    /// The hover resolved to nothing usable; the previous candidate stands
    Rejected(ReorderError),
    Accepted {
        candidate: Candidate,
        /// `None` when the placement equals the last one issued
        commit: Option<CommitRequest>,
    },
}

impl HoverOutcome {
    pub fn commit(&self) -> Option<&CommitRequest> {
        match self {
            HoverOutcome::Accepted { commit, .. } => commit.as_ref(),
            HoverOutcome::Rejected(_) => None,
        }
    }
}

pub struct DragSession<N> {
    scope_id: String,
    dragged_id: String,
    origin: DragOrigin,
    classifier: PositionClassifier,
    resolver: DropTargetResolver,
    debouncer: CommitDebouncer,
    preview: PreviewMutator<N>,
    accepted: Option<Candidate>,
}

impl<N: TreeNode> DragSession<N> {
    pub fn new(
        scope_id: &str,
        dragged_id: &str,
        origin: DragOrigin,
        rows: Vec<FlatRow<N>>,
        config: &ReorderConfig,
    ) -> Self {
        Self {
            scope_id: scope_id.to_string(),
            dragged_id: dragged_id.to_string(),
            origin,
            classifier: PositionClassifier::new(config.indent_threshold),
            resolver: DropTargetResolver::new(config.nesting),
            debouncer: CommitDebouncer::new(),
            preview: PreviewMutator::new(rows),
            accepted: None,
        }
    }

    pub fn dragged_id(&self) -> &str {
        &self.dragged_id
    }

    pub fn origin(&self) -> &DragOrigin {
        &self.origin
    }

    pub fn accepted(&self) -> Option<&Candidate> {
        self.accepted.as_ref()
    }

    pub fn preview_rows(&self) -> &[FlatRow<N>] {
        self.preview.rows()
    }

    /// Classify, resolve and guard one hover event
    pub fn hover(
        &mut self,
        snapshot: &TreeSnapshot<N>,
        pointer: Point,
        hovered_id: &str,
        hovered_rect: Rect,
    ) -> HoverOutcome {
        let classification = self.classifier.classify(pointer, hovered_rect);
        let candidate =
            match self
                .resolver
                .resolve(snapshot, &self.dragged_id, hovered_id, classification)
            {
                Ok(candidate) => candidate,
                Err(error) => {
                    tracing::trace!("[DragSession] Hover over '{}' rejected: {}", hovered_id, error);
                    return HoverOutcome::Rejected(error);
                }
            };

        if self.accepted.as_ref() != Some(&candidate) {
            if !self.preview.apply(&self.dragged_id, &candidate) {
                tracing::debug!(
                    "[DragSession] Preview could not place '{}' under {:?}",
                    self.dragged_id,
                    candidate.parent_id()
                );
            }
            self.accepted = Some(candidate.clone());
        }

        let commit = self
            .debouncer
            .offer(&self.scope_id, &candidate)
            .map(|key| CommitRequest {
                key,
                node_id: self.dragged_id.clone(),
                target: candidate.clone(),
            });

        HoverOutcome::Accepted { candidate, commit }
    }

    /// Replace the preview with rows from a fresh snapshot, forgetting the stale placement
    pub fn resync(&mut self, rows: Vec<FlatRow<N>>) {
        self.preview.reset(rows);
        self.accepted = None;
    }
}
