//! Transient reordering of the rendered rows during a drag
//!
//! The preview is a session-local copy of the flattened list. It is never
//! written back to the store; when the gesture ends it is dropped and the
//! view falls back to the store's snapshot.

use trellis_api::TreeNode;

use crate::resolver::{Boundary, Candidate};
use crate::snapshot::FlatRow;

#[derive(Debug, Clone)]
pub struct PreviewMutator<N> {
    rows: Vec<FlatRow<N>>,
}

impl<N: TreeNode> PreviewMutator<N> {
    pub fn new(rows: Vec<FlatRow<N>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FlatRow<N>] {
        &self.rows
    }

    pub fn reset(&mut self, rows: Vec<FlatRow<N>>) {
        self.rows = rows;
    }

    /// Move the dragged row (with its visible descendants) to the slot the candidate names
    ///
    /// Returns `false` and leaves the preview untouched when the dragged row
    /// or the rows anchoring the target are not visible.
    pub fn apply(&mut self, dragged_id: &str, candidate: &Candidate) -> bool {
        let Some(start) = self.index_of(&self.rows, dragged_id) else {
            return false;
        };
        let end = subtree_end(&self.rows, start);

        let mut remaining = self.rows.clone();
        let mut block: Vec<FlatRow<N>> = remaining.drain(start..end).collect();

        let new_depth = match candidate.parent_id() {
            None => 0,
            Some(parent) => match self.index_of(&remaining, parent) {
                Some(i) => remaining[i].depth + 1,
                None => return false,
            },
        };
        let Some(insert_at) = self.insert_index(&remaining, candidate) else {
            return false;
        };

        let old_depth = block[0].depth;
        for row in &mut block {
            row.depth = row.depth + new_depth - old_depth;
        }
        let tail = remaining.split_off(insert_at);
        remaining.extend(block);
        remaining.extend(tail);
        self.rows = remaining;
        true
    }

    fn index_of(&self, rows: &[FlatRow<N>], id: &str) -> Option<usize> {
        rows.iter().position(|r| r.node.id() == id)
    }

    fn insert_index(&self, rows: &[FlatRow<N>], candidate: &Candidate) -> Option<usize> {
        let parent_index = match candidate.parent_id() {
            Some(parent) => Some(self.index_of(rows, parent)?),
            None => None,
        };
        let at_start = || parent_index.map_or(0, |i| i + 1);
        let at_end = || parent_index.map_or(rows.len(), |i| subtree_end(rows, i));

        let index = match &candidate.boundary {
            Boundary::Start { first } => first
                .as_deref()
                .and_then(|id| self.index_of(rows, id))
                .unwrap_or_else(at_start),
            Boundary::End { last } => last
                .as_deref()
                .and_then(|id| self.index_of(rows, id))
                .map(|i| subtree_end(rows, i))
                .unwrap_or_else(at_end),
            Boundary::Between { after, before } => match self.index_of(rows, before) {
                Some(i) => i,
                None => self
                    .index_of(rows, after)
                    .map(|i| subtree_end(rows, i))?,
            },
        };
        Some(index)
    }
}

/// One past the last row of the subtree rooted at `index`
fn subtree_end<N>(rows: &[FlatRow<N>], index: usize) -> usize {
    let depth = rows[index].depth;
    rows[index + 1..]
        .iter()
        .position(|r| r.depth <= depth)
        .map_or(rows.len(), |offset| index + 1 + offset)
}
