//! Drag controller: wires gesture events to sessions, preview and commits
//!
//! One controller serves one list scope. It holds the current snapshot,
//! the active session (at most one; a new start supersedes any leftover),
//! and the committer. Hover handling stays synchronous; commits are spawned
//! on the tokio runtime and never awaited by the gesture path; once a
//! commit finishes the snapshot is reloaded in the background, so the rows
//! shown after release already reflect the store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trellis_api::{DragOrigin, GestureEvent, TreeNode};

use crate::committer::{CommitEvent, CommitRequest, ReorderCommitter};
use crate::config::ReorderConfig;
use crate::error::Result;
use crate::session::{DragSession, HoverOutcome};
use crate::snapshot::{FlatRow, TreeSnapshot};
use crate::traits::ReorderOperations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    /// Dragging with at least one commit still in flight
    Committing,
}

/// Latest snapshot, shared with the reload tasks spawned after commits
///
/// Every read of the store takes a sequence number before it starts; a
/// result is installed only if nothing newer has been installed since, so a
/// slow reload never replaces a fresher view.
struct SnapshotCell<N> {
    current: RwLock<(u64, Arc<TreeSnapshot<N>>)>,
    reads: AtomicU64,
}

impl<N: TreeNode> SnapshotCell<N> {
    fn new() -> Self {
        Self {
            current: RwLock::new((0, Arc::new(TreeSnapshot::default()))),
            reads: AtomicU64::new(0),
        }
    }

    fn begin_read(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn install(&self, seq: u64, snapshot: TreeSnapshot<N>) -> bool {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if current.0 > seq {
            return false;
        }
        *current = (seq, Arc::new(snapshot));
        true
    }

    fn get(&self) -> Arc<TreeSnapshot<N>> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&current.1)
    }
}

pub struct DragController<N, S>
where
    N: TreeNode,
    S: ReorderOperations<N> + 'static,
{
    scope_id: String,
    config: ReorderConfig,
    snapshot: Arc<SnapshotCell<N>>,
    collapsed: HashSet<String>,
    session: Option<DragSession<N>>,
    committer: Arc<ReorderCommitter<N, S>>,
    pending: Vec<JoinHandle<()>>,
    events: Option<mpsc::UnboundedReceiver<CommitEvent>>,
}

impl<N, S> DragController<N, S>
where
    N: TreeNode,
    S: ReorderOperations<N> + 'static,
{
    pub fn new(scope_id: impl Into<String>, store: Arc<S>, config: ReorderConfig) -> Self {
        let (committer, events) = ReorderCommitter::new(store, config.max_commit_attempts);
        Self {
            scope_id: scope_id.into(),
            config,
            snapshot: Arc::new(SnapshotCell::new()),
            collapsed: HashSet::new(),
            session: None,
            committer: Arc::new(committer),
            pending: Vec::new(),
            events: Some(events),
        }
    }

    /// Create a controller and load the scope's current nodes
    pub async fn load(
        scope_id: impl Into<String>,
        store: Arc<S>,
        config: ReorderConfig,
    ) -> Result<Self> {
        let mut controller = Self::new(scope_id, store, config);
        controller.refresh().await?;
        Ok(controller)
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<TreeSnapshot<N>> {
        self.snapshot.get()
    }

    /// Take the commit outcome stream (once); used for error toasts and resync
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<CommitEvent>> {
        self.events.take()
    }

    pub fn phase(&self) -> DragPhase {
        match (&self.session, self.in_flight()) {
            (None, _) => DragPhase::Idle,
            (Some(_), 0) => DragPhase::Dragging,
            (Some(_), _) => DragPhase::Committing,
        }
    }

    /// Commits (and their follow-up reloads) still running
    pub fn in_flight(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Rebuild the snapshot from the store
    pub async fn refresh(&mut self) -> Result<()> {
        let seq = self.snapshot.begin_read();
        let snapshot = self.committer.store().load_snapshot(&self.scope_id).await?;
        tracing::debug!(
            "[DragController] Loaded {} nodes for scope '{}'",
            snapshot.len(),
            self.scope_id
        );
        self.snapshot.install(seq, snapshot);
        Ok(())
    }

    /// Install nodes pushed by a store change notification
    pub fn apply_nodes(&mut self, nodes: Vec<N>) {
        let seq = self.snapshot.begin_read();
        self.snapshot.install(seq, TreeSnapshot::from_nodes(nodes));
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) {
        if collapsed {
            self.collapsed.insert(id.to_string());
        } else {
            self.collapsed.remove(id);
        }
    }

    /// Rows to render: the preview while dragging, the snapshot otherwise
    pub fn preview_list(&self) -> Vec<FlatRow<N>> {
        match &self.session {
            Some(session) => session.preview_rows().to_vec(),
            None => self.snapshot.get().flatten(&self.collapsed),
        }
    }

    /// Feed one gesture event; returns the hover outcome for hover events
    pub fn handle(&mut self, event: GestureEvent) -> Option<HoverOutcome> {
        match event {
            GestureEvent::Start { dragged_id, origin } => {
                self.start(&dragged_id, origin);
                None
            }
            GestureEvent::Hover {
                pointer,
                hovered_id,
                hovered_rect,
            } => {
                let session = match self.session.as_mut() {
                    Some(session) => session,
                    None => {
                        tracing::warn!("[DragController] Hover without an active drag ignored");
                        return None;
                    }
                };
                let snapshot = self.snapshot.get();
                let outcome = session.hover(&snapshot, pointer, &hovered_id, hovered_rect);
                if let Some(request) = outcome.commit() {
                    tracing::debug!("[DragController] Issuing commit {}", request.key);
                    self.spawn_commit(request.clone());
                }
                Some(outcome)
            }
            GestureEvent::End => {
                self.end();
                None
            }
        }
    }

    pub fn start(&mut self, dragged_id: &str, origin: DragOrigin) {
        if self.session.is_some() {
            tracing::debug!("[DragController] New drag supersedes the previous session");
        }
        let rows = self.snapshot.get().flatten(&self.collapsed);
        self.session = Some(DragSession::new(
            &self.scope_id,
            dragged_id,
            origin,
            rows,
            &self.config,
        ));
    }

    /// Pointer release: drop the session; whatever was committed stands
    pub fn end(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(
                "[DragController] Drag of '{}' ended, last placement {:?}",
                session.dragged_id(),
                session.accepted()
            );
        }
    }

    /// Spawn the commit and a snapshot reload once it has finished
    fn spawn_commit(&mut self, request: CommitRequest) {
        self.pending.retain(|handle| !handle.is_finished());

        let commit = self.committer.spawn(request);
        let committer = Arc::clone(&self.committer);
        let cell = Arc::clone(&self.snapshot);
        let scope_id = self.scope_id.clone();
        self.pending.push(tokio::spawn(async move {
            if let Err(e) = commit.await {
                tracing::error!("[DragController] Commit task panicked: {}", e);
                return;
            }
            let seq = cell.begin_read();
            match committer.store().load_snapshot(&scope_id).await {
                Ok(snapshot) => {
                    cell.install(seq, snapshot);
                }
                Err(e) => tracing::warn!("[DragController] Reload after commit failed: {}", e),
            }
        }));
    }

    /// Wait for in-flight commits, then reload the snapshot
    pub async fn settle(&mut self) -> Result<()> {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("[DragController] Commit task panicked: {}", e);
            }
        }
        self.refresh().await
    }

    /// Reload from the store and discard any preview built on stale state
    pub async fn resync(&mut self) -> Result<()> {
        self.refresh().await?;
        let rows = self.snapshot.get().flatten(&self.collapsed);
        if let Some(session) = self.session.as_mut() {
            session.resync(rows);
        }
        Ok(())
    }
}
