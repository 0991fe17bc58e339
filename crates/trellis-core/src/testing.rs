//! In-memory `NodeStore` for tests and demos
//!
//! Supports failure injection and an artificial write latency so commit
//! retries and out-of-order completion can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use trellis_api::TreeNode;

use crate::error::StoreResult;
use crate::traits::{NodeStore, PositionWrite};

pub struct MemoryStore<N> {
    scopes: Mutex<HashMap<String, Vec<N>>>,
    failing_writes: AtomicUsize,
    failing_lists: AtomicUsize,
    writes: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
}

impl<N: TreeNode> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> MemoryStore<N> {
    pub fn new() -> Self {
        Self {
            scopes: Mutex::new(HashMap::new()),
            failing_writes: AtomicUsize::new(0),
            failing_lists: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            write_delay: Mutex::new(None),
        }
    }

    pub fn insert(&self, scope_id: &str, node: N) {
        let mut scopes = self.scopes.lock().unwrap_or_else(|e| e.into_inner());
        let nodes = scopes.entry(scope_id.to_string()).or_default();
        nodes.retain(|n| n.id() != node.id());
        nodes.push(node);
    }

    pub fn remove(&self, scope_id: &str, node_id: &str) {
        let mut scopes = self.scopes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(nodes) = scopes.get_mut(scope_id) {
            nodes.retain(|n| n.id() != node_id);
        }
    }

    pub fn nodes(&self, scope_id: &str) -> Vec<N> {
        self.scopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(scope_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, scope_id: &str, node_id: &str) -> Option<N> {
        self.nodes(scope_id).into_iter().find(|n| n.id() == node_id)
    }

    /// Ids of the children of `parent_id`, sorted by order key
    pub fn child_order(&self, scope_id: &str, parent_id: Option<&str>) -> Vec<String> {
        let mut children: Vec<N> = self
            .nodes(scope_id)
            .into_iter()
            .filter(|n| n.parent_id() == parent_id)
            .collect();
        children.sort_by(|a, b| a.order_key().cmp(&b.order_key()).then(a.id().cmp(b.id())));
        children.into_iter().map(|n| n.id().to_string()).collect()
    }

    /// Make the next `count` write batches fail as a whole
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` list calls fail
    pub fn fail_next_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Number of successful write batches
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<N: TreeNode> NodeStore<N> for MemoryStore<N> {
    async fn list_nodes(&self, scope_id: &str) -> StoreResult<Vec<N>> {
        if Self::take_failure(&self.failing_lists) {
            return Err("injected list failure".into());
        }
        Ok(self.nodes(scope_id))
    }

    async fn write_positions(&self, scope_id: &str, writes: &[PositionWrite]) -> StoreResult<()> {
        let delay = *self.write_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if Self::take_failure(&self.failing_writes) {
            return Err("injected write failure".into());
        }

        let mut scopes = self.scopes.lock().unwrap_or_else(|e| e.into_inner());
        let nodes = scopes
            .get_mut(scope_id)
            .ok_or_else(|| format!("Scope '{}' not found", scope_id))?;

        // Applied to a copy so a bad entry leaves the scope untouched
        let mut updated = nodes.clone();
        for write in writes {
            let node = updated
                .iter_mut()
                .find(|n| n.id() == write.node_id)
                .ok_or_else(|| {
                    format!("Node '{}' not found in scope '{}'", write.node_id, scope_id)
                })?;
            *node = node.with_position(write.parent_id.as_deref(), write.order_key);
        }
        *nodes = updated;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
