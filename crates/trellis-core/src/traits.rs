//! Store seam
//!
//! `NodeStore` is what an external persistent store provides: a scoped list
//! of nodes and an atomic batch of position writes. `ReorderOperations`
//! layers the move-and-reorder operation on top of it as a default
//! implementation, so every store gets the same key generation, renumbering
//! and validation.

use async_trait::async_trait;
use trellis_api::{OrderKey, TreeNode};

use crate::cycle_guard::CycleGuard;
use crate::error::{ReorderError, Result, StoreResult};
use crate::resolver::{Boundary, Candidate};
use crate::snapshot::TreeSnapshot;

/// New `parent_id` and `order_key` for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionWrite {
    pub node_id: String,
    pub parent_id: Option<String>,
    pub order_key: OrderKey,
}

impl PositionWrite {
    pub fn new(node_id: &str, parent_id: Option<&str>, order_key: OrderKey) -> Self {
        Self {
            node_id: node_id.to_string(),
            parent_id: parent_id.map(|p| p.to_string()),
            order_key,
        }
    }
}

/// Persistent node storage (fire-and-forget from the UI's point of view)
#[async_trait]
pub trait NodeStore<N>: Send + Sync
where
    N: TreeNode,
{
    /// All nodes of one list scope (e.g. one task group)
    async fn list_nodes(&self, scope_id: &str) -> StoreResult<Vec<N>>;

    /// Apply all writes or none of them
    async fn write_positions(&self, scope_id: &str, writes: &[PositionWrite]) -> StoreResult<()>;

    async fn write_position(
        &self,
        scope_id: &str,
        node_id: &str,
        parent_id: Option<&str>,
        order_key: OrderKey,
    ) -> StoreResult<()> {
        self.write_positions(scope_id, &[PositionWrite::new(node_id, parent_id, order_key)])
            .await
    }
}

/// Reparent/reorder built on the store primitives
#[async_trait]
pub trait ReorderOperations<N>: NodeStore<N>
where
    N: TreeNode,
{
    /// Move `node_id` under `target.parent_id` at `target.boundary`
    ///
    /// Everything is recomputed from the store's current state, so a commit
    /// issued earlier in a drag but finishing later still lands on a valid,
    /// collision-free key. When the neighbours leave no room, the siblings
    /// are renumbered in the same batch as the move. Returns the key that
    /// was written for `node_id`.
    async fn move_and_reorder(
        &self,
        scope_id: &str,
        node_id: &str,
        target: &Candidate,
    ) -> Result<OrderKey> {
        let snapshot = self.load_snapshot(scope_id).await?;
        validate_target(&snapshot, node_id, target)?;

        let siblings = snapshot.children_excluding(target.parent_id(), node_id);
        let slot = insertion_slot(&siblings, target)?;
        let key_at = |index: usize| {
            siblings
                .get(index)
                .and_then(|id| snapshot.get(id))
                .map(|n| n.order_key())
        };
        let lower = slot.checked_sub(1).and_then(key_at);
        let upper = key_at(slot);

        let (order_key, writes) = match OrderKey::between(lower, upper) {
            Some(key) => (key, vec![PositionWrite::new(node_id, target.parent_id(), key)]),
            None => {
                tracing::debug!(
                    "[ReorderOperations] No key between {:?} and {:?}, renumbering children of {:?}",
                    lower,
                    upper,
                    target.parent_id()
                );
                renumbered(&siblings, node_id, target.parent_id(), slot)
            }
        };

        self.write_positions(scope_id, &writes)
            .await
            .map_err(|e| ReorderError::persistence(node_id, e))?;

        tracing::debug!(
            "[ReorderOperations] Moved '{}' under {:?} with key {} ({} writes)",
            node_id,
            target.parent_id(),
            order_key,
            writes.len()
        );
        Ok(order_key)
    }

    async fn load_snapshot(&self, scope_id: &str) -> Result<TreeSnapshot<N>> {
        let nodes = self
            .list_nodes(scope_id)
            .await
            .map_err(|e| ReorderError::persistence(scope_id, e))?;
        Ok(TreeSnapshot::from_nodes(nodes))
    }
}

impl<N, S> ReorderOperations<N> for S
where
    N: TreeNode,
    S: NodeStore<N>,
{
}

fn validate_target<N: TreeNode>(
    snapshot: &TreeSnapshot<N>,
    node_id: &str,
    target: &Candidate,
) -> Result<()> {
    if !snapshot.contains(node_id) {
        return Err(ReorderError::stale(node_id));
    }
    if let Some(parent) = target.parent_id() {
        if parent == node_id {
            return Err(ReorderError::invalid_target(node_id, "node cannot parent itself"));
        }
        if !snapshot.contains(parent) {
            return Err(ReorderError::stale(parent));
        }
    }
    if !CycleGuard::permits(snapshot, node_id, target.parent_id()) {
        return Err(ReorderError::invalid_target(
            node_id,
            "target parent is a descendant of the node",
        ));
    }
    Ok(())
}

/// Index in `siblings` (which exclude the moved node) the node is inserted at
fn insertion_slot(siblings: &[&str], target: &Candidate) -> Result<usize> {
    let position = |id: &str| {
        siblings
            .iter()
            .position(|s| *s == id)
            .ok_or_else(|| ReorderError::stale(id))
    };

    let slot = match &target.boundary {
        Boundary::Start { first: Some(id) } => position(id.as_str())?,
        Boundary::Start { first: None } => 0,
        Boundary::End { last: Some(id) } => position(id.as_str())? + 1,
        Boundary::End { last: None } => siblings.len(),
        Boundary::Between { after, before } => {
            let lower = position(after.as_str())?;
            if position(before.as_str())? <= lower {
                return Err(ReorderError::stale(before));
            }
            lower + 1
        }
    };
    Ok(slot)
}

/// Evenly spaced keys for all children of the target parent, the moved node at `slot`
fn renumbered(
    siblings: &[&str],
    node_id: &str,
    parent_id: Option<&str>,
    slot: usize,
) -> (OrderKey, Vec<PositionWrite>) {
    let mut ordered: Vec<&str> = siblings.to_vec();
    ordered.insert(slot, node_id);

    let writes: Vec<PositionWrite> = ordered
        .iter()
        .zip(OrderKey::evenly_spaced(ordered.len()))
        .map(|(id, key)| PositionWrite::new(id, parent_id, key))
        .collect();
    (writes[slot].order_key, writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use trellis_api::Node;

    const SCOPE: &str = "list";

    fn store(nodes: Vec<Node<()>>) -> MemoryStore<Node<()>> {
        let store = MemoryStore::new();
        for node in nodes {
            store.insert(SCOPE, node);
        }
        store
    }

    fn abc() -> MemoryStore<Node<()>> {
        store(vec![
            Node::new("A", None, 1024, ()),
            Node::new("B", None, 2048, ()),
            Node::new("C", None, 3072, ()),
        ])
    }

    fn start(first: &str) -> Boundary {
        Boundary::Start {
            first: Some(first.into()),
        }
    }

    #[tokio::test]
    async fn move_to_start() {
        let store = abc();
        store
            .move_and_reorder(SCOPE, "C", &Candidate::new(None, start("A")))
            .await
            .unwrap();
        assert_eq!(store.child_order(SCOPE, None), ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn move_between_siblings() {
        let store = abc();
        let target = Candidate::new(
            None,
            Boundary::Between {
                after: "B".into(),
                before: "C".into(),
            },
        );
        let key = store.move_and_reorder(SCOPE, "A", &target).await.unwrap();
        assert_eq!(key, OrderKey::new(2560));
        assert_eq!(store.child_order(SCOPE, None), ["B", "A", "C"]);
    }

    #[tokio::test]
    async fn move_into_empty_container() {
        let store = abc();
        let target = Candidate::new(Some("A"), Boundary::End { last: None });
        store.move_and_reorder(SCOPE, "B", &target).await.unwrap();
        assert_eq!(store.child_order(SCOPE, Some("A")), ["B"]);
        assert_eq!(store.child_order(SCOPE, None), ["A", "C"]);
    }

    #[tokio::test]
    async fn end_anchor_respects_sibling_added_after_resolution() {
        let store = abc();
        store.insert(SCOPE, Node::new("D", None, 3072 + 1, ()));
        let target = Candidate::new(None, Boundary::End { last: Some("C".into()) });
        store.move_and_reorder(SCOPE, "A", &target).await.unwrap();
        assert_eq!(store.child_order(SCOPE, None), ["B", "C", "A", "D"]);
    }

    #[tokio::test]
    async fn exhausted_gap_triggers_renumbering() {
        let mut nodes: Vec<Node<()>> = (1..=10)
            .map(|i| Node::new(format!("n{}", i), None, i as i64, ()))
            .collect();
        nodes.push(Node::new("x", Some("n1"), 1, ()));
        let store = store(nodes);

        let target = Candidate::new(
            None,
            Boundary::Between {
                after: "n3".into(),
                before: "n4".into(),
            },
        );
        store.move_and_reorder(SCOPE, "x", &target).await.unwrap();

        let order = store.child_order(SCOPE, None);
        assert_eq!(order.len(), 11);
        assert_eq!(order[3], "x");
        let mut keys: Vec<i64> = store
            .nodes(SCOPE)
            .iter()
            .filter(|n| n.parent_id.is_none())
            .map(|n| n.order_key.value())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 11);
        // Renumbering and the move land in one batch
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_renumbering_leaves_sibling_order_intact() {
        let mut nodes: Vec<Node<()>> = (1..=10)
            .map(|i| Node::new(format!("n{}", i), None, i as i64, ()))
            .collect();
        nodes.push(Node::new("x", Some("n1"), 1, ()));
        let store = store(nodes);
        let before = store.child_order(SCOPE, None);
        store.fail_next_writes(1);

        let target = Candidate::new(
            None,
            Boundary::Between {
                after: "n3".into(),
                before: "n4".into(),
            },
        );
        let err = store.move_and_reorder(SCOPE, "x", &target).await.unwrap_err();
        assert!(matches!(err, ReorderError::Persistence { .. }));
        assert_eq!(store.child_order(SCOPE, None), before);
        assert_eq!(store.child_order(SCOPE, Some("n1")), ["x"]);

        // A retry against the untouched store places x where it was asked to go
        store.move_and_reorder(SCOPE, "x", &target).await.unwrap();
        let order = store.child_order(SCOPE, None);
        assert_eq!(&order[..5], ["n1", "n2", "n3", "x", "n4"]);
    }

    #[tokio::test]
    async fn cycle_is_rejected_without_writes() {
        let store = store(vec![
            Node::new("A", None, 1024, ()),
            Node::new("A1", Some("A"), 1024, ()),
        ]);
        let target = Candidate::new(Some("A1"), Boundary::End { last: None });
        let err = store.move_and_reorder(SCOPE, "A", &target).await.unwrap_err();
        assert!(matches!(err, ReorderError::InvalidTarget { .. }));

        let target = Candidate::new(Some("A"), Boundary::End { last: None });
        let err = store.move_and_reorder(SCOPE, "A", &target).await.unwrap_err();
        assert!(matches!(err, ReorderError::InvalidTarget { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn vanished_anchor_is_stale() {
        let store = abc();
        let err = store
            .move_and_reorder(SCOPE, "C", &Candidate::new(None, start("gone")))
            .await
            .unwrap_err();
        assert!(matches!(err, ReorderError::StaleSnapshot { ref node_id } if node_id == "gone"));

        let err = store
            .move_and_reorder(SCOPE, "gone", &Candidate::new(None, start("A")))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn reversed_between_is_stale() {
        let store = abc();
        let target = Candidate::new(
            None,
            Boundary::Between {
                after: "C".into(),
                before: "B".into(),
            },
        );
        let err = store.move_and_reorder(SCOPE, "A", &target).await.unwrap_err();
        assert!(matches!(err, ReorderError::StaleSnapshot { .. }));
    }

    #[tokio::test]
    async fn write_failure_is_persistence_error() {
        let store = abc();
        store.fail_next_writes(1);
        let err = store
            .move_and_reorder(SCOPE, "C", &Candidate::new(None, start("A")))
            .await
            .unwrap_err();
        assert!(matches!(err, ReorderError::Persistence { .. }));
        assert_eq!(store.child_order(SCOPE, None), ["A", "B", "C"]);
    }
}
