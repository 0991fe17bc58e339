use crate::snapshot::TreeSnapshot;
use trellis_api::TreeNode;

/// Rejects placements that would make a node its own ancestor
pub struct CycleGuard;

impl CycleGuard {
    /// `true` when `dragged_id` may become a child of `parent_id` (`None` = root)
    pub fn permits<N: TreeNode>(
        snapshot: &TreeSnapshot<N>,
        dragged_id: &str,
        parent_id: Option<&str>,
    ) -> bool {
        let Some(parent) = parent_id else {
            return true;
        };
        if parent == dragged_id {
            return false;
        }
        !snapshot.is_ancestor(dragged_id, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_api::Node;

    fn tree() -> TreeSnapshot<Node<()>> {
        TreeSnapshot::from_nodes(vec![
            Node::new("A", None, 1, ()),
            Node::new("A1", Some("A"), 1, ()),
            Node::new("A1a", Some("A1"), 1, ()),
            Node::new("B", None, 2, ()),
        ])
    }

    #[test]
    fn root_target_is_always_safe() {
        assert!(CycleGuard::permits(&tree(), "A", None));
    }

    #[test]
    fn self_parent_is_rejected() {
        assert!(!CycleGuard::permits(&tree(), "A", Some("A")));
    }

    #[test]
    fn descendant_parent_is_rejected() {
        let snapshot = tree();
        assert!(!CycleGuard::permits(&snapshot, "A", Some("A1")));
        assert!(!CycleGuard::permits(&snapshot, "A", Some("A1a")));
    }

    #[test]
    fn unrelated_parent_is_allowed() {
        let snapshot = tree();
        assert!(CycleGuard::permits(&snapshot, "A1a", Some("B")));
        assert!(CycleGuard::permits(&snapshot, "B", Some("A1")));
    }
}
