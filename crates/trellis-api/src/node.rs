use serde::{Deserialize, Serialize};

use crate::OrderKey;

/// Entities that take part in a reorderable tree
///
/// This is the only view of an entity the reorder engine reads. Stores
/// implement it for their own row types; `Node<P>` is the stock
/// implementation carrying an opaque payload.
pub trait TreeNode: Clone + Send + Sync + 'static {
    /// Get the entity's unique identifier
    fn id(&self) -> &str;

    /// `None` means root level within the list's scope
    fn parent_id(&self) -> Option<&str>;

    fn order_key(&self) -> OrderKey;

    /// Copy of this entity placed at a new position; payload is carried through untouched
    fn with_position(&self, parent_id: Option<&str>, order_key: OrderKey) -> Self;
}

/// A tree node with an opaque domain payload (title, completion flag, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<P> {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub order_key: OrderKey,
    pub payload: P,
}

impl<P> Node<P> {
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        order_key: impl Into<OrderKey>,
        payload: P,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(|p| p.to_string()),
            order_key: order_key.into(),
            payload,
        }
    }

    /// Root-level node
    pub fn root(id: impl Into<String>, order_key: impl Into<OrderKey>, payload: P) -> Self {
        Self::new(id, None, order_key, payload)
    }
}

impl<P> TreeNode for Node<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn order_key(&self) -> OrderKey {
        self.order_key
    }

    fn with_position(&self, parent_id: Option<&str>, order_key: OrderKey) -> Self {
        Self {
            id: self.id.clone(),
            parent_id: parent_id.map(|p| p.to_string()),
            order_key,
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Task {
        title: String,
        completed: bool,
    }

    #[test]
    fn with_position_keeps_id_and_payload() {
        let task = Node::new(
            "t1",
            Some("p"),
            1024,
            Task {
                title: "Write report".into(),
                completed: true,
            },
        );
        let moved = task.with_position(None, OrderKey::new(8));
        assert_eq!(moved.id(), "t1");
        assert_eq!(moved.parent_id(), None);
        assert_eq!(moved.order_key(), OrderKey::new(8));
        assert_eq!(moved.payload, task.payload);
    }

    #[test]
    fn root_node_omits_parent_in_json() {
        let node = Node::root("a", 1, ());
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("parent_id").is_none());
        assert_eq!(json["order_key"], 1);
    }
}
