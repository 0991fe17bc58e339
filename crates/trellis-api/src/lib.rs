//! Data model for the hierarchical drag-reorder engine
//!
//! This crate holds the plain data shared between the engine and its hosts:
//! - `OrderKey`: sibling ordering with "insert-between" generation
//! - `Node` / `TreeNode`: the `{id, parent_id, order_key}` view of an entity
//! - `Point` / `Rect`: pointer and row geometry
//! - `GestureEvent`: the drag gesture stream delivered by the host

pub mod geometry;
pub mod gesture;
pub mod node;
pub mod order_key;

pub use geometry::{Point, Rect};
pub use gesture::{DragOrigin, GestureEvent, GesturePhase};
pub use node::{Node, TreeNode};
pub use order_key::{OrderKey, ORDER_KEY_STEP};
