//! Hierarchical drag-reorder engine
//!
//! Turns a continuous pointer gesture over a rendered nested list into a
//! discrete reparent/reorder of a `{id, parent_id, order_key}` tree:
//! - `PositionClassifier`: pointer + row box → zone and indent request
//! - `DropTargetResolver`: zone + `TreeSnapshot` → `Candidate` (parent + boundary)
//! - `CycleGuard`: rejects placements under the dragged node's own subtree
//! - `PreviewMutator`: session-local row reordering for visual feedback
//! - `CommitDebouncer`: one commit per distinct placement
//! - `ReorderCommitter`: the only writer, through `ReorderOperations::move_and_reorder`
//!
//! `DragController` wires these together for one list scope.

pub mod classifier;
pub mod committer;
pub mod config;
pub mod controller;
pub mod cycle_guard;
pub mod debounce;
pub mod error;
pub mod preview;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod telemetry;
pub mod testing;
pub mod traits;

pub use classifier::{Classification, PositionClassifier, Zone, DEFAULT_INDENT_THRESHOLD};
pub use committer::{CommitEvent, CommitRequest, ReorderCommitter};
pub use config::{NestingPolicy, ReorderConfig};
pub use controller::{DragController, DragPhase};
pub use cycle_guard::CycleGuard;
pub use debounce::{CommitDebouncer, CommitKey};
pub use error::{BoxError, ReorderError, Result, StoreResult};
pub use preview::PreviewMutator;
pub use resolver::{Boundary, Candidate, DropTargetResolver};
pub use session::{DragSession, HoverOutcome};
pub use snapshot::{FlatRow, TreeSnapshot};
pub use traits::{NodeStore, PositionWrite, ReorderOperations};

pub use trellis_api::{
    DragOrigin, GestureEvent, GesturePhase, Node, OrderKey, Point, Rect, TreeNode, ORDER_KEY_STEP,
};
