//! Drag and drop
//!
//! - [`DragCoordinator`] - the gesture state machine (start, move, drop, cancel)
//! - [`GeometrySnapshot`] - drop-target rectangles frozen at drag-start
//! - [`DragSource`] / [`DropTarget`] - declared data of both ends of a drag
//!
//! Drops into column cells are handed to the
//! [`NestingManager`](crate::nesting::NestingManager).

mod coordinator;
mod error;
pub mod geometry;
mod session;
mod target;

pub use coordinator::{DragCoordinator, DropOutcome, MoveUpdate};
pub use error::{DropError, GeometryError};
pub use geometry::{CellRect, ColumnRect, GeometrySnapshot, ItemRect, LayoutProbe, Rect};
pub use session::{DragMode, DragSession, DragState};
pub use target::{CellTarget, DragSource, DropTarget, Edge};
