//! Error types for drag and drop
//!
//! None of these cross the drag/drop boundary: the coordinator logs them and
//! reports the drop as having no effect.

use thiserror::Error;

use crate::document::DocumentError;
use crate::factory::FactoryError;
use crate::models::ValidationError;

/// Errors raised while measuring drop targets
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The element backing an item is no longer attached to the view
    #[error("Element for '{id}' is detached")]
    Detached { id: String },

    /// Layout could not be read at all
    #[error("Layout unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while resolving or executing a drop
#[derive(Error, Debug)]
pub enum DropError {
    /// The declared drop target does not resolve to a document position
    #[error("Drop target '{id}' not found")]
    TargetNotFound { id: String },

    /// The pointer-derived target is missing (no placeholder, no cell)
    #[error("Drop has no resolvable target")]
    NoTarget,

    /// The dragged document node no longer exists
    #[error("Drag source '{id}' not found")]
    SourceNotFound { id: String },

    #[error("Column '{column_id}' not found")]
    ColumnNotFound { column_id: String },

    #[error("Cell {cell_index} is out of range for column '{column_id}' ({columns_count} columns)")]
    InvalidCell {
        column_id: String,
        cell_index: usize,
        columns_count: u64,
    },

    /// Column containers cannot be placed inside column cells
    #[error("Cannot nest a column inside a column cell")]
    NestedColumn,

    /// Structural nodes (rows, cells, list items) cannot be dragged on their own
    #[error("Node '{id}' cannot be moved on its own")]
    NotMovable { id: String },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl DropError {
    pub fn target_not_found(id: impl Into<String>) -> Self {
        Self::TargetNotFound { id: id.into() }
    }

    pub fn source_not_found(id: impl Into<String>) -> Self {
        Self::SourceNotFound { id: id.into() }
    }

    pub fn column_not_found(column_id: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column_id: column_id.into(),
        }
    }
}
