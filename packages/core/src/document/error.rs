//! Error types for document tree operations
//!
//! These errors are produced while resolving positions or applying
//! transaction steps. A failed step never leaves the working document
//! half-mutated; callers abandon the transaction instead of dispatching it.

use thiserror::Error;

use crate::models::ValidationError;

/// Errors that can occur while reading or mutating a document tree
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Position lies beyond the end of the document
    #[error("Position {pos} is out of range (document size {size})")]
    OutOfRange { pos: usize, size: usize },

    /// Position exists but cannot be used for this operation
    #[error("Invalid position {pos}: {reason}")]
    InvalidPosition { pos: usize, reason: String },

    /// Node is not allowed at the target location
    #[error("Node '{node_type}' cannot be placed inside '{parent}'")]
    InvalidContent { node_type: String, parent: String },

    /// Referenced node does not exist
    #[error("Node '{id}' does not exist")]
    NodeNotFound { id: String },

    /// Inserting the node would break id uniqueness
    #[error("Duplicate node id '{id}'")]
    DuplicateId { id: String },

    /// Transaction was built against an older document version
    #[error("Stale transaction: built on version {base_version}, document is at {current_version}")]
    StaleTransaction {
        base_version: u64,
        current_version: u64,
    },

    /// The editor has been torn down
    #[error("Document has been destroyed")]
    Destroyed,

    /// The editor is read-only
    #[error("Document is not editable")]
    NotEditable,

    /// The realized view cannot be sampled (not mounted yet or detached)
    #[error("Document view is unavailable")]
    ViewUnavailable,

    /// Node JSON failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl DocumentError {
    pub fn out_of_range(pos: usize, size: usize) -> Self {
        Self::OutOfRange { pos, size }
    }

    pub fn invalid_position(pos: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPosition {
            pos,
            reason: reason.into(),
        }
    }

    pub fn invalid_content(node_type: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::InvalidContent {
            node_type: node_type.into(),
            parent: parent.into(),
        }
    }

    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }
}
