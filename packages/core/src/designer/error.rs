//! Designer facade error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::drag::DropError;
use crate::factory::FactoryError;
use crate::models::ValidationError;

/// Errors returned by [`TemplateDesigner`](super::TemplateDesigner) operations
#[derive(Error, Debug)]
pub enum DesignerError {
    /// Referenced preset is not registered
    #[error("Preset not found: {block_type}:{key}")]
    PresetNotFound { block_type: String, key: String },

    /// Referenced node does not exist
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// The node is structural (row, cell, list item) and cannot be handled alone
    #[error("Node '{id}' is not a block")]
    NotABlock { id: String },

    /// The designer was torn down
    #[error("Designer has been torn down")]
    TornDown,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Node creation failed: {0}")]
    Factory(#[from] FactoryError),

    #[error("Drop failed: {0}")]
    Drop(#[from] DropError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl DesignerError {
    pub fn preset_not_found(block_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self::PresetNotFound {
            block_type: block_type.into(),
            key: key.into(),
        }
    }

    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }
}
