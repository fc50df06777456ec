//! Data Models
//!
//! This module contains the data structures shared by every layer of the
//! designer:
//!
//! - `Node` - Universal node model for blocks, column structure and inline text
//! - `schema` - Built-in node type table, defaults and JSON validation
//! - `VisibleItem` - Palette entries (plain block tags or preset references)

mod node;
mod palette_item;
pub mod schema;

pub use node::{generate_node_id, Node, ValidationError, NODE_ID_PREFIX};
pub use palette_item::VisibleItem;
pub use schema::NodeSpec;
