//! Node Data Structures
//!
//! This module defines the `Node` struct used for every element of a template
//! document: top-level blocks (heading, paragraph, image, button, ...), the
//! structural pieces of multi-column layouts (`column`, `columnRow`,
//! `columnCell`) and inline `text` runs.
//!
//! # Architecture
//!
//! - **Universal Node**: Single struct represents all content types
//! - **JSON Attributes**: All type-specific data lives in the `attrs` object
//! - **Stable Identity**: Structural nodes carry `attrs.id = "node-<uuid>"`
//! - **Offset Model**: Every node occupies a fixed number of positions in the
//!   document (see [`Node::node_size`]), which is how drop targets are addressed
//!
//! # Examples
//!
//! ```rust
//! use template_designer_core::models::Node;
//! use serde_json::json;
//!
//! let heading = Node::new("heading")
//!     .with_id("node-1")
//!     .with_attr("level", json!(2))
//!     .with_content(vec![Node::text("Welcome")]);
//!
//! assert_eq!(heading.id(), Some("node-1"));
//! assert_eq!(heading.node_size(), "Welcome".len() + 2);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::schema;

/// Prefix shared by every generated node identifier
pub const NODE_ID_PREFIX: &str = "node-";

/// Generate a fresh process-unique node identifier (`node-<uuid>`)
pub fn generate_node_id() -> String {
    format!("{}{}", NODE_ID_PREFIX, Uuid::new_v4())
}

/// Validation errors for Node structures
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid node ID: {0}")]
    InvalidId(String),

    #[error("Duplicate node ID: {0}")]
    DuplicateId(String),

    #[error("Invalid content for '{node_type}': {reason}")]
    InvalidContent { node_type: String, reason: String },

    #[error("Attributes validation failed: {0}")]
    InvalidAttributes(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Universal node structure for template documents.
///
/// # Fields
///
/// - `node_type`: Type tag (e.g., "heading", "paragraph", "column", "text")
/// - `attrs`: JSON object with all type-specific attributes, including `id`
/// - `content`: Ordered children (empty for atomic leaves and text)
/// - `text`: Text payload, only present on inline `text` nodes
///
/// The serialized form matches the editor's node JSON
/// (`{"type": ..., "attrs": {...}, "content": [...]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    /// Create an empty node of the given type with no attributes
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: Map::new(),
            content: Vec::new(),
            text: None,
        }
    }

    /// Create an inline text node
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            node_type: schema::TEXT.to_string(),
            attrs: Map::new(),
            content: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.attrs.insert("id".to_string(), Value::String(id.into()));
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    /// The node's `id` attribute, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.attrs
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attrs.get(key).and_then(Value::as_u64)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attrs.get(key).and_then(Value::as_bool)
    }

    pub fn is_text(&self) -> bool {
        self.node_type == schema::TEXT
    }

    /// Atomic leaf blocks (image, divider, ...) occupy a single position
    pub fn is_atom(&self) -> bool {
        !self.is_text() && schema::spec(&self.node_type).is_some_and(|spec| spec.atom)
    }

    /// Leaves have no addressable interior positions
    pub fn is_leaf(&self) -> bool {
        self.is_text() || self.is_atom()
    }

    /// Number of document positions this node occupies.
    ///
    /// - text: its character count
    /// - atomic leaf: 1
    /// - everything else: `content_size() + 2` (opening and closing token)
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.text.as_deref().map(|t| t.chars().count()).unwrap_or(0)
        } else if self.is_atom() {
            1
        } else {
            self.content_size() + 2
        }
    }

    /// Sum of the sizes of the node's children
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    /// Concatenated text of all inline descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }

    /// Visit every descendant with its absolute position.
    ///
    /// `start` is the position of this node's first content slot. Returning
    /// `false` from the visitor skips that node's children.
    pub fn descendants<F>(&self, start: usize, visitor: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = start;
        for child in &self.content {
            if visitor(child, pos) && !child.is_leaf() {
                child.descendants(pos + 1, visitor);
            }
            pos += child.node_size();
        }
    }

    /// Serialize to the editor's node JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Validate structure and required fields of this subtree
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `node_type` is empty
    /// - a structural node has no id
    /// - a text node has no text or carries children
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.node_type.is_empty() {
            return Err(ValidationError::MissingField("type".to_string()));
        }

        if self.is_text() {
            if self.text.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::InvalidContent {
                    node_type: self.node_type.clone(),
                    reason: "text nodes must not be empty".to_string(),
                });
            }
            if !self.content.is_empty() {
                return Err(ValidationError::InvalidContent {
                    node_type: self.node_type.clone(),
                    reason: "text nodes cannot have children".to_string(),
                });
            }
            return Ok(());
        }

        if self.id().is_none() {
            return Err(ValidationError::MissingField(format!(
                "{}.attrs.id",
                self.node_type
            )));
        }

        for child in &self.content {
            child.validate()?;
        }
        Ok(())
    }
}
