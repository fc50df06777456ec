//! Node Factory
//!
//! Builds new document nodes from a block tag and an attribute bag.
//!
//! Attribute precedence, lowest to highest:
//!
//! 1. built-in type defaults from the schema
//! 2. caller-supplied attributes (block defaults and presets are merged into
//!    these by the designer before calling the factory)
//! 3. a freshly generated `id`
//!
//! Column containers are produced without cell structure; the nesting
//! manager materializes cells lazily on the first drop into the column.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{generate_node_id, schema, Node};

/// Errors that can occur while building nodes
#[derive(Error, Debug)]
pub enum FactoryError {
    /// The block tag does not resolve to a schema definition
    #[error("Unknown node type: {node_type}")]
    UnknownNodeType { node_type: String },

    /// The type exists but cannot be created as a standalone block
    #[error("Node type '{node_type}' cannot be created as a block")]
    NotABlock { node_type: String },

    /// Attributes violate a type constraint
    #[error("Invalid attributes for '{node_type}': {reason}")]
    InvalidAttributes { node_type: String, reason: String },
}

impl FactoryError {
    pub fn unknown_node_type(node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            node_type: node_type.into(),
        }
    }

    pub fn invalid_attributes(node_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttributes {
            node_type: node_type.into(),
            reason: reason.into(),
        }
    }
}

/// Creates nodes with fresh identifiers and type defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeFactory;

impl NodeFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create a block node.
    ///
    /// Text-bearing types get default inline content when `content` is
    /// `None`: a button shows its label, a heading shows placeholder text and
    /// a paragraph stays an empty (but editable) textblock.
    ///
    /// # Errors
    ///
    /// - `UnknownNodeType` if the tag is not in the schema
    /// - `NotABlock` for structural-only types (`columnRow`, `columnCell`, ...)
    /// - `InvalidAttributes` for an out-of-range `columnsCount`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use template_designer_core::factory::NodeFactory;
    ///
    /// let button = NodeFactory::new().create_node("button", None, None).unwrap();
    /// assert_eq!(button.attr_str("label"), Some("Button"));
    /// assert_eq!(button.text_content(), "Button");
    /// assert!(button.id().unwrap().starts_with("node-"));
    /// ```
    pub fn create_node(
        &self,
        block_type: &str,
        attrs: Option<Map<String, Value>>,
        content: Option<Vec<Node>>,
    ) -> Result<Node, FactoryError> {
        let node_type = schema::resolve_block_tag(block_type);
        let spec = schema::spec(node_type).ok_or_else(|| {
            tracing::warn!("Refusing to create node of unknown type '{}'", block_type);
            FactoryError::unknown_node_type(block_type)
        })?;
        if !spec.block {
            return Err(FactoryError::NotABlock {
                node_type: node_type.to_string(),
            });
        }

        let mut merged = spec.default_attrs();
        if let Some(attrs) = attrs {
            merged.extend(attrs);
        }
        merged.insert("id".to_string(), Value::String(generate_node_id()));

        if node_type == schema::COLUMN {
            let count = merged.get("columnsCount").and_then(Value::as_u64);
            match count {
                Some(n) if (schema::MIN_COLUMNS..=schema::MAX_COLUMNS).contains(&n) => {}
                _ => {
                    return Err(FactoryError::invalid_attributes(
                        node_type,
                        format!(
                            "columnsCount must be between {} and {}",
                            schema::MIN_COLUMNS,
                            schema::MAX_COLUMNS
                        ),
                    ))
                }
            }
        }

        let content = match content {
            Some(content) => content,
            None => default_content(node_type, &merged),
        };

        Ok(Node {
            node_type: node_type.to_string(),
            attrs: merged,
            content,
            text: None,
        })
    }

    /// Create an empty column cell bound to `column_id`
    pub fn create_cell(&self, column_id: &str, index: usize, content: Vec<Node>) -> Node {
        let is_editor_mode = !content.is_empty();
        Node::new(schema::COLUMN_CELL)
            .with_id(generate_node_id())
            .with_attr("index", Value::from(index as u64))
            .with_attr("columnId", Value::String(column_id.to_string()))
            .with_attr("isEditorMode", Value::Bool(is_editor_mode))
            .with_content(content)
    }

    pub fn create_row(&self, cells: Vec<Node>) -> Node {
        Node::new(schema::COLUMN_ROW)
            .with_id(generate_node_id())
            .with_content(cells)
    }

    /// Deep copy of `node` with fresh ids on every structural descendant.
    ///
    /// Cells copied along with their column have `columnId` rewired to the
    /// copy's id.
    pub fn duplicate(&self, node: &Node) -> Node {
        self.duplicate_inner(node, None)
    }

    fn duplicate_inner(&self, node: &Node, column_id: Option<&str>) -> Node {
        let mut copy = node.clone();
        if copy.is_text() {
            return copy;
        }
        let new_id = generate_node_id();
        copy.attrs
            .insert("id".to_string(), Value::String(new_id.clone()));

        if copy.node_type == schema::COLUMN_CELL {
            if let Some(column_id) = column_id {
                copy.attrs
                    .insert("columnId".to_string(), Value::String(column_id.to_string()));
            }
        }

        let child_column = if copy.node_type == schema::COLUMN {
            Some(new_id.as_str())
        } else {
            column_id
        };
        copy.content = node
            .content
            .iter()
            .map(|child| self.duplicate_inner(child, child_column))
            .collect();
        copy
    }
}

fn default_content(node_type: &str, attrs: &Map<String, Value>) -> Vec<Node> {
    let text = match node_type {
        schema::BUTTON => attrs
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(schema::DEFAULT_BUTTON_LABEL)
            .to_string(),
        schema::HEADING => schema::DEFAULT_HEADING_TEXT.to_string(),
        _ => return Vec::new(),
    };
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_button_gets_default_label_and_text() {
        let node = NodeFactory::new().create_node("button", None, None).unwrap();
        assert_eq!(node.attr_str("label"), Some(schema::DEFAULT_BUTTON_LABEL));
        assert_eq!(node.text_content(), schema::DEFAULT_BUTTON_LABEL);
    }

    #[test]
    fn test_button_text_follows_caller_label() {
        let mut attrs = Map::new();
        attrs.insert("label".to_string(), json!("Buy now"));
        let node = NodeFactory::new()
            .create_node("button", Some(attrs), None)
            .unwrap();
        assert_eq!(node.text_content(), "Buy now");
    }

    #[test]
    fn test_caller_attrs_cannot_override_id() {
        let mut attrs = Map::new();
        attrs.insert("id".to_string(), json!("node-fixed"));
        attrs.insert("textAlign".to_string(), json!("center"));
        let node = NodeFactory::new()
            .create_node("heading", Some(attrs), None)
            .unwrap();
        assert_ne!(node.id(), Some("node-fixed"));
        assert_eq!(node.attr_str("textAlign"), Some("center"));
        assert_eq!(node.attr_u64("level"), Some(1));
    }

    #[test]
    fn test_text_tag_creates_empty_paragraph() {
        let node = NodeFactory::new().create_node("text", None, None).unwrap();
        assert_eq!(node.node_type, "paragraph");
        assert!(node.content.is_empty());
        assert_eq!(node.node_size(), 2);
    }

    #[test]
    fn test_explicit_content_is_kept() {
        let node = NodeFactory::new()
            .create_node("heading", None, Some(vec![Node::text("Custom")]))
            .unwrap();
        assert_eq!(node.text_content(), "Custom");
    }

    #[test]
    fn test_column_has_no_cells() {
        let node = NodeFactory::new().create_node("column", None, None).unwrap();
        assert!(node.content.is_empty());
        assert_eq!(node.attr_u64("columnsCount"), Some(2));
    }

    #[test]
    fn test_column_count_is_bounded() {
        let mut attrs = Map::new();
        attrs.insert("columnsCount".to_string(), json!(5));
        let err = NodeFactory::new()
            .create_node("column", Some(attrs), None)
            .unwrap_err();
        assert!(matches!(err, FactoryError::InvalidAttributes { .. }));
    }

    #[test]
    fn test_unknown_and_structural_types_fail() {
        let factory = NodeFactory::new();
        assert!(matches!(
            factory.create_node("carousel", None, None),
            Err(FactoryError::UnknownNodeType { .. })
        ));
        assert!(matches!(
            factory.create_node("columnCell", None, None),
            Err(FactoryError::NotABlock { .. })
        ));
    }

    #[test]
    fn test_duplicate_rewires_ids() {
        let factory = NodeFactory::new();
        let column = factory.create_node("column", None, None).unwrap();
        let column_id = column.id().unwrap().to_string();
        let cells = vec![
            factory.create_cell(&column_id, 0, vec![factory.create_node("image", None, None).unwrap()]),
            factory.create_cell(&column_id, 1, Vec::new()),
        ];
        let column = column.with_content(vec![factory.create_row(cells)]);

        let copy = factory.duplicate(&column);
        let copy_id = copy.id().unwrap();
        assert_ne!(copy_id, column_id);

        let original_ids = crate::document::collect_ids(std::slice::from_ref(&column));
        let copy_ids = crate::document::collect_ids(std::slice::from_ref(&copy));
        assert_eq!(original_ids.len(), copy_ids.len());
        assert!(copy_ids.iter().all(|id| !original_ids.contains(id)));

        for cell in &copy.content[0].content {
            assert_eq!(cell.attr_str("columnId"), Some(copy_id));
        }
    }
}
