//! Built-in block schema
//!
//! Every node type the designer understands is described by a [`NodeSpec`]:
//! whether it is an atomic leaf, whether it holds inline text, whether it may
//! appear at the top level of a document, and its default attributes.
//!
//! The table mirrors the editor's schema. Types outside this table are
//! rejected by the node factory and by [`node_from_json`].

use serde_json::{json, Map, Value};

use super::node::{Node, ValidationError};

pub const TEXT: &str = "text";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const IMAGE: &str = "image";
pub const DIVIDER: &str = "divider";
pub const SPACER: &str = "spacer";
pub const BUTTON: &str = "button";
pub const CUSTOM_CODE: &str = "customCode";
pub const COLUMN: &str = "column";
pub const COLUMN_ROW: &str = "columnRow";
pub const COLUMN_CELL: &str = "columnCell";
pub const LIST: &str = "list";
pub const LIST_ITEM: &str = "listItem";

/// Default label for buttons created without explicit attributes
pub const DEFAULT_BUTTON_LABEL: &str = "Button";

/// Default inline text for a freshly created heading
pub const DEFAULT_HEADING_TEXT: &str = "Heading";

pub const MIN_COLUMNS: u64 = 2;
pub const MAX_COLUMNS: u64 = 4;

/// Static description of a node type
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    pub name: &'static str,
    /// Occupies a single position and has no children
    pub atom: bool,
    /// Children are inline text runs
    pub inline_content: bool,
    /// Editable text should exist right after creation
    pub text_bearing: bool,
    /// May be placed directly in the document root or inside a column cell
    pub block: bool,
    defaults: fn() -> Value,
}

impl NodeSpec {
    /// Built-in default attributes (never includes `id`)
    pub fn default_attrs(&self) -> Map<String, Value> {
        match (self.defaults)() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn paragraph_defaults() -> Value {
    json!({
        "textAlign": "left",
        "paddingVertical": 6,
        "paddingHorizontal": 0,
        "backgroundColor": "transparent",
        "textColor": "#292929",
        "borderWidth": 0,
        "borderRadius": 0,
        "borderColor": "#000000",
    })
}

fn heading_defaults() -> Value {
    json!({
        "level": 1,
        "textAlign": "left",
        "paddingVertical": 6,
        "paddingHorizontal": 0,
        "backgroundColor": "transparent",
        "textColor": "#000000",
    })
}

fn image_defaults() -> Value {
    json!({
        "sourcePath": "",
        "link": "",
        "alt": "",
        "alignment": "center",
        "width": 100,
        "borderWidth": 0,
        "borderRadius": 0,
        "borderColor": "#000000",
    })
}

fn divider_defaults() -> Value {
    json!({
        "color": "#e0e0e0",
        "size": 1,
        "paddingVertical": 6,
        "paddingHorizontal": 0,
    })
}

fn spacer_defaults() -> Value {
    json!({ "height": 24 })
}

fn button_defaults() -> Value {
    json!({
        "label": DEFAULT_BUTTON_LABEL,
        "link": "",
        "alignment": "center",
        "backgroundColor": "#0085FF",
        "textColor": "#ffffff",
        "borderWidth": 0,
        "borderRadius": 0,
        "borderColor": "#000000",
        "padding": 6,
    })
}

fn custom_code_defaults() -> Value {
    json!({ "code": "<!-- Add your HTML code here -->" })
}

fn column_defaults() -> Value {
    json!({
        "columnsCount": MIN_COLUMNS,
        "paddingVertical": 6,
        "paddingHorizontal": 0,
        "backgroundColor": "transparent",
        "borderWidth": 0,
        "borderRadius": 0,
        "borderColor": "#000000",
    })
}

fn column_cell_defaults() -> Value {
    json!({ "index": 0, "columnId": "", "isEditorMode": false })
}

fn list_defaults() -> Value {
    json!({ "listType": "unordered", "textColor": "#000000" })
}

fn no_defaults() -> Value {
    json!({})
}

const SPECS: &[NodeSpec] = &[
    NodeSpec { name: PARAGRAPH, atom: false, inline_content: true, text_bearing: true, block: true, defaults: paragraph_defaults },
    NodeSpec { name: HEADING, atom: false, inline_content: true, text_bearing: true, block: true, defaults: heading_defaults },
    NodeSpec { name: BUTTON, atom: false, inline_content: true, text_bearing: true, block: true, defaults: button_defaults },
    NodeSpec { name: IMAGE, atom: true, inline_content: false, text_bearing: false, block: true, defaults: image_defaults },
    NodeSpec { name: DIVIDER, atom: true, inline_content: false, text_bearing: false, block: true, defaults: divider_defaults },
    NodeSpec { name: SPACER, atom: true, inline_content: false, text_bearing: false, block: true, defaults: spacer_defaults },
    NodeSpec { name: CUSTOM_CODE, atom: true, inline_content: false, text_bearing: false, block: true, defaults: custom_code_defaults },
    NodeSpec { name: COLUMN, atom: false, inline_content: false, text_bearing: false, block: true, defaults: column_defaults },
    NodeSpec { name: COLUMN_ROW, atom: false, inline_content: false, text_bearing: false, block: false, defaults: no_defaults },
    NodeSpec { name: COLUMN_CELL, atom: false, inline_content: false, text_bearing: false, block: false, defaults: column_cell_defaults },
    NodeSpec { name: LIST, atom: false, inline_content: false, text_bearing: false, block: true, defaults: list_defaults },
    NodeSpec { name: LIST_ITEM, atom: false, inline_content: false, text_bearing: false, block: false, defaults: no_defaults },
];

/// Schema entry for a node type
pub fn spec(node_type: &str) -> Option<&'static NodeSpec> {
    SPECS.iter().find(|spec| spec.name == node_type)
}

/// Map a palette block tag to its node type.
///
/// The palette calls plain text blocks "text"; in the document they are
/// paragraphs (the `text` node type is reserved for inline runs).
pub fn resolve_block_tag(tag: &str) -> &str {
    if tag == TEXT {
        PARAGRAPH
    } else {
        tag
    }
}

/// Whether a node of `child` type may be placed inside `parent`
/// (`None` = document root)
pub fn allows_child(parent: Option<&str>, child: &Node) -> bool {
    let child_spec = spec(&child.node_type);
    match parent {
        None | Some(COLUMN_CELL) => child_spec.is_some_and(|s| s.block),
        Some(COLUMN) => child.node_type == COLUMN_ROW,
        Some(COLUMN_ROW) => child.node_type == COLUMN_CELL,
        Some(LIST) => child.node_type == LIST_ITEM,
        Some(LIST_ITEM) => child.node_type == PARAGRAPH || child.node_type == LIST,
        Some(other) => match spec(other) {
            Some(parent_spec) if parent_spec.inline_content => child.is_text(),
            Some(parent_spec) if parent_spec.atom => false,
            _ => true,
        },
    }
}

/// Rebuild a node from editor JSON, checking every type against the schema.
pub fn node_from_json(value: Value) -> Result<Node, ValidationError> {
    let node: Node = serde_json::from_value(value)?;
    check_known_types(&node)?;
    node.validate()?;
    Ok(node)
}

fn check_known_types(node: &Node) -> Result<(), ValidationError> {
    if !node.is_text() && spec(&node.node_type).is_none() {
        return Err(ValidationError::InvalidNodeType(node.node_type.clone()));
    }
    for child in &node.content {
        if !allows_child(Some(&node.node_type), child) {
            return Err(ValidationError::InvalidContent {
                node_type: node.node_type.clone(),
                reason: format!("'{}' is not allowed here", child.node_type),
            });
        }
        check_known_types(child)?;
    }
    Ok(())
}
