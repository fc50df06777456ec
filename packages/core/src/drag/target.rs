//! Drag sources and drop targets

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::VisibleItem;

/// Where a dragged item comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragSource {
    /// A palette entry; `attrs` are the resolved block defaults and preset
    /// attributes to instantiate it with
    #[serde(rename_all = "camelCase")]
    Palette {
        block_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preset_key: Option<String>,
        #[serde(default)]
        attrs: Map<String, Value>,
    },

    /// An existing document node
    #[serde(rename_all = "camelCase")]
    DocumentItem { node_id: String },
}

impl DragSource {
    pub fn palette(block_type: impl Into<String>) -> Self {
        Self::Palette {
            block_type: block_type.into(),
            preset_key: None,
            attrs: Map::new(),
        }
    }

    pub fn document_item(node_id: impl Into<String>) -> Self {
        Self::DocumentItem {
            node_id: node_id.into(),
        }
    }

    /// Identifier of the dragged thing: the palette drag id or the node id
    pub fn active_id(&self) -> String {
        match self {
            Self::Palette {
                block_type,
                preset_key: Some(key),
                ..
            } => VisibleItem::preset(block_type.as_str(), key.as_str()).drag_id(),
            Self::Palette { block_type, .. } => block_type.clone(),
            Self::DocumentItem { node_id } => node_id.clone(),
        }
    }

    /// Block tag being dragged out of the palette
    pub fn drag_type(&self) -> Option<&str> {
        match self {
            Self::Palette { block_type, .. } => Some(block_type),
            Self::DocumentItem { .. } => None,
        }
    }

    pub fn is_palette(&self) -> bool {
        matches!(self, Self::Palette { .. })
    }
}

/// Side of the hovered item a drop lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Edge {
    Before,
    After,
}

/// A column cell as a drop target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTarget {
    pub column_id: String,
    pub cell_index: usize,
    /// The column had no cell structure when the target was measured
    #[serde(default)]
    pub is_placeholder_cell: bool,
}

impl CellTarget {
    pub fn new(column_id: impl Into<String>, cell_index: usize, is_placeholder_cell: bool) -> Self {
        Self {
            column_id: column_id.into(),
            cell_index,
            is_placeholder_cell,
        }
    }
}

/// Data the drop target declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropTarget {
    /// A top-level item with an edge hint
    Item { id: String, edge: Edge },

    /// A column cell
    Cell(CellTarget),

    /// After the last top-level item
    End,

    /// Whatever the last pointer move computed (placeholder index or cell)
    Pointer,
}

impl DropTarget {
    pub fn before(id: impl Into<String>) -> Self {
        Self::Item {
            id: id.into(),
            edge: Edge::Before,
        }
    }

    pub fn after(id: impl Into<String>) -> Self {
        Self::Item {
            id: id.into(),
            edge: Edge::After,
        }
    }
}

/// Fully resolved target of a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolvedTarget {
    /// Insert before the top-level item at this index
    TopLevel(usize),
    Cell(CellTarget),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_active_id() {
        assert_eq!(DragSource::palette("heading").active_id(), "heading");
        let preset = DragSource::Palette {
            block_type: "button".to_string(),
            preset_key: Some("cta".to_string()),
            attrs: Map::new(),
        };
        assert_eq!(preset.active_id(), "button:cta");
        assert_eq!(preset.drag_type(), Some("button"));
        assert_eq!(DragSource::document_item("node-1").drag_type(), None);
    }

    #[test]
    fn test_drop_target_json() {
        let target: DropTarget =
            serde_json::from_value(json!({"kind": "item", "id": "node-1", "edge": "before"})).unwrap();
        assert_eq!(target, DropTarget::before("node-1"));

        let target: DropTarget = serde_json::from_value(
            json!({"kind": "cell", "columnId": "col", "cellIndex": 1, "isPlaceholderCell": true}),
        )
        .unwrap();
        assert_eq!(target, DropTarget::Cell(CellTarget::new("col", 1, true)));
    }
}
