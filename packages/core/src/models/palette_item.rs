//! Palette entries

use serde::{Deserialize, Serialize};

/// One entry of the palette's visible item list.
///
/// Serialized the way the UI stores it: a plain block tag is a bare string,
/// a preset reference is an object.
///
/// ```rust
/// use template_designer_core::models::VisibleItem;
///
/// let items: Vec<VisibleItem> =
///     serde_json::from_str(r#"["heading", {"type": "button", "presetKey": "cta"}]"#).unwrap();
/// assert_eq!(items[0], VisibleItem::block("heading"));
/// assert_eq!(items[1], VisibleItem::preset("button", "cta"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisibleItem {
    Block(String),
    #[serde(rename_all = "camelCase")]
    Preset {
        #[serde(rename = "type")]
        block_type: String,
        preset_key: String,
    },
}

impl VisibleItem {
    pub fn block(tag: impl Into<String>) -> Self {
        Self::Block(tag.into())
    }

    pub fn preset(block_type: impl Into<String>, preset_key: impl Into<String>) -> Self {
        Self::Preset {
            block_type: block_type.into(),
            preset_key: preset_key.into(),
        }
    }

    /// The block tag this entry instantiates
    pub fn block_type(&self) -> &str {
        match self {
            Self::Block(tag) => tag,
            Self::Preset { block_type, .. } => block_type,
        }
    }

    pub fn preset_key(&self) -> Option<&str> {
        match self {
            Self::Block(_) => None,
            Self::Preset { preset_key, .. } => Some(preset_key),
        }
    }

    /// Identifier used as the drag source id (`heading`, `button:cta`)
    pub fn drag_id(&self) -> String {
        match self {
            Self::Block(tag) => tag.clone(),
            Self::Preset {
                block_type,
                preset_key,
            } => format!("{}:{}", block_type, preset_key),
        }
    }
}
