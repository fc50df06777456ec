//! Block defaults and presets
//!
//! Two attribute sources sit on top of the schema defaults when a block is
//! instantiated:
//!
//! - [`BlockDefaults`] - one override bag per block type, applied to every
//!   new block of that type
//! - [`PresetRegistry`] - named attribute bundles keyed by `(type, key)`,
//!   referenced from the palette
//!
//! Resolution order (lowest to highest): schema defaults, block defaults,
//! preset attributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::schema;

/// Per-type attribute overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockDefaults {
    overrides: HashMap<String, Map<String, Value>>,
}

impl BlockDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block_type: &str) -> Option<&Map<String, Value>> {
        self.overrides.get(schema::resolve_block_tag(block_type))
    }

    /// Replace the override bag for a type (an `id` key is ignored)
    pub fn set(&mut self, block_type: &str, mut attrs: Map<String, Value>) {
        attrs.remove("id");
        self.overrides
            .insert(schema::resolve_block_tag(block_type).to_string(), attrs);
    }

    pub fn clear(&mut self, block_type: &str) -> bool {
        self.overrides
            .remove(schema::resolve_block_tag(block_type))
            .is_some()
    }
}

/// A named attribute bundle for a block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPreset {
    #[serde(rename = "type")]
    pub block_type: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl BlockPreset {
    pub fn new(block_type: impl Into<String>, key: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            block_type: block_type.into(),
            key: key.into(),
            label: None,
            attributes,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Registry of presets keyed by `(type, key)`, in registration order
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: Vec<BlockPreset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preset, replacing any existing one with the same key.
    ///
    /// Returns the replaced preset, if any.
    pub fn register(&mut self, mut preset: BlockPreset) -> Option<BlockPreset> {
        preset.block_type = schema::resolve_block_tag(&preset.block_type).to_string();
        preset.attributes.remove("id");
        match self
            .presets
            .iter_mut()
            .find(|p| p.block_type == preset.block_type && p.key == preset.key)
        {
            Some(existing) => Some(std::mem::replace(existing, preset)),
            None => {
                self.presets.push(preset);
                None
            }
        }
    }

    pub fn unregister(&mut self, block_type: &str, key: &str) -> Option<BlockPreset> {
        let block_type = schema::resolve_block_tag(block_type);
        let index = self
            .presets
            .iter()
            .position(|p| p.block_type == block_type && p.key == key)?;
        Some(self.presets.remove(index))
    }

    pub fn get(&self, block_type: &str, key: &str) -> Option<&BlockPreset> {
        let block_type = schema::resolve_block_tag(block_type);
        self.presets
            .iter()
            .find(|p| p.block_type == block_type && p.key == key)
    }

    /// Presets for one type, or all presets when `block_type` is `None`
    pub fn list(&self, block_type: Option<&str>) -> Vec<&BlockPreset> {
        let block_type = block_type.map(schema::resolve_block_tag);
        self.presets
            .iter()
            .filter(|p| block_type.map_or(true, |t| p.block_type == t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Merge block defaults and an optional preset into one attribute bag
pub fn resolve_attributes(
    defaults: &BlockDefaults,
    preset: Option<&BlockPreset>,
    block_type: &str,
) -> Map<String, Value> {
    let mut attrs = defaults.get(block_type).cloned().unwrap_or_default();
    if let Some(preset) = preset {
        attrs.extend(preset.attributes.clone());
    }
    attrs
}
