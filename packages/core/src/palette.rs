//! Palette visible item list
//!
//! The ordered list of entries shown in the side palette. It is
//! user-configurable and independent of the document.

use crate::models::VisibleItem;
use crate::registry::{BlockPreset, PresetRegistry};

/// Built-in palette order
pub const DEFAULT_VISIBLE_ITEMS: &[&str] = &[
    "heading",
    "text",
    "image",
    "spacer",
    "divider",
    "button",
    "customCode",
    "column",
    "list",
];

/// Palette entry resolved against the preset registry
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedItem<'a> {
    Block(&'a str),
    Preset(&'a BlockPreset),
}

#[derive(Debug, Clone)]
pub struct VisibleItemList {
    items: Vec<VisibleItem>,
    defaults: Vec<VisibleItem>,
}

impl Default for VisibleItemList {
    fn default() -> Self {
        Self::new(
            DEFAULT_VISIBLE_ITEMS
                .iter()
                .map(|tag| VisibleItem::block(*tag))
                .collect(),
        )
    }
}

impl VisibleItemList {
    /// Create a list whose reset target is `defaults`
    pub fn new(defaults: Vec<VisibleItem>) -> Self {
        Self {
            items: defaults.clone(),
            defaults,
        }
    }

    pub fn get(&self) -> &[VisibleItem] {
        &self.items
    }

    /// Replace the list; repeated entries are collapsed to their first occurrence
    pub fn set(&mut self, items: Vec<VisibleItem>) {
        let mut unique: Vec<VisibleItem> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        self.items = unique;
    }

    pub fn reset(&mut self) {
        self.items = self.defaults.clone();
    }

    /// Entries with preset references resolved; dangling references are skipped
    pub fn resolve<'a>(&'a self, presets: &'a PresetRegistry) -> Vec<ResolvedItem<'a>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                VisibleItem::Block(tag) => Some(ResolvedItem::Block(tag.as_str())),
                VisibleItem::Preset {
                    block_type,
                    preset_key,
                } => match presets.get(block_type, preset_key) {
                    Some(preset) => Some(ResolvedItem::Preset(preset)),
                    None => {
                        tracing::debug!(
                            "Skipping palette entry for missing preset {}:{}",
                            block_type,
                            preset_key
                        );
                        None
                    }
                },
            })
            .collect()
    }
}
