//! Flat editor item list
//!
//! The ordered list of top-level node ids the UI uses as stable keys. It is
//! never edited by hand: the synchronizer replaces it from the realized view
//! and the drag coordinator manages its single transient placeholder.
//!
//! A placeholder id has the form `<sourceId>_temp_<timestamp>`. At most one
//! placeholder exists at any time; replacing it removes the old id and adds
//! the new one in the same update.

use std::sync::OnceLock;

use regex::Regex;

const PLACEHOLDER_PATTERN: &str = r"^(?P<source>.+)_temp_(?P<stamp>\d+)$";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).unwrap())
}

/// Whether `id` is a transient drag placeholder
pub fn is_placeholder_id(id: &str) -> bool {
    placeholder_regex().is_match(id)
}

/// Source id encoded in a placeholder id
pub fn placeholder_source(id: &str) -> Option<&str> {
    placeholder_regex()
        .captures(id)
        .and_then(|caps| caps.name("source"))
        .map(|m| m.as_str())
}

pub fn placeholder_id(source_id: &str, timestamp_ms: i64) -> String {
    format!("{}_temp_{}", source_id, timestamp_ms.max(0))
}

/// Ordered top-level item ids plus at most one placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatItemList {
    ids: Vec<String>,
}

impl FlatItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: Vec<String>) -> Self {
        let mut list = Self::new();
        list.replace_from_view(ids);
        list
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids without the placeholder
    pub fn item_ids(&self) -> Vec<&str> {
        self.ids
            .iter()
            .map(String::as_str)
            .filter(|id| !is_placeholder_id(id))
            .collect()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.ids
            .iter()
            .map(String::as_str)
            .find(|id| is_placeholder_id(id))
    }

    /// Index of the placeholder, which equals the number of real items before it
    pub fn placeholder_index(&self) -> Option<usize> {
        self.ids.iter().position(|id| is_placeholder_id(id))
    }

    pub fn placeholder_count(&self) -> usize {
        self.ids.iter().filter(|id| is_placeholder_id(id)).count()
    }

    /// Put the single placeholder before the real item at `index`
    /// (clamped to the end), replacing any existing placeholder in the same
    /// update. Returns the new placeholder id.
    pub fn set_placeholder(&mut self, index: usize, source_id: &str, timestamp_ms: i64) -> String {
        let id = placeholder_id(source_id, timestamp_ms);
        let mut next: Vec<String> = self
            .ids
            .iter()
            .filter(|existing| !is_placeholder_id(existing))
            .cloned()
            .collect();
        let index = index.min(next.len());
        next.insert(index, id.clone());
        self.ids = next;
        id
    }

    /// Remove the placeholder; returns whether one was present
    pub fn remove_placeholder(&mut self) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| !is_placeholder_id(id));
        before != self.ids.len()
    }

    /// Replace the real items with ids sampled from the view.
    ///
    /// A placeholder currently in the list keeps its index; placeholder ids
    /// coming from the view are ignored so a removed one is never brought
    /// back. Repeated ids collapse to their first occurrence.
    pub fn replace_from_view(&mut self, sampled: Vec<String>) {
        let current = self
            .placeholder_index()
            .zip(self.placeholder().map(str::to_string));

        let mut next: Vec<String> = Vec::with_capacity(sampled.len() + 1);
        for id in sampled {
            if id.is_empty() || is_placeholder_id(&id) || next.contains(&id) {
                continue;
            }
            next.push(id);
        }
        if let Some((index, placeholder)) = current {
            let index = index.min(next.len());
            next.insert(index, placeholder);
        }
        self.ids = next;
    }
}
