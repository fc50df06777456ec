//! Document tree and position arithmetic
//!
//! A [`Doc`] is the root of a template document: an ordered list of
//! top-level blocks. Positions are integer offsets in the flattened token
//! stream of the tree (see [`Node::node_size`]). Offset `0` is before the
//! first top-level block and `content_size()` is after the last one.
//!
//! Mutating methods are crate-private; outside code changes a document only
//! by building a [`Transaction`](super::Transaction) and dispatching it.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use super::DocumentError;
use crate::models::{schema, Node, ValidationError};

const ROOT_TYPE: &str = "doc";

/// A boundary between two siblings: `index` inside the content reached by
/// following `path` from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    path: Vec<usize>,
    index: usize,
}

/// Root of a template document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Doc {
    content: Vec<Node>,
}

impl Doc {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a document from top-level nodes, checking placement and id
    /// uniqueness.
    pub fn from_nodes(content: Vec<Node>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for node in &content {
            if !schema::allows_child(None, node) {
                return Err(ValidationError::InvalidContent {
                    node_type: ROOT_TYPE.to_string(),
                    reason: format!("'{}' cannot be a top-level block", node.node_type),
                });
            }
            node.validate()?;
            for id in collect_ids(std::slice::from_ref(node)) {
                if !seen.insert(id.clone()) {
                    return Err(ValidationError::DuplicateId(id));
                }
            }
        }
        Ok(Self { content })
    }

    /// Parse the editor's document JSON (`{"type": "doc", "content": [...]}`)
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = value else {
            return Err(ValidationError::InvalidNodeType(
                "document JSON must be an object".to_string(),
            ));
        };
        match map.get("type").and_then(Value::as_str) {
            Some(ROOT_TYPE) => {}
            other => {
                return Err(ValidationError::InvalidNodeType(format!(
                    "expected 'doc', got {:?}",
                    other
                )))
            }
        }
        let content = match map.remove("content") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(schema::node_from_json)
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ValidationError::InvalidContent {
                    node_type: ROOT_TYPE.to_string(),
                    reason: "content must be an array".to_string(),
                })
            }
        };
        Self::from_nodes(content)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "type": ROOT_TYPE,
            "content": self.content.iter().map(Node::to_json).collect::<Vec<_>>(),
        })
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    /// Total size of the top-level content
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    /// Node starting exactly at `pos`, at any depth
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let slot = self.resolve_slot(pos).ok()?;
        self.content_at(&slot.path)?.get(slot.index)
    }

    /// Visit every node with its absolute start position
    pub fn descendants<F>(&self, mut visitor: F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let mut pos = 0;
        for child in &self.content {
            if visitor(child, pos) && !child.is_leaf() {
                child.descendants(pos + 1, &mut visitor);
            }
            pos += child.node_size();
        }
    }

    /// Locate a structural node by id, returning its position and the node
    pub fn find_node(&self, id: &str) -> Option<(usize, &Node)> {
        let mut found = None;
        self.descendants(|node, pos| {
            if found.is_some() {
                return false;
            }
            if node.id() == Some(id) {
                found = Some(pos);
                return false;
            }
            true
        });
        found.and_then(|pos| self.node_at(pos).map(|node| (pos, node)))
    }

    /// Parent of the node starting at `pos`; `None` at the top level
    pub fn parent_at(&self, pos: usize) -> Option<&Node> {
        let slot = self.resolve_slot(pos).ok()?;
        let (last, parent_path) = slot.path.split_last()?;
        self.content_at(parent_path)?.get(*last)
    }

    /// Index of the top-level child containing `pos`
    pub fn top_level_index_at(&self, pos: usize) -> Option<usize> {
        let mut offset = 0;
        for (index, child) in self.content.iter().enumerate() {
            let size = child.node_size();
            if pos < offset + size {
                return Some(index);
            }
            offset += size;
        }
        None
    }

    /// Ids of the top-level blocks, in document order
    pub fn top_level_ids(&self) -> Vec<String> {
        self.content
            .iter()
            .filter_map(|node| node.id().map(str::to_string))
            .collect()
    }

    /// Every structural id in the document, in document order
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.descendants(|node, _| {
            if let Some(id) = node.id() {
                ids.push(id.to_string());
            }
            true
        });
        ids
    }

    /// Ids that occur more than once (should always be empty)
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in self.all_ids() {
            if !seen.insert(id.clone()) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }

    fn resolve_slot(&self, pos: usize) -> Result<Slot, DocumentError> {
        let original = pos;
        let mut path = Vec::new();
        let mut content: &[Node] = &self.content;
        let mut pos = pos;

        'descend: loop {
            let mut offset = 0;
            for (index, child) in content.iter().enumerate() {
                if pos == offset {
                    return Ok(Slot { path, index });
                }
                let size = child.node_size();
                if pos < offset + size {
                    if child.is_leaf() {
                        return Err(DocumentError::invalid_position(
                            original,
                            format!("inside leaf node '{}'", child.node_type),
                        ));
                    }
                    path.push(index);
                    pos -= offset + 1;
                    content = &child.content;
                    continue 'descend;
                }
                offset += size;
            }
            if pos == offset {
                return Ok(Slot {
                    path,
                    index: content.len(),
                });
            }
            return Err(DocumentError::out_of_range(original, self.content_size()));
        }
    }

    fn content_at(&self, path: &[usize]) -> Option<&Vec<Node>> {
        let mut content = &self.content;
        for &index in path {
            content = &content.get(index)?.content;
        }
        Some(content)
    }

    fn content_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        let mut content = &mut self.content;
        for &index in path {
            content = &mut content.get_mut(index)?.content;
        }
        Some(content)
    }

    fn parent_type(&self, path: &[usize]) -> Option<&str> {
        let (last, parent_path) = path.split_last()?;
        self.content_at(parent_path)?
            .get(*last)
            .map(|node| node.node_type.as_str())
    }

    fn node_at_mut(&mut self, pos: usize) -> Result<&mut Node, DocumentError> {
        let slot = self.resolve_slot(pos)?;
        self.content_at_mut(&slot.path)
            .and_then(|content| content.get_mut(slot.index))
            .ok_or_else(|| DocumentError::invalid_position(pos, "no node starts here"))
    }

    fn check_placement(&self, path: &[usize], node: &Node) -> Result<(), DocumentError> {
        let parent = self.parent_type(path);
        if !schema::allows_child(parent, node) {
            return Err(DocumentError::invalid_content(
                node.node_type.clone(),
                parent.unwrap_or(ROOT_TYPE),
            ));
        }
        node.validate()?;
        Ok(())
    }

    fn check_unique(&self, node: &Node, ignoring: &HashSet<String>) -> Result<(), DocumentError> {
        let existing: HashSet<String> = self
            .all_ids()
            .into_iter()
            .filter(|id| !ignoring.contains(id))
            .collect();
        let mut incoming = HashSet::new();
        for id in collect_ids(std::slice::from_ref(node)) {
            if existing.contains(&id) || !incoming.insert(id.clone()) {
                return Err(DocumentError::duplicate_id(id));
            }
        }
        Ok(())
    }

    fn resolve_range(&self, from: usize, to: usize) -> Result<(Vec<usize>, usize, usize), DocumentError> {
        if from > to {
            return Err(DocumentError::invalid_position(
                from,
                format!("range start is after its end ({})", to),
            ));
        }
        let start = self.resolve_slot(from)?;
        let end = self.resolve_slot(to)?;
        if start.path != end.path {
            return Err(DocumentError::invalid_position(
                from,
                format!("range {}..{} spans different parents", from, to),
            ));
        }
        Ok((start.path, start.index, end.index))
    }

    pub(crate) fn insert(&mut self, pos: usize, node: Node) -> Result<(), DocumentError> {
        let slot = self.resolve_slot(pos)?;
        self.check_placement(&slot.path, &node)?;
        self.check_unique(&node, &HashSet::new())?;
        let content = self
            .content_at_mut(&slot.path)
            .ok_or_else(|| DocumentError::invalid_position(pos, "unreachable parent"))?;
        content.insert(slot.index, node);
        Ok(())
    }

    pub(crate) fn delete(&mut self, from: usize, to: usize) -> Result<Vec<Node>, DocumentError> {
        let (path, start, end) = self.resolve_range(from, to)?;
        let content = self
            .content_at_mut(&path)
            .ok_or_else(|| DocumentError::invalid_position(from, "unreachable parent"))?;
        Ok(content.drain(start..end).collect())
    }

    pub(crate) fn replace_with(&mut self, from: usize, to: usize, node: Node) -> Result<(), DocumentError> {
        let (path, start, end) = self.resolve_range(from, to)?;
        self.check_placement(&path, &node)?;
        let removed = {
            let content = self
                .content_at(&path)
                .ok_or_else(|| DocumentError::invalid_position(from, "unreachable parent"))?;
            collect_ids(&content[start..end])
        };
        self.check_unique(&node, &removed.into_iter().collect())?;
        let content = self
            .content_at_mut(&path)
            .ok_or_else(|| DocumentError::invalid_position(from, "unreachable parent"))?;
        content.splice(start..end, std::iter::once(node));
        Ok(())
    }

    pub(crate) fn set_node_attrs(&mut self, pos: usize, mut attrs: Map<String, Value>) -> Result<(), DocumentError> {
        if let Some(Value::String(new_id)) = attrs.get("id") {
            self.check_id_change(pos, new_id)?;
        }
        let node = self.node_at_mut(pos)?;
        if node.is_text() {
            return Err(DocumentError::invalid_position(pos, "text nodes have no attributes"));
        }
        if !attrs.contains_key("id") {
            if let Some(id) = node.attrs.get("id").cloned() {
                attrs.insert("id".to_string(), id);
            }
        }
        node.attrs = attrs;
        Ok(())
    }

    pub(crate) fn set_node_attr(&mut self, pos: usize, key: &str, value: Value) -> Result<(), DocumentError> {
        if key == "id" {
            let new_id = value
                .as_str()
                .ok_or_else(|| DocumentError::invalid_position(pos, "id must be a string"))?;
            self.check_id_change(pos, new_id)?;
        }
        let node = self.node_at_mut(pos)?;
        if node.is_text() {
            return Err(DocumentError::invalid_position(pos, "text nodes have no attributes"));
        }
        node.attrs.insert(key.to_string(), value);
        Ok(())
    }

    fn check_id_change(&self, pos: usize, new_id: &str) -> Result<(), DocumentError> {
        let current = self.node_at(pos).and_then(Node::id);
        if current != Some(new_id) && self.find_node(new_id).is_some() {
            return Err(DocumentError::duplicate_id(new_id));
        }
        Ok(())
    }
}

/// All structural ids in a list of subtrees
pub(crate) fn collect_ids(nodes: &[Node]) -> Vec<String> {
    let mut ids = Vec::new();
    for node in nodes {
        if let Some(id) = node.id() {
            ids.push(id.to_string());
        }
        ids.extend(collect_ids(&node.content));
    }
    ids
}
