//! Atomic document transactions
//!
//! A [`Transaction`] owns a working copy of the document it was started from.
//! Every step is applied to that copy immediately, so later steps (and the
//! code building them) see positions in the already-updated tree, the same
//! way an editor transaction maps positions through its steps.
//!
//! Nothing reaches the live document until the transaction is dispatched
//! through a [`DocumentAdapter`](super::DocumentAdapter). A step that fails
//! leaves the working copy untouched and the caller simply drops the
//! transaction, so a partially-built mutation is never observable.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Doc, DocumentError};
use crate::models::Node;

/// A single recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    Insert { pos: usize, node: Node },
    Delete { from: usize, to: usize },
    ReplaceWith { from: usize, to: usize, node: Node },
    SetNodeAttrs { pos: usize, attrs: Map<String, Value> },
    SetNodeAttr { pos: usize, key: String, value: Value },
}

/// Selection applied together with a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    /// A whole node is selected
    Node { pos: usize },
    /// A collapsed text cursor
    Cursor { pos: usize },
}

impl Selection {
    pub fn pos(&self) -> usize {
        match self {
            Self::Node { pos } | Self::Cursor { pos } => *pos,
        }
    }
}

/// A batch of steps applied to a working copy of the document
#[derive(Debug, Clone)]
pub struct Transaction {
    base_version: u64,
    doc: Doc,
    steps: Vec<Step>,
    selection: Option<Selection>,
}

impl Transaction {
    /// Start a transaction on `doc`, which is at `base_version`
    pub fn new(doc: &Doc, base_version: u64) -> Self {
        Self {
            base_version,
            doc: doc.clone(),
            steps: Vec::new(),
            selection: None,
        }
    }

    /// The working document, including every step applied so far
    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn insert(&mut self, pos: usize, node: Node) -> Result<&mut Self, DocumentError> {
        self.doc.insert(pos, node.clone())?;
        self.steps.push(Step::Insert { pos, node });
        Ok(self)
    }

    /// Delete whole nodes between two sibling boundaries, returning them
    pub fn delete(&mut self, from: usize, to: usize) -> Result<Vec<Node>, DocumentError> {
        let removed = self.doc.delete(from, to)?;
        if from != to {
            self.steps.push(Step::Delete { from, to });
        }
        Ok(removed)
    }

    pub fn replace_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, DocumentError> {
        self.doc.replace_with(from, to, node.clone())?;
        self.steps.push(Step::ReplaceWith { from, to, node });
        Ok(self)
    }

    /// Replace a node's attributes (its `id` is kept when `attrs` has none)
    pub fn set_node_attrs(&mut self, pos: usize, attrs: Map<String, Value>) -> Result<&mut Self, DocumentError> {
        self.doc.set_node_attrs(pos, attrs.clone())?;
        self.steps.push(Step::SetNodeAttrs { pos, attrs });
        Ok(self)
    }

    pub fn set_node_attr(&mut self, pos: usize, key: &str, value: Value) -> Result<&mut Self, DocumentError> {
        self.doc.set_node_attr(pos, key, value.clone())?;
        self.steps.push(Step::SetNodeAttr {
            pos,
            key: key.to_string(),
            value,
        });
        Ok(self)
    }

    /// Select the node starting at `pos` once the transaction is applied
    pub fn select_node(&mut self, pos: usize) -> Result<&mut Self, DocumentError> {
        if self.doc.node_at(pos).is_none() {
            return Err(DocumentError::invalid_position(pos, "no node to select"));
        }
        self.selection = Some(Selection::Node { pos });
        Ok(self)
    }

    pub(crate) fn into_parts(self) -> (Doc, Vec<Step>, Option<Selection>) {
        (self.doc, self.steps, self.selection)
    }
}
