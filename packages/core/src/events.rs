//! Document and Designer Events
//!
//! Two event streams connect the designer core to the outside world, both
//! delivered over tokio broadcast channels so any number of observers can
//! subscribe without coupling to the emitter:
//!
//! - [`DocumentEvent`] flows from the document adapter into the core. The
//!   item list synchronizer listens to it to know when to resample the view.
//! - [`DesignerEvent`] flows from the core to the hosting UI: autosave
//!   triggers, duplication notices, selection changes and resync results.
//!
//! # Event Flow
//!
//! 1. A drop dispatches one transaction through the adapter
//! 2. The adapter emits `DocumentEvent::Transaction` / `DocumentEvent::Update`
//! 3. The synchronizer schedules a resync and replaces the flat item list
//! 4. The designer emits `DesignerEvent::AutosaveRequested` exactly once

use serde::{Deserialize, Serialize};

/// Events emitted by a document adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Content was (re)loaded wholesale
    Created { version: u64 },

    /// Document content changed
    Update { version: u64 },

    /// Selection or cursor moved
    SelectionUpdate,

    /// A transaction was dispatched (also fires for selection-only ones)
    Transaction { version: u64, steps: usize },

    /// The editor was torn down
    Destroyed,
}

impl DocumentEvent {
    /// Whether this event can change the realized list of top-level items
    pub fn triggers_resync(&self) -> bool {
        !matches!(self, DocumentEvent::Destroyed)
    }

    pub fn event_type(&self) -> &str {
        match self {
            DocumentEvent::Created { .. } => "document:created",
            DocumentEvent::Update { .. } => "document:update",
            DocumentEvent::SelectionUpdate => "document:selection",
            DocumentEvent::Transaction { .. } => "document:transaction",
            DocumentEvent::Destroyed => "document:destroyed",
        }
    }
}

/// What kind of structural change requested an autosave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    Insert,
    Move,
    Nest,
    Duplicate,
    Remove,
}

/// Events emitted by the designer for the hosting UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DesignerEvent {
    /// Serialized content changed; the save pipeline should debounce and persist
    #[serde(rename_all = "camelCase")]
    AutosaveRequested { kind: MutationKind, version: u64 },

    /// A block was duplicated
    #[serde(rename_all = "camelCase")]
    NodeDuplicated { source_id: String, duplicate_id: String },

    /// A node became selected after a structural edit
    #[serde(rename_all = "camelCase")]
    SelectionChanged { node_id: String },

    /// The flat item list was resampled from the view
    #[serde(rename_all = "camelCase")]
    ItemsSynced { count: usize },
}

impl DesignerEvent {
    pub fn event_type(&self) -> &str {
        match self {
            DesignerEvent::AutosaveRequested { .. } => "designer:autosave",
            DesignerEvent::NodeDuplicated { .. } => "designer:duplicated",
            DesignerEvent::SelectionChanged { .. } => "designer:selection",
            DesignerEvent::ItemsSynced { .. } => "designer:synced",
        }
    }
}
