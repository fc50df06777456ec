//! Template Designer Core
//!
//! Headless block model and drag-and-drop engine for a notification template
//! designer. A template is an ordered tree of typed, uniquely identified
//! blocks (headings, text, images, buttons, multi-column layouts, ...) that
//! a user composes by dragging palette entries into the document, reordering
//! blocks and nesting them into columns.
//!
//! # Architecture
//!
//! - **Adapter-owned document**: the editing engine owns the tree; the core
//!   reads it and mutates it only through atomic transactions
//! - **Frozen geometry**: drop-target rectangles are captured once per drag
//! - **Host-driven scheduling**: deferred resync and focus work runs when the
//!   host calls `tick` and `animation_frame`
//! - **Broadcast events**: document and designer events travel over tokio
//!   broadcast channels
//!
//! # Modules
//!
//! - [`models`] - Node model, block schema and palette entries
//! - [`document`] - Document tree, transactions and the adapter contract
//! - [`factory`] - Node creation with defaults and fresh ids
//! - [`position`] - Item index to document offset conversion
//! - [`sync`] - Flat item list synchronization
//! - [`drag`] - Drag session state machine and hit testing
//! - [`nesting`] - Drops into column cells and cell reconciliation
//! - [`designer`] - The facade used by the hosting UI

pub mod config;
pub mod designer;
pub mod document;
pub mod drag;
pub mod events;
pub mod factory;
pub mod items;
pub mod models;
pub mod nesting;
pub mod palette;
pub mod position;
pub mod registry;
pub mod scheduler;
pub mod sync;

// Re-export commonly used types
pub use config::{ConfigError, DesignerConfig};
pub use designer::{DesignerError, TemplateDesigner};
pub use document::{Doc, DocumentAdapter, DocumentError, MemoryDocument, Transaction};
pub use drag::{DragSource, DropOutcome, DropTarget};
pub use events::{DesignerEvent, DocumentEvent, MutationKind};
pub use factory::{FactoryError, NodeFactory};
pub use items::FlatItemList;
pub use models::*;
pub use registry::{BlockDefaults, BlockPreset, PresetRegistry};
