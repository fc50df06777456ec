//! Document Tree Adapter
//!
//! The designer never owns the editable document. It talks to the editing
//! engine through the [`DocumentAdapter`] trait: read the tree, dispatch
//! atomic transactions, subscribe to change notifications, sample the
//! realized view and check liveness.
//!
//! [`MemoryDocument`] is an in-memory implementation of the same contract.
//! It backs headless use of the designer (the replay tool) and every test.

mod doc;
mod error;
mod memory;
mod transaction;

pub use doc::Doc;
#[cfg(test)]
pub(crate) use doc::collect_ids;
pub use error::DocumentError;
pub use memory::MemoryDocument;
pub use transaction::{Selection, Step, Transaction};

use tokio::sync::broadcast;

use crate::events::DocumentEvent;

/// Contract the designer core requires from the document engine
pub trait DocumentAdapter {
    /// Current committed document
    fn doc(&self) -> &Doc;

    /// Monotonic version, bumped by every content-changing dispatch
    fn version(&self) -> u64;

    /// Start a transaction against the current document
    fn transaction(&self) -> Transaction {
        Transaction::new(self.doc(), self.version())
    }

    /// Apply a transaction atomically
    ///
    /// # Errors
    ///
    /// Fails without touching the document when the editor is destroyed or
    /// read-only, or when the transaction was built on an older version.
    fn dispatch(&mut self, tr: Transaction) -> Result<(), DocumentError>;

    /// Subscribe to document events; dropping the receiver unsubscribes
    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;

    fn selection(&self) -> Option<&Selection>;

    /// Focus the editor and place the text cursor at `pos`
    fn focus_at(&mut self, pos: usize) -> Result<(), DocumentError>;

    /// Ids of the top-level items as currently rendered
    fn rendered_item_ids(&self) -> Result<Vec<String>, DocumentError>;

    fn is_editable(&self) -> bool;

    fn is_destroyed(&self) -> bool;
}
