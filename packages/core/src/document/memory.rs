//! In-memory document adapter

use serde_json::Value;
use tokio::sync::broadcast;

use super::{Doc, DocumentAdapter, DocumentError, Selection, Transaction};
use crate::events::DocumentEvent;
use crate::models::ValidationError;

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Document adapter holding the tree in memory.
///
/// The rendered view is the committed document itself, so
/// `rendered_item_ids` returns the top-level ids as long as the view is
/// mounted.
#[derive(Debug)]
pub struct MemoryDocument {
    doc: Doc,
    version: u64,
    selection: Option<Selection>,
    focused: bool,
    editable: bool,
    destroyed: bool,
    view_mounted: bool,
    events: broadcast::Sender<DocumentEvent>,
}

impl MemoryDocument {
    pub fn new(doc: Doc) -> Self {
        Self::with_capacity(doc, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(doc: Doc, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            doc,
            version: 0,
            selection: None,
            focused: false,
            editable: true,
            destroyed: false,
            view_mounted: true,
            events,
        }
    }

    pub fn empty() -> Self {
        Self::new(Doc::empty())
    }

    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        Ok(Self::new(Doc::from_json(value)?))
    }

    pub fn to_json(&self) -> Value {
        self.doc.to_json()
    }

    /// Replace the whole content (e.g. loading a saved template)
    pub fn load(&mut self, doc: Doc) -> Result<(), DocumentError> {
        if self.destroyed {
            return Err(DocumentError::Destroyed);
        }
        self.doc = doc;
        self.version += 1;
        self.selection = None;
        self.emit(DocumentEvent::Created {
            version: self.version,
        });
        self.emit(DocumentEvent::Update {
            version: self.version,
        });
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
        self.emit(DocumentEvent::SelectionUpdate);
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Detach the rendered view; sampling fails until it is mounted again
    pub fn unmount_view(&mut self) {
        self.view_mounted = false;
    }

    pub fn mount_view(&mut self) {
        self.view_mounted = true;
    }

    /// Tear the editor down; every later dispatch or focus request fails
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.focused = false;
        self.emit(DocumentEvent::Destroyed);
    }

    fn emit(&self, event: DocumentEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl DocumentAdapter for MemoryDocument {
    fn doc(&self) -> &Doc {
        &self.doc
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn dispatch(&mut self, tr: Transaction) -> Result<(), DocumentError> {
        if self.destroyed {
            return Err(DocumentError::Destroyed);
        }
        if !self.editable {
            return Err(DocumentError::NotEditable);
        }
        if tr.base_version() != self.version {
            return Err(DocumentError::StaleTransaction {
                base_version: tr.base_version(),
                current_version: self.version,
            });
        }

        let (doc, steps, selection) = tr.into_parts();
        let changed = !steps.is_empty();
        if changed {
            self.doc = doc;
            self.version += 1;
        }
        tracing::debug!(
            "Dispatched transaction with {} step(s), version {}",
            steps.len(),
            self.version
        );

        self.emit(DocumentEvent::Transaction {
            version: self.version,
            steps: steps.len(),
        });
        if let Some(selection) = selection {
            self.selection = Some(selection);
            self.emit(DocumentEvent::SelectionUpdate);
        }
        if changed {
            self.emit(DocumentEvent::Update {
                version: self.version,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn focus_at(&mut self, pos: usize) -> Result<(), DocumentError> {
        if self.destroyed {
            return Err(DocumentError::Destroyed);
        }
        let size = self.doc.content_size();
        if pos > size {
            return Err(DocumentError::out_of_range(pos, size));
        }
        self.selection = Some(Selection::Cursor { pos });
        self.focused = true;
        self.emit(DocumentEvent::SelectionUpdate);
        Ok(())
    }

    fn rendered_item_ids(&self) -> Result<Vec<String>, DocumentError> {
        if self.destroyed {
            return Err(DocumentError::Destroyed);
        }
        if !self.view_mounted {
            return Err(DocumentError::ViewUnavailable);
        }
        Ok(self.doc.top_level_ids())
    }

    fn is_editable(&self) -> bool {
        self.editable && !self.destroyed
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;
    use tokio::sync::broadcast::error::TryRecvError;

    fn drain(rx: &mut broadcast::Receiver<DocumentEvent>) -> Vec<DocumentEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    #[test]
    fn test_dispatch_commits_and_notifies() {
        let mut document = MemoryDocument::empty();
        let mut rx = document.subscribe();

        let mut tr = document.transaction();
        tr.insert(0, Node::new("divider").with_id("a")).unwrap();
        tr.select_node(0).unwrap();
        document.dispatch(tr).unwrap();

        assert_eq!(document.version(), 1);
        assert_eq!(document.doc().top_level_ids(), vec!["a"]);
        assert_eq!(document.selection(), Some(&Selection::Node { pos: 0 }));
        assert_eq!(
            drain(&mut rx),
            vec![
                DocumentEvent::Transaction { version: 1, steps: 1 },
                DocumentEvent::SelectionUpdate,
                DocumentEvent::Update { version: 1 },
            ]
        );
    }

    #[test]
    fn test_stale_transaction_is_rejected() {
        let mut document = MemoryDocument::empty();
        let stale = document.transaction();

        let mut tr = document.transaction();
        tr.insert(0, Node::new("divider").with_id("a")).unwrap();
        document.dispatch(tr).unwrap();

        let mut stale = stale;
        stale.insert(0, Node::new("spacer").with_id("b")).unwrap();
        let err = document.dispatch(stale).unwrap_err();
        assert!(matches!(err, DocumentError::StaleTransaction { .. }));
        assert_eq!(document.doc().top_level_ids(), vec!["a"]);
    }

    #[test]
    fn test_destroyed_document_rejects_work() {
        let mut document = MemoryDocument::empty();
        document.destroy();
        document.destroy();

        assert!(document.is_destroyed());
        assert!(!document.is_editable());
        assert!(matches!(
            document.dispatch(document.transaction()),
            Err(DocumentError::Destroyed)
        ));
        assert!(document.focus_at(0).is_err());
        assert!(document.rendered_item_ids().is_err());
    }

    #[test]
    fn test_read_only_document_rejects_dispatch() {
        let mut document = MemoryDocument::empty();
        document.set_editable(false);
        let err = document.dispatch(document.transaction()).unwrap_err();
        assert!(matches!(err, DocumentError::NotEditable));
    }

    #[test]
    fn test_unmounted_view_cannot_be_sampled() {
        let mut document = MemoryDocument::empty();
        document.unmount_view();
        assert!(matches!(
            document.rendered_item_ids(),
            Err(DocumentError::ViewUnavailable)
        ));
        document.mount_view();
        assert!(document.rendered_item_ids().unwrap().is_empty());
    }

    #[test]
    fn test_load_emits_created() {
        let mut document = MemoryDocument::empty();
        let mut rx = document.subscribe();
        let doc = Doc::from_nodes(vec![Node::new("spacer").with_id("s")]).unwrap();
        document.load(doc).unwrap();

        let events = drain(&mut rx);
        assert_eq!(events[0], DocumentEvent::Created { version: 1 });
        assert_eq!(document.rendered_item_ids().unwrap(), vec!["s"]);
    }
}
