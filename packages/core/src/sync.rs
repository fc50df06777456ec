//! Item List Synchronizer
//!
//! Keeps the [`FlatItemList`] in step with the realized view. Every document
//! event (and every "node duplicated" notice) schedules a resync through the
//! shared [`Scheduler`]; a newer request supersedes a pending one. The resync
//! itself runs on the animation frame after the settle delay and samples the
//! rendered top-level ids from the adapter.
//!
//! A failed sample leaves the previous list in place.

use std::time::{Duration, Instant};

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::document::{DocumentAdapter, DocumentError};
use crate::events::DocumentEvent;
use crate::items::FlatItemList;
use crate::scheduler::{Scheduler, Task, TaskSlot};

#[derive(Debug)]
pub struct ItemListSynchronizer {
    events: Option<broadcast::Receiver<DocumentEvent>>,
    settle_delay: Duration,
}

impl ItemListSynchronizer {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            events: None,
            settle_delay,
        }
    }

    /// Subscribe to `document`, replacing any previous subscription
    pub fn attach(&mut self, document: &dyn DocumentAdapter) {
        self.events = Some(document.subscribe());
    }

    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }

    /// Drain pending document events, scheduling one resync if any of them
    /// can change the rendered items. Returns the number of triggering events.
    ///
    /// A `Destroyed` event (or a closed channel) detaches the synchronizer
    /// and cancels the pending resync.
    pub fn pump(&mut self, scheduler: &mut Scheduler, now: Instant) -> usize {
        let Some(events) = self.events.as_mut() else {
            return 0;
        };

        let mut triggers = 0;
        let mut detach = false;
        loop {
            match events.try_recv() {
                Ok(DocumentEvent::Destroyed) => {
                    detach = true;
                    break;
                }
                Ok(event) => {
                    if event.triggers_resync() {
                        triggers += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    // Missed events still mean the view changed
                    tracing::debug!("Item list synchronizer lagged by {} events", skipped);
                    triggers += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    detach = true;
                    break;
                }
            }
        }

        if detach {
            tracing::info!("Document went away, detaching item list synchronizer");
            self.teardown(scheduler);
            return 0;
        }
        if triggers > 0 {
            self.request_resync(scheduler, now);
        }
        triggers
    }

    /// Schedule a resync, superseding any pending one
    pub fn request_resync(&self, scheduler: &mut Scheduler, now: Instant) {
        scheduler.schedule(Task::Resync, self.settle_delay, now);
    }

    /// External "node duplicated" notice
    pub fn notify_node_duplicated(&self, scheduler: &mut Scheduler, now: Instant) {
        if self.is_attached() {
            self.request_resync(scheduler, now);
        }
    }

    /// Replace the real items of `items` with the ids currently rendered.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error when the view cannot be sampled; `items`
    /// is left untouched in that case.
    pub fn resync(
        &self,
        document: &dyn DocumentAdapter,
        items: &mut FlatItemList,
    ) -> Result<usize, DocumentError> {
        if document.is_destroyed() {
            return Err(DocumentError::Destroyed);
        }
        let rendered = document.rendered_item_ids()?;
        items.replace_from_view(rendered);
        tracing::debug!("Resynced flat item list ({} entries)", items.len());
        Ok(items.len())
    }

    /// Unsubscribe and cancel any pending resync
    pub fn teardown(&mut self, scheduler: &mut Scheduler) {
        self.events = None;
        scheduler.cancel(TaskSlot::Resync);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::models::Node;

    const SETTLE: Duration = Duration::from_millis(50);

    fn insert(document: &mut MemoryDocument, id: &str) {
        let end = document.doc().content_size();
        let mut tr = document.transaction();
        tr.insert(end, Node::new("divider").with_id(id)).unwrap();
        document.dispatch(tr).unwrap();
    }

    #[test]
    fn test_events_schedule_a_single_resync() {
        let mut document = MemoryDocument::empty();
        let mut scheduler = Scheduler::new();
        let mut sync = ItemListSynchronizer::new(SETTLE);
        sync.attach(&document);

        insert(&mut document, "a");
        insert(&mut document, "b");

        let now = Instant::now();
        assert!(sync.pump(&mut scheduler, now) >= 2);
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.is_pending(TaskSlot::Resync));
    }

    #[test]
    fn test_resync_replaces_items_from_view() {
        let mut document = MemoryDocument::empty();
        insert(&mut document, "a");
        insert(&mut document, "b");

        let sync = ItemListSynchronizer::new(SETTLE);
        let mut items = FlatItemList::new();
        assert_eq!(sync.resync(&document, &mut items).unwrap(), 2);
        assert_eq!(items.ids(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_failed_resync_keeps_previous_list() {
        let mut document = MemoryDocument::empty();
        insert(&mut document, "a");
        let sync = ItemListSynchronizer::new(SETTLE);
        let mut items = FlatItemList::from_ids(vec!["a".into()]);

        document.unmount_view();
        insert(&mut document, "b");
        assert!(sync.resync(&document, &mut items).is_err());
        assert_eq!(items.ids(), ["a".to_string()]);
    }

    #[test]
    fn test_destroyed_document_detaches() {
        let mut document = MemoryDocument::empty();
        let mut scheduler = Scheduler::new();
        let mut sync = ItemListSynchronizer::new(SETTLE);
        sync.attach(&document);

        insert(&mut document, "a");
        document.destroy();

        assert_eq!(sync.pump(&mut scheduler, Instant::now()), 0);
        assert!(!sync.is_attached());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_teardown_cancels_pending_resync() {
        let mut document = MemoryDocument::empty();
        let mut scheduler = Scheduler::new();
        let mut sync = ItemListSynchronizer::new(SETTLE);
        sync.attach(&document);
        insert(&mut document, "a");
        sync.pump(&mut scheduler, Instant::now());

        sync.teardown(&mut scheduler);
        assert!(scheduler.is_empty());
        sync.notify_node_duplicated(&mut scheduler, Instant::now());
        assert!(scheduler.is_empty());
    }
}
