//! Template Designer facade
//!
//! [`TemplateDesigner`] wires the pieces together around one document
//! adapter: the palette and its attribute sources, the flat item list, the
//! drag coordinator, the synchronizer and the scheduler that runs their
//! deferred work. It is the only API the hosting UI needs.
//!
//! The host drives time explicitly. Work triggered by an edit (resync after
//! a duplicate, focus after an insert) is scheduled from the latest instant
//! the host passed in, or from attach time before the first tick:
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use template_designer_core::config::DesignerConfig;
//! use template_designer_core::designer::TemplateDesigner;
//! use template_designer_core::document::{DocumentAdapter, MemoryDocument};
//!
//! let mut designer =
//!     TemplateDesigner::new(MemoryDocument::empty(), DesignerConfig::default()).unwrap();
//! designer.insert_block("heading", None).unwrap();
//!
//! // picks up the document events and schedules a resync
//! let start = Instant::now();
//! designer.tick(start);
//!
//! // the settle delay elapsed; the resync runs on the next frame
//! let settled = start + Duration::from_millis(200);
//! designer.tick(settled);
//! designer.animation_frame(settled);
//! assert_eq!(designer.items().len(), 1);
//! assert_eq!(designer.document().doc().child_count(), 1);
//! ```

mod error;

#[cfg(test)]
mod designer_test;

pub use error::DesignerError;

use std::time::Instant;

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::config::DesignerConfig;
use crate::document::DocumentAdapter;
use crate::drag::{
    DragCoordinator, DragMode, DragSource, DragState, DropOutcome, DropTarget, LayoutProbe,
    MoveUpdate,
};
use crate::events::{DesignerEvent, MutationKind};
use crate::factory::NodeFactory;
use crate::items::FlatItemList;
use crate::models::{schema, VisibleItem};
use crate::nesting::{ensure_movable, reconcile_columns};
use crate::palette::{ResolvedItem, VisibleItemList};
use crate::position::index_to_offset_or_end;
use crate::registry::{resolve_attributes, BlockDefaults, BlockPreset, PresetRegistry};
use crate::scheduler::{Scheduler, Task};
use crate::sync::ItemListSynchronizer;

pub struct TemplateDesigner<D: DocumentAdapter> {
    config: DesignerConfig,
    document: D,
    palette: VisibleItemList,
    block_defaults: BlockDefaults,
    presets: PresetRegistry,
    factory: NodeFactory,
    items: FlatItemList,
    coordinator: DragCoordinator,
    synchronizer: ItemListSynchronizer,
    scheduler: Scheduler,
    events: broadcast::Sender<DesignerEvent>,
    /// Latest instant the host passed to `tick` or `animation_frame`
    host_now: Instant,
    torn_down: bool,
}

impl<D: DocumentAdapter> TemplateDesigner<D> {
    /// Attach a designer to `document`
    ///
    /// # Errors
    ///
    /// Returns `DesignerError::Config` if `config` fails validation.
    pub fn new(document: D, config: DesignerConfig) -> Result<Self, DesignerError> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.event_capacity);
        let mut synchronizer = ItemListSynchronizer::new(config.resync_settle_delay());
        synchronizer.attach(&document);

        let items = match document.rendered_item_ids() {
            Ok(ids) => FlatItemList::from_ids(ids),
            Err(e) => {
                tracing::debug!("View not ready at startup, item list starts empty: {}", e);
                FlatItemList::new()
            }
        };
        tracing::info!("Template designer attached ({} top-level items)", items.len());

        Ok(Self {
            palette: VisibleItemList::new(config.visible_items.clone()),
            coordinator: DragCoordinator::new(config.column_edge_margin, config.midpoint_rounding),
            config,
            document,
            block_defaults: BlockDefaults::new(),
            presets: PresetRegistry::new(),
            factory: NodeFactory::new(),
            items,
            synchronizer,
            scheduler: Scheduler::new(),
            events,
            host_now: Instant::now(),
            torn_down: false,
        })
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Direct access for edits that bypass the designer (typing, undo).
    /// The resulting document events still reach the synchronizer.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Flat list of top-level item ids, including the drag placeholder
    pub fn items(&self) -> &FlatItemList {
        &self.items
    }

    /// Subscribe to designer events; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<DesignerEvent> {
        self.events.subscribe()
    }

    // Palette

    pub fn visible_items(&self) -> &[VisibleItem] {
        self.palette.get()
    }

    pub fn set_visible_items(&mut self, items: Vec<VisibleItem>) {
        self.palette.set(items);
    }

    pub fn reset_visible_items(&mut self) {
        self.palette.reset();
    }

    /// Palette entries with their presets resolved
    pub fn palette_entries(&self) -> Vec<ResolvedItem<'_>> {
        self.palette.resolve(&self.presets)
    }

    // Block defaults

    pub fn block_defaults(&self, block_type: &str) -> Option<&Map<String, Value>> {
        self.block_defaults.get(block_type)
    }

    pub fn set_block_defaults(&mut self, block_type: &str, attrs: Map<String, Value>) {
        self.block_defaults.set(block_type, attrs);
    }

    pub fn clear_block_defaults(&mut self, block_type: &str) -> bool {
        self.block_defaults.clear(block_type)
    }

    // Presets

    pub fn register_preset(&mut self, preset: BlockPreset) -> Option<BlockPreset> {
        self.presets.register(preset)
    }

    pub fn unregister_preset(&mut self, block_type: &str, key: &str) -> Option<BlockPreset> {
        self.presets.unregister(block_type, key)
    }

    pub fn list_presets(&self, block_type: Option<&str>) -> Vec<&BlockPreset> {
        self.presets.list(block_type)
    }

    /// Attributes a new block of `block_type` would get (defaults, then preset)
    pub fn resolve_block_attrs(
        &self,
        block_type: &str,
        preset_key: Option<&str>,
    ) -> Result<Map<String, Value>, DesignerError> {
        let preset = match preset_key {
            Some(key) => Some(
                self.presets
                    .get(block_type, key)
                    .ok_or_else(|| DesignerError::preset_not_found(block_type, key))?,
            ),
            None => None,
        };
        Ok(resolve_attributes(&self.block_defaults, preset, block_type))
    }

    // Structural edits

    /// Append a block at the end of the document, the same way a palette
    /// drop would create it. Returns the new node id.
    ///
    /// # Errors
    ///
    /// Unknown types and missing presets are logged and returned without
    /// touching the document.
    pub fn insert_block(
        &mut self,
        block_type: &str,
        preset_key: Option<&str>,
    ) -> Result<String, DesignerError> {
        self.ensure_live()?;
        let attrs = self.resolve_block_attrs(block_type, preset_key)?;
        let node = self
            .factory
            .create_node(block_type, Some(attrs), None)
            .map_err(|e| {
                tracing::warn!("Ignoring insert of '{}': {}", block_type, e);
                e
            })?;
        let node_id = node.id().unwrap_or_default().to_string();
        let focus = schema::spec(&node.node_type).is_some_and(|spec| spec.text_bearing);

        let pos = index_to_offset_or_end(&self.document, isize::MAX);
        let mut tr = self.document.transaction();
        tr.insert(pos, node)?;
        tr.select_node(pos)?;
        self.document.dispatch(tr)?;

        tracing::debug!("Inserted '{}' block {}", block_type, node_id);
        self.after_mutation(MutationKind::Insert, Some(&node_id), focus);
        Ok(node_id)
    }

    /// Insert a deep copy of a block right after it. Returns the copy's id.
    pub fn duplicate_block(&mut self, node_id: &str) -> Result<String, DesignerError> {
        self.ensure_live()?;
        let doc = self.document.doc();
        let (pos, node) = doc
            .find_node(node_id)
            .ok_or_else(|| DesignerError::node_not_found(node_id))?;
        ensure_movable(doc, pos, node).map_err(|_| DesignerError::NotABlock {
            id: node_id.to_string(),
        })?;

        let copy = self.factory.duplicate(node);
        let copy_id = copy.id().unwrap_or_default().to_string();
        let copy_pos = pos + node.node_size();

        let mut tr = self.document.transaction();
        tr.insert(copy_pos, copy)?;
        reconcile_columns(&mut tr)?;
        tr.select_node(copy_pos)?;
        self.document.dispatch(tr)?;

        tracing::debug!("Duplicated {} as {}", node_id, copy_id);
        self.emit(DesignerEvent::NodeDuplicated {
            source_id: node_id.to_string(),
            duplicate_id: copy_id.clone(),
        });
        self.synchronizer
            .notify_node_duplicated(&mut self.scheduler, self.host_now);
        self.after_mutation(MutationKind::Duplicate, Some(&copy_id), false);
        Ok(copy_id)
    }

    /// Remove a block; emptied column cells fall back to placeholders
    pub fn remove_block(&mut self, node_id: &str) -> Result<(), DesignerError> {
        self.ensure_live()?;
        let doc = self.document.doc();
        let (pos, node) = doc
            .find_node(node_id)
            .ok_or_else(|| DesignerError::node_not_found(node_id))?;
        ensure_movable(doc, pos, node).map_err(|_| DesignerError::NotABlock {
            id: node_id.to_string(),
        })?;
        let size = node.node_size();

        let mut tr = self.document.transaction();
        tr.delete(pos, pos + size)?;
        reconcile_columns(&mut tr)?;
        self.document.dispatch(tr)?;

        tracing::debug!("Removed block {}", node_id);
        self.after_mutation(MutationKind::Remove, None, false);
        Ok(())
    }

    // Drag and drop

    /// Drag source for a palette entry, with its attributes resolved
    pub fn palette_source(&self, item: &VisibleItem) -> Result<DragSource, DesignerError> {
        let attrs = self.resolve_block_attrs(item.block_type(), item.preset_key())?;
        Ok(DragSource::Palette {
            block_type: item.block_type().to_string(),
            preset_key: item.preset_key().map(str::to_string),
            attrs,
        })
    }

    pub fn drag_start(&mut self, source: DragSource, probe: Option<&dyn LayoutProbe>) {
        if self.torn_down {
            return;
        }
        self.coordinator.drag_start(source, probe, &mut self.items);
    }

    /// Start dragging a palette entry; `probe` measures the current view
    pub fn start_palette_drag(
        &mut self,
        item: &VisibleItem,
        probe: Option<&dyn LayoutProbe>,
    ) -> Result<(), DesignerError> {
        self.ensure_live()?;
        let source = self.palette_source(item)?;
        self.coordinator.drag_start(source, probe, &mut self.items);
        Ok(())
    }

    /// Start dragging an existing block.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` for an unknown id; `Drop(NotMovable)` for structural
    /// nodes (rows, cells, list items) that cannot be dragged on their own.
    pub fn start_item_drag(&mut self, node_id: &str) -> Result<(), DesignerError> {
        self.ensure_live()?;
        let doc = self.document.doc();
        let (pos, node) = doc
            .find_node(node_id)
            .ok_or_else(|| DesignerError::node_not_found(node_id))?;
        ensure_movable(doc, pos, node)?;
        self.coordinator
            .drag_start(DragSource::document_item(node_id), None, &mut self.items);
        Ok(())
    }

    pub fn drag_move(&mut self, x: f64, y: f64) -> MoveUpdate {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        self.coordinator
            .drag_move(x, y, &mut self.items, timestamp_ms)
    }

    /// Finish the current drag; a mutation emits exactly one autosave request
    pub fn drop(&mut self, target: DropTarget) -> DropOutcome {
        if self.torn_down {
            self.coordinator.cancel(&mut self.items);
            return DropOutcome::NoEffect;
        }

        let outcome = self
            .coordinator
            .drop(target, &mut self.document, &mut self.items);
        if let Some(kind) = outcome.mutation_kind() {
            let selected = match &outcome {
                DropOutcome::Inserted { node_id, .. } | DropOutcome::Nested { node_id, .. } => {
                    Some(node_id.as_str())
                }
                _ => None,
            };
            self.after_mutation(kind, selected, outcome.focus_target().is_some());
        }
        outcome
    }

    pub fn cancel_drag(&mut self) {
        self.coordinator.cancel(&mut self.items);
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.coordinator.state()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.coordinator.active_id()
    }

    pub fn active_drag_type(&self) -> Option<&str> {
        self.coordinator.active_drag_type()
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.coordinator.mode()
    }

    // Deferred work

    /// Process document events and run timers due at `now`.
    /// Returns the number of tasks run.
    pub fn tick(&mut self, now: Instant) -> usize {
        if self.torn_down {
            return 0;
        }
        self.advance_clock(now);
        self.synchronizer.pump(&mut self.scheduler, now);
        let due = self.scheduler.take_due(now);
        let count = due.len();
        for task in due {
            self.run_task(task);
        }
        count
    }

    /// Run work waiting for the next animation frame
    pub fn animation_frame(&mut self, now: Instant) -> usize {
        if self.torn_down {
            return 0;
        }
        self.advance_clock(now);
        let ready = self.scheduler.take_frame_tasks();
        let count = ready.len();
        for task in ready {
            self.run_task(task);
        }
        count
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn wants_frame(&self) -> bool {
        self.scheduler.wants_frame()
    }

    /// Cancel scheduled work, drop the placeholder and reset the drag
    /// session. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel_all();
        self.coordinator.cancel(&mut self.items);
        self.synchronizer.teardown(&mut self.scheduler);
        self.torn_down = true;
        tracing::info!("Template designer torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Host time work triggered by edits is scheduled from
    pub fn host_now(&self) -> Instant {
        self.host_now
    }

    fn advance_clock(&mut self, now: Instant) {
        if now > self.host_now {
            self.host_now = now;
        }
    }

    fn ensure_live(&self) -> Result<(), DesignerError> {
        if self.torn_down {
            return Err(DesignerError::TornDown);
        }
        if self.document.is_destroyed() {
            return Err(crate::document::DocumentError::Destroyed.into());
        }
        Ok(())
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Resync => match self.synchronizer.resync(&self.document, &mut self.items) {
                Ok(count) => self.emit(DesignerEvent::ItemsSynced { count }),
                Err(e) => tracing::warn!("Resync failed, keeping previous item list: {}", e),
            },
            Task::Focus { node_id } => self.focus_node(&node_id),
        }
    }

    /// Place the cursor at the end of a text-bearing node. Missing nodes and
    /// destroyed documents are skipped.
    fn focus_node(&mut self, node_id: &str) {
        if self.document.is_destroyed() {
            tracing::debug!("Skipping focus of {}: document destroyed", node_id);
            return;
        }
        let Some((pos, node)) = self.document.doc().find_node(node_id) else {
            tracing::debug!("Skipping focus of {}: node is gone", node_id);
            return;
        };
        if node.is_leaf() {
            return;
        }
        let cursor = pos + node.node_size() - 1;
        if let Err(e) = self.document.focus_at(cursor) {
            tracing::debug!("Skipping focus of {}: {}", node_id, e);
        }
    }

    fn after_mutation(&mut self, kind: MutationKind, selected: Option<&str>, focus: bool) {
        self.emit(DesignerEvent::AutosaveRequested {
            kind,
            version: self.document.version(),
        });
        let Some(node_id) = selected else {
            return;
        };
        self.emit(DesignerEvent::SelectionChanged {
            node_id: node_id.to_string(),
        });
        if focus {
            self.scheduler.schedule(
                Task::Focus {
                    node_id: node_id.to_string(),
                },
                self.config.focus_delay(),
                self.host_now,
            );
        }
    }

    fn emit(&self, event: DesignerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
