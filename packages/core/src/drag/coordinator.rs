//! Drag/Drop Coordinator
//!
//! State machine for a single drag gesture:
//!
//! ```text
//! Idle --drag_start--> Dragging(Outer) <--drag_move--> Dragging(Inner)
//!   ^                        |                              |
//!   +------ drop / cancel ---+------------------------------+
//! ```
//!
//! The session is taken out of the coordinator before a drop does any work,
//! so a second drop for the same gesture finds nothing to do. Every drop
//! removes the placeholder, whatever the outcome. Failures are logged and
//! reported as [`DropOutcome::NoEffect`]; the document is only touched by
//! dispatching one complete transaction.

use crate::document::{DocumentAdapter, Transaction};
use crate::events::MutationKind;
use crate::factory::NodeFactory;
use crate::items::FlatItemList;
use crate::models::{schema, Node};
use crate::nesting::{ensure_movable, reconcile_columns, NestSource, NestingManager};
use crate::position::{index_to_offset, index_to_offset_or_end, top_level_index_of};

use super::error::DropError;
use super::geometry::{GeometrySnapshot, LayoutProbe};
use super::session::{DragMode, DragSession, DragState};
use super::target::{CellTarget, DragSource, DropTarget, Edge, ResolvedTarget};

/// Effect of a pointer move on the drag state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveUpdate {
    /// No palette drag in progress
    Ignored,
    /// Outer mode, placeholder moved to `index`
    Placeholder { index: usize, id: String },
    /// Inner mode over a column; `cell` is `None` between cells
    Cell { cell: Option<CellTarget> },
    /// Nothing changed since the previous move
    Unchanged,
}

/// What a drop did to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Palette block inserted at a top-level index
    Inserted {
        node_id: String,
        index: usize,
        focus: bool,
    },
    /// Existing block moved to a top-level index (index in the new document)
    Moved { node_id: String, index: usize },
    /// Block placed inside a column cell
    Nested {
        node_id: String,
        column_id: String,
        cell_index: usize,
        focus: bool,
    },
    /// Reorder onto its own position
    Unchanged,
    /// Nothing happened: no session, or the drop failed
    NoEffect,
}

impl DropOutcome {
    /// Kind of structural change, `None` when the document is unchanged
    pub fn mutation_kind(&self) -> Option<MutationKind> {
        match self {
            Self::Inserted { .. } => Some(MutationKind::Insert),
            Self::Moved { .. } => Some(MutationKind::Move),
            Self::Nested { .. } => Some(MutationKind::Nest),
            Self::Unchanged | Self::NoEffect => None,
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Inserted { node_id, .. }
            | Self::Moved { node_id, .. }
            | Self::Nested { node_id, .. } => Some(node_id),
            Self::Unchanged | Self::NoEffect => None,
        }
    }

    /// Node that should receive the cursor once the view settles
    pub fn focus_target(&self) -> Option<&str> {
        match self {
            Self::Inserted {
                node_id,
                focus: true,
                ..
            }
            | Self::Nested {
                node_id,
                focus: true,
                ..
            } => Some(node_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragCoordinator {
    session: Option<DragSession>,
    edge_margin: f64,
    rounding: f64,
    factory: NodeFactory,
    nesting: NestingManager,
}

impl DragCoordinator {
    pub fn new(edge_margin: f64, rounding: f64) -> Self {
        let factory = NodeFactory::new();
        Self {
            session: None,
            edge_margin,
            rounding,
            factory,
            nesting: NestingManager::new(factory),
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> Option<DragState> {
        self.session.as_ref().map(DragState::from)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.session.as_ref().map(DragSession::active_id)
    }

    pub fn active_drag_type(&self) -> Option<&str> {
        self.session.as_ref().and_then(DragSession::active_drag_type)
    }

    pub fn mode(&self) -> Option<DragMode> {
        self.session.as_ref().map(DragSession::mode)
    }

    /// Begin a gesture, replacing any stale session.
    ///
    /// Palette drags freeze the view geometry through `probe`. Without a
    /// probe, or when measuring fails, the session has no geometry: pointer
    /// moves then produce no candidate target and only an explicit drop
    /// target can complete the gesture.
    pub fn drag_start(
        &mut self,
        source: DragSource,
        probe: Option<&dyn LayoutProbe>,
        items: &mut FlatItemList,
    ) {
        if let Some(stale) = self.session.take() {
            tracing::debug!("Discarding stale drag session for '{}'", stale.active_id);
            items.remove_placeholder();
        }

        let geometry = match (source.is_palette(), probe) {
            (true, Some(probe)) => match GeometrySnapshot::capture(probe, self.rounding) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    tracing::warn!("Failed to measure drop targets: {}", e);
                    None
                }
            },
            _ => None,
        };

        let session = DragSession::new(source, geometry);
        tracing::debug!("Drag started for '{}'", session.active_id);
        self.session = Some(session);
    }

    /// Track the pointer during a palette drag.
    ///
    /// Inside a column (edge margins excluded) the session switches to inner
    /// mode and the placeholder is removed. Elsewhere the placeholder is
    /// moved to the pointer's insertion index when that index changed.
    /// Without measured geometry nothing changes.
    pub fn drag_move(
        &mut self,
        x: f64,
        y: f64,
        items: &mut FlatItemList,
        timestamp_ms: i64,
    ) -> MoveUpdate {
        let Some(session) = self.session.as_mut() else {
            return MoveUpdate::Ignored;
        };
        if !session.source.is_palette() {
            return MoveUpdate::Ignored;
        }
        let Some(geometry) = session.geometry.as_ref() else {
            // No measured targets: leave the placeholder where it is
            return MoveUpdate::Unchanged;
        };

        if let Some(column) = geometry.column_at(x, y, self.edge_margin) {
            let cell = column.cell_at(x, y).map(|cell| CellTarget {
                column_id: column.column_id.clone(),
                cell_index: cell.index,
                is_placeholder_cell: cell.is_placeholder,
            });
            let changed = session.mode != DragMode::Inner || session.target_cell != cell;
            if session.mode != DragMode::Inner {
                tracing::debug!("Pointer entered column '{}'", column.column_id);
            }
            session.mode = DragMode::Inner;
            session.last_placeholder_index = None;
            session.target_cell = cell.clone();
            items.remove_placeholder();
            return if changed {
                MoveUpdate::Cell { cell }
            } else {
                MoveUpdate::Unchanged
            };
        }

        session.mode = DragMode::Outer;
        session.target_cell = None;
        let index = geometry.insertion_index(y);
        if session.last_placeholder_index == Some(index) && items.placeholder().is_some() {
            return MoveUpdate::Unchanged;
        }
        let id = items.set_placeholder(index, &session.active_id, timestamp_ms);
        session.last_placeholder_index = Some(index);
        MoveUpdate::Placeholder { index, id }
    }

    /// End the gesture without touching the document. Safe to call at any time.
    pub fn cancel(&mut self, items: &mut FlatItemList) {
        items.remove_placeholder();
        if let Some(session) = self.session.take() {
            tracing::debug!("Drag cancelled for '{}'", session.active_id);
        }
    }

    /// Complete the gesture on `target`.
    ///
    /// The session and the placeholder are cleared before anything else
    /// happens. Resolution or mutation failures are logged and reported as
    /// [`DropOutcome::NoEffect`] with the document untouched.
    pub fn drop(
        &mut self,
        target: DropTarget,
        document: &mut dyn DocumentAdapter,
        items: &mut FlatItemList,
    ) -> DropOutcome {
        let session = self.session.take();
        items.remove_placeholder();
        let Some(session) = session else {
            tracing::debug!("Drop without an active drag session");
            return DropOutcome::NoEffect;
        };

        match self.execute(&session, target, document) {
            Ok(outcome) => {
                tracing::debug!("Drop for '{}' finished: {:?}", session.active_id, outcome);
                outcome
            }
            Err(e) => {
                tracing::warn!("Drop for '{}' had no effect: {}", session.active_id, e);
                DropOutcome::NoEffect
            }
        }
    }

    fn execute(
        &self,
        session: &DragSession,
        target: DropTarget,
        document: &mut dyn DocumentAdapter,
    ) -> Result<DropOutcome, DropError> {
        let target = resolve_target(session, target, document)?;
        match (&session.source, target) {
            (
                DragSource::Palette {
                    block_type, attrs, ..
                },
                ResolvedTarget::TopLevel(index),
            ) => self.insert_new(document, block_type, attrs, index),
            (
                DragSource::Palette {
                    block_type, attrs, ..
                },
                ResolvedTarget::Cell(cell),
            ) => {
                let node = self
                    .factory
                    .create_node(block_type, Some(attrs.clone()), None)?;
                let nested =
                    self.nesting
                        .drop_into_cell(document, NestSource::New(node), &cell)?;
                Ok(nested.into())
            }
            (DragSource::DocumentItem { node_id }, ResolvedTarget::TopLevel(index)) => {
                move_item(document, node_id, index)
            }
            (DragSource::DocumentItem { node_id }, ResolvedTarget::Cell(cell)) => {
                let nested =
                    self.nesting
                        .drop_into_cell(document, NestSource::Existing(node_id), &cell)?;
                Ok(nested.into())
            }
        }
    }

    fn insert_new(
        &self,
        document: &mut dyn DocumentAdapter,
        block_type: &str,
        attrs: &serde_json::Map<String, serde_json::Value>,
        index: usize,
    ) -> Result<DropOutcome, DropError> {
        let node = self
            .factory
            .create_node(block_type, Some(attrs.clone()), None)?;
        let node_id = node.id().unwrap_or_default().to_string();
        let focus = schema::spec(&node.node_type).is_some_and(|spec| spec.text_bearing);

        let index = index.min(document.doc().child_count());
        let pos = index_to_offset_or_end(&*document, index as isize);
        let mut tr = document.transaction();
        tr.insert(pos, node)?;
        tr.select_node(pos)?;
        document.dispatch(tr)?;

        Ok(DropOutcome::Inserted {
            node_id,
            index,
            focus,
        })
    }
}

impl From<crate::nesting::Nested> for DropOutcome {
    fn from(nested: crate::nesting::Nested) -> Self {
        Self::Nested {
            node_id: nested.node_id,
            column_id: nested.column_id,
            cell_index: nested.cell_index,
            focus: nested.focus,
        }
    }
}

/// Turn declared target data into a top-level index or a cell.
///
/// An explicit item edge wins; `Pointer` falls back to whatever the last
/// pointer move recorded.
fn resolve_target(
    session: &DragSession,
    target: DropTarget,
    document: &dyn DocumentAdapter,
) -> Result<ResolvedTarget, DropError> {
    let doc = document.doc();
    match target {
        DropTarget::Item { id, edge } => {
            let index = top_level_index_of(doc, &id).ok_or_else(|| DropError::target_not_found(id))?;
            Ok(ResolvedTarget::TopLevel(match edge {
                Edge::Before => index,
                Edge::After => index + 1,
            }))
        }
        DropTarget::Cell(cell) => Ok(ResolvedTarget::Cell(cell)),
        DropTarget::End => Ok(ResolvedTarget::TopLevel(doc.child_count())),
        DropTarget::Pointer => match (session.mode, &session.target_cell, session.last_placeholder_index) {
            (DragMode::Inner, Some(cell), _) => Ok(ResolvedTarget::Cell(cell.clone())),
            (DragMode::Outer, _, Some(index)) => Ok(ResolvedTarget::TopLevel(index)),
            _ => Err(DropError::NoTarget),
        },
    }
}

/// Move an existing block to before the top-level item at `target_index`
/// (an index into the document before the move).
///
/// The node is re-inserted from its serialized form, so its id and content
/// survive. For a top-level source at `i`, targets `i` and `i + 1` are
/// no-ops; moving down lands one slot earlier than the target index because
/// the source no longer precedes it.
fn move_item(
    document: &mut dyn DocumentAdapter,
    node_id: &str,
    target_index: usize,
) -> Result<DropOutcome, DropError> {
    let doc = document.doc();
    let target_index = target_index.min(doc.child_count());
    let (from_pos, source) = doc
        .find_node(node_id)
        .ok_or_else(|| DropError::source_not_found(node_id))?;
    ensure_movable(doc, from_pos, source)?;
    let size = source.node_size();
    let serialized = source.to_json();

    let mut tr = document.transaction();
    let final_index = match top_level_index_of(doc, node_id) {
        Some(from_index) => {
            if target_index == from_index || target_index == from_index + 1 {
                tracing::debug!("Reorder of '{}' onto itself is a no-op", node_id);
                return Ok(DropOutcome::Unchanged);
            }
            let target_pos = index_to_offset(doc, target_index as isize);
            if target_index > from_index {
                // Moving down: the target offset sits after the source
                reinsert(&mut tr, from_pos, size, target_pos - size, serialized)?;
                target_index - 1
            } else {
                // Moving up: the target offset precedes the source and stays valid
                reinsert(&mut tr, from_pos, size, target_pos, serialized)?;
                target_index
            }
        }
        None => {
            // Nested in a cell: top-level offsets before the column are
            // unaffected, later ones shift by the removed size
            let target_pos = index_to_offset(doc, target_index as isize);
            let insert_pos = if target_pos > from_pos {
                target_pos - size
            } else {
                target_pos
            };
            reinsert(&mut tr, from_pos, size, insert_pos, serialized)?;
            reconcile_columns(&mut tr)?;
            target_index
        }
    };

    document.dispatch(tr)?;
    Ok(DropOutcome::Moved {
        node_id: node_id.to_string(),
        index: final_index,
    })
}

fn reinsert(
    tr: &mut Transaction,
    from: usize,
    size: usize,
    to: usize,
    serialized: serde_json::Value,
) -> Result<(), DropError> {
    let node: Node = schema::node_from_json(serialized)?;
    tr.delete(from, from + size)?;
    tr.insert(to, node)?;
    Ok(())
}
