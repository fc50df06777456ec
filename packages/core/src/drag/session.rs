//! Drag session state
use serde::Serialize;

use super::geometry::GeometrySnapshot;
use super::target::{CellTarget, DragSource};

/// Whether the pointer is over a column's cell region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DragMode {
    #[default]
    Outer,
    Inner,
}

/// Transient state of one drag gesture, from drag-start to drop or cancel
#[derive(Debug, Clone)]
pub struct DragSession {
    pub(crate) source: DragSource,
    pub(crate) active_id: String,
    pub(crate) mode: DragMode,
    pub(crate) last_placeholder_index: Option<usize>,
    pub(crate) target_cell: Option<CellTarget>,
    /// `None` when the view could not be measured at drag-start
    pub(crate) geometry: Option<GeometrySnapshot>,
}

impl DragSession {
    pub(crate) fn new(source: DragSource, geometry: Option<GeometrySnapshot>) -> Self {
        Self {
            active_id: source.active_id(),
            source,
            mode: DragMode::Outer,
            last_placeholder_index: None,
            target_cell: None,
            geometry,
        }
    }

    pub fn source(&self) -> &DragSource {
        &self.source
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active_drag_type(&self) -> Option<&str> {
        self.source.drag_type()
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn last_placeholder_index(&self) -> Option<usize> {
        self.last_placeholder_index
    }

    /// Cell under the pointer while in inner mode
    pub fn target_cell(&self) -> Option<&CellTarget> {
        self.target_cell.as_ref()
    }

    /// Frozen drop-target geometry; `None` if measuring failed or no probe
    /// was given
    pub fn geometry(&self) -> Option<&GeometrySnapshot> {
        self.geometry.as_ref()
    }
}

/// Snapshot of the session for UI highlighting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragState {
    pub active_id: String,
    pub active_drag_type: Option<String>,
    pub mode: DragMode,
}

impl From<&DragSession> for DragState {
    fn from(session: &DragSession) -> Self {
        Self {
            active_id: session.active_id.clone(),
            active_drag_type: session.active_drag_type().map(str::to_string),
            mode: session.mode,
        }
    }
}
