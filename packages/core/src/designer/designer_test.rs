//! Tests for the designer facade
//!
//! Covers:
//! - block insertion with defaults and presets
//! - duplication and removal
//! - autosave, selection and focus side effects of drops
//! - resync behavior around an active drag
//! - teardown

use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use tokio::sync::broadcast;

use super::*;
use crate::document::{Doc, MemoryDocument, Selection};
use crate::drag::{CellRect, ColumnRect, DropError, GeometryError, ItemRect, Rect};
use crate::models::Node;

struct Layout {
    items: Vec<ItemRect>,
    columns: Vec<ColumnRect>,
}

impl LayoutProbe for Layout {
    fn item_rects(&self) -> Result<Vec<ItemRect>, GeometryError> {
        Ok(self.items.clone())
    }

    fn column_rects(&self) -> Result<Vec<ColumnRect>, GeometryError> {
        Ok(self.columns.clone())
    }
}

fn stacked(ids: &[&str]) -> Layout {
    Layout {
        items: ids
            .iter()
            .enumerate()
            .map(|(i, id)| ItemRect {
                id: id.to_string(),
                rect: Rect::new(0.0, i as f64 * 50.0, 600.0, 50.0),
            })
            .collect(),
        columns: Vec::new(),
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn designer_with(nodes: Vec<Node>) -> TemplateDesigner<MemoryDocument> {
    let document = MemoryDocument::new(Doc::from_nodes(nodes).unwrap());
    TemplateDesigner::new(document, DesignerConfig::default()).unwrap()
}

fn drain(rx: &mut broadcast::Receiver<DesignerEvent>) -> Vec<DesignerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn autosaves(events: &[DesignerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, DesignerEvent::AutosaveRequested { .. }))
        .count()
}

/// Let pending events, timers and the following frame run
fn settle<D: DocumentAdapter>(designer: &mut TemplateDesigner<D>) {
    let start = designer.host_now().max(Instant::now());
    designer.tick(start);
    let later = start + Duration::from_secs(1);
    designer.tick(later);
    designer.animation_frame(later);
}

#[test]
fn test_insert_block_appends_and_notifies_once() {
    let mut designer = designer_with(vec![Node::new("divider").with_id("d")]);
    let mut rx = designer.subscribe();

    let id = designer.insert_block("button", None).unwrap();

    let doc = designer.document().doc();
    assert_eq!(doc.top_level_ids(), vec!["d".to_string(), id.clone()]);
    let button = doc.child(1).unwrap();
    assert_eq!(button.attr_str("label"), Some("Button"));
    assert_eq!(button.text_content(), "Button");

    let events = drain(&mut rx);
    assert_eq!(autosaves(&events), 1);
    assert!(events.contains(&DesignerEvent::SelectionChanged { node_id: id }));
}

#[test]
fn test_insert_block_applies_defaults_then_preset() {
    let mut designer = designer_with(Vec::new());
    designer.set_block_defaults(
        "button",
        attrs(json!({"backgroundColor": "#111111", "label": "Default"})),
    );
    designer.register_preset(BlockPreset::new(
        "button",
        "cta",
        attrs(json!({"label": "Buy now"})),
    ));

    designer.insert_block("button", Some("cta")).unwrap();

    let button = designer.document().doc().child(0).unwrap();
    assert_eq!(button.attr_str("label"), Some("Buy now"));
    assert_eq!(button.attr_str("backgroundColor"), Some("#111111"));
    assert_eq!(button.text_content(), "Buy now");
}

#[test]
fn test_insert_block_failures_leave_document_alone() {
    let mut designer = designer_with(Vec::new());
    let mut rx = designer.subscribe();

    assert!(matches!(
        designer.insert_block("carousel", None),
        Err(DesignerError::Factory(_))
    ));
    assert!(matches!(
        designer.insert_block("button", Some("missing")),
        Err(DesignerError::PresetNotFound { .. })
    ));
    assert_eq!(designer.document().version(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_palette_entries_follow_presets() {
    let mut designer = designer_with(Vec::new());
    designer.set_visible_items(vec![
        VisibleItem::block("heading"),
        VisibleItem::preset("button", "cta"),
    ]);
    assert_eq!(designer.palette_entries().len(), 1);

    designer.register_preset(BlockPreset::new("button", "cta", Map::new()));
    assert_eq!(designer.palette_entries().len(), 2);
    assert_eq!(designer.list_presets(Some("button")).len(), 1);

    designer.reset_visible_items();
    assert_eq!(designer.visible_items(), designer.config().visible_items.as_slice());
}

#[test]
fn test_duplicate_block_gets_fresh_id_and_resyncs() {
    let mut designer = designer_with(vec![
        Node::new("heading")
            .with_id("h")
            .with_content(vec![Node::text("Title")]),
        Node::new("divider").with_id("d"),
    ]);
    let mut rx = designer.subscribe();

    let copy = designer.duplicate_block("h").unwrap();
    assert_ne!(copy, "h");
    let ids = designer.document().doc().top_level_ids();
    assert_eq!(ids, vec!["h".to_string(), copy.clone(), "d".to_string()]);
    assert_eq!(designer.document().doc().child(1).unwrap().text_content(), "Title");

    let events = drain(&mut rx);
    assert!(events.contains(&DesignerEvent::NodeDuplicated {
        source_id: "h".to_string(),
        duplicate_id: copy,
    }));
    assert_eq!(autosaves(&events), 1);

    settle(&mut designer);
    assert_eq!(designer.items().len(), 3);
}

#[test]
fn test_remove_block_from_cell_restores_placeholder_flag() {
    let cell = |id: &str, index: u64, content: Vec<Node>| {
        Node::new("columnCell")
            .with_id(id)
            .with_attr("index", json!(index))
            .with_attr("columnId", json!("col"))
            .with_attr("isEditorMode", json!(!content.is_empty()))
            .with_content(content)
    };
    let column = Node::new("column")
        .with_id("col")
        .with_attr("columnsCount", json!(2))
        .with_content(vec![Node::new("columnRow").with_id("row").with_content(vec![
            cell("c0", 0, vec![Node::new("image").with_id("img")]),
            cell("c1", 1, Vec::new()),
        ])]);
    let mut designer = designer_with(vec![column]);

    designer.remove_block("img").unwrap();

    let (_, c0) = designer.document().doc().find_node("c0").unwrap();
    assert!(c0.content.is_empty());
    assert_eq!(c0.attr_bool("isEditorMode"), Some(false));

    assert!(matches!(
        designer.remove_block("c1"),
        Err(DesignerError::NotABlock { .. })
    ));
    assert!(matches!(
        designer.remove_block("img"),
        Err(DesignerError::NodeNotFound { .. })
    ));
}

#[test]
fn test_palette_drop_focuses_text_after_delay() {
    let mut designer = designer_with(vec![Node::new("divider").with_id("d")]);
    let layout = stacked(&["d"]);

    designer
        .start_palette_drag(&VisibleItem::block("heading"), Some(&layout))
        .unwrap();
    assert_eq!(designer.active_drag_type(), Some("heading"));
    designer.drag_move(10.0, 5.0);
    let outcome = designer.drop(DropTarget::Pointer);

    let node_id = outcome.focus_target().unwrap().to_string();
    assert_eq!(designer.document().doc().top_level_ids()[0], node_id);
    assert!(!designer.document().is_focused());

    settle(&mut designer);
    assert!(designer.document().is_focused());
    let (pos, node) = designer.document().doc().find_node(&node_id).unwrap();
    assert_eq!(
        designer.document().selection(),
        Some(&Selection::Cursor {
            pos: pos + node.node_size() - 1
        })
    );
}

#[test]
fn test_focus_is_skipped_when_document_is_destroyed() {
    let mut designer = designer_with(Vec::new());
    designer.insert_block("text", None).unwrap();
    designer.document_mut().destroy();

    settle(&mut designer);
    assert!(!designer.document().is_focused());
    assert!(matches!(
        designer.insert_block("text", None),
        Err(DesignerError::Document(_))
    ));
}

#[test]
fn test_drop_into_empty_column_emits_one_autosave() {
    let column = Node::new("column")
        .with_id("col")
        .with_attr("columnsCount", json!(2));
    let mut designer = designer_with(vec![column]);
    let layout = Layout {
        items: vec![ItemRect {
            id: "col".to_string(),
            rect: Rect::new(0.0, 0.0, 600.0, 100.0),
        }],
        columns: vec![ColumnRect {
            column_id: "col".to_string(),
            rect: Rect::new(0.0, 0.0, 600.0, 100.0),
            cells: vec![
                CellRect {
                    index: 0,
                    rect: Rect::new(0.0, 0.0, 300.0, 100.0),
                    is_placeholder: true,
                },
                CellRect {
                    index: 1,
                    rect: Rect::new(300.0, 0.0, 300.0, 100.0),
                    is_placeholder: true,
                },
            ],
        }],
    };
    let mut rx = designer.subscribe();

    designer
        .start_palette_drag(&VisibleItem::block("image"), Some(&layout))
        .unwrap();
    designer.drag_move(450.0, 50.0);
    assert_eq!(designer.drag_mode(), Some(DragMode::Inner));
    assert!(designer.items().placeholder().is_none());

    let outcome = designer.drop(DropTarget::Pointer);
    assert!(matches!(outcome, DropOutcome::Nested { cell_index: 1, .. }));
    assert_eq!(autosaves(&drain(&mut rx)), 1);
    assert!(designer.drag_state().is_none());
}

#[test]
fn test_resync_during_drag_keeps_placeholder() {
    let mut designer = designer_with(vec![
        Node::new("divider").with_id("a"),
        Node::new("divider").with_id("b"),
    ]);
    let layout = stacked(&["a", "b"]);

    designer
        .start_palette_drag(&VisibleItem::block("spacer"), Some(&layout))
        .unwrap();
    designer.drag_move(10.0, 60.0);
    let placeholder = designer.items().placeholder().unwrap().to_string();

    // an unrelated edit lands while the drag is in progress
    let mut tr = designer.document().transaction();
    tr.insert(0, Node::new("divider").with_id("z")).unwrap();
    designer.document_mut().dispatch(tr).unwrap();
    settle(&mut designer);

    assert_eq!(designer.items().placeholder(), Some(placeholder.as_str()));
    assert_eq!(designer.items().placeholder_count(), 1);
    assert_eq!(designer.items().item_ids(), vec!["z", "a", "b"]);

    designer.cancel_drag();
    settle(&mut designer);
    assert!(designer.items().placeholder().is_none());
}

#[test]
fn test_teardown_is_idempotent_and_final() {
    let mut designer = designer_with(vec![Node::new("divider").with_id("a")]);
    let layout = stacked(&["a"]);
    designer
        .start_palette_drag(&VisibleItem::block("image"), Some(&layout))
        .unwrap();
    designer.drag_move(0.0, 0.0);
    designer.insert_block("heading", None).unwrap();

    designer.teardown();
    designer.teardown();

    assert!(designer.is_torn_down());
    assert!(designer.items().placeholder().is_none());
    assert!(designer.next_deadline().is_none());
    assert_eq!(designer.tick(Instant::now() + Duration::from_secs(5)), 0);
    assert!(matches!(
        designer.insert_block("heading", None),
        Err(DesignerError::TornDown)
    ));
    assert_eq!(designer.drop(DropTarget::End), DropOutcome::NoEffect);
}

#[test]
fn test_edit_work_is_scheduled_from_host_time() {
    let mut designer = designer_with(vec![Node::new("divider").with_id("d")]);
    let host = Instant::now() + Duration::from_secs(3600);
    designer.tick(host);
    assert_eq!(designer.host_now(), host);

    let heading = designer.insert_block("heading", None).unwrap();
    let focus_at = host + designer.config().focus_delay();
    assert_eq!(designer.next_deadline(), Some(focus_at));

    designer.tick(focus_at - Duration::from_millis(1));
    assert!(!designer.document().is_focused());
    designer.tick(focus_at);
    assert!(designer.document().is_focused());
    assert!(designer.document().doc().find_node(&heading).is_some());

    // an earlier instant never moves the clock back
    designer.tick(host);
    assert_eq!(designer.host_now(), focus_at);
}

#[test]
fn test_duplicate_resync_is_scheduled_from_host_time() {
    let mut designer = designer_with(vec![Node::new("divider").with_id("d")]);
    let host = Instant::now() + Duration::from_secs(3600);
    designer.tick(host);

    designer.duplicate_block("d").unwrap();
    assert_eq!(
        designer.next_deadline(),
        Some(host + designer.config().resync_settle_delay())
    );
}

#[test]
fn test_structural_nodes_cannot_be_dragged() {
    let column = Node::new("column")
        .with_id("col")
        .with_attr("columnsCount", json!(2))
        .with_content(vec![Node::new("columnRow").with_id("row").with_content(vec![
            Node::new("columnCell")
                .with_id("c0")
                .with_attr("index", json!(0))
                .with_attr("columnId", json!("col"))
                .with_attr("isEditorMode", json!(true))
                .with_content(vec![Node::new("image").with_id("img")]),
            Node::new("columnCell")
                .with_id("c1")
                .with_attr("index", json!(1))
                .with_attr("columnId", json!("col"))
                .with_attr("isEditorMode", json!(false)),
        ])]);
    let mut designer = designer_with(vec![column]);

    assert!(matches!(
        designer.start_item_drag("c1"),
        Err(DesignerError::Drop(DropError::NotMovable { .. }))
    ));
    assert!(matches!(
        designer.start_item_drag("row"),
        Err(DesignerError::Drop(DropError::NotMovable { .. }))
    ));
    assert!(designer.drag_state().is_none());

    designer.start_item_drag("img").unwrap();
    assert_eq!(designer.active_id(), Some("img"));
}
