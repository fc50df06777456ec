//! Column/Cell Nesting Manager
//!
//! Handles drops whose target is a column cell rather than a top-level
//! position, and keeps every column's cell structure consistent:
//!
//! - a column has either no row (all cells drawn as placeholders) or a single
//!   `columnRow` holding exactly `columnsCount` cells
//! - cell `index` attributes are `0..columnsCount` in order and `columnId`
//!   points back at the owning column
//! - `isEditorMode` is `true` exactly when the cell has content
//!
//! All changes for one drop, including the reconciliation pass, go into a
//! single transaction.

use serde_json::Value;

use crate::document::{Doc, DocumentAdapter, DocumentError, Transaction};
use crate::drag::{CellTarget, DropError};
use crate::factory::NodeFactory;
use crate::models::{schema, Node, ValidationError};

/// What is being dropped into a cell
#[derive(Debug, Clone)]
pub enum NestSource<'a> {
    /// A freshly built node (palette drop)
    New(Node),
    /// An existing document node, moved by id
    Existing(&'a str),
}

/// Result of a successful drop into a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nested {
    pub node_id: String,
    pub column_id: String,
    pub cell_index: usize,
    /// The nested node holds editable text and should receive the cursor
    pub focus: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NestingManager {
    factory: NodeFactory,
}

impl NestingManager {
    pub fn new(factory: NodeFactory) -> Self {
        Self { factory }
    }

    /// Drop `source` into `target` as one atomic transaction.
    ///
    /// # Errors
    ///
    /// Fails without touching the document when the column or source cannot
    /// be found, the cell index is out of range, the source is a column, or
    /// the adapter rejects the transaction.
    pub fn drop_into_cell(
        &self,
        document: &mut dyn DocumentAdapter,
        source: NestSource<'_>,
        target: &CellTarget,
    ) -> Result<Nested, DropError> {
        let mut tr = document.transaction();
        let nested = self.nest(&mut tr, source, target)?;
        document.dispatch(tr)?;
        tracing::debug!(
            "Nested '{}' into cell {} of column '{}'",
            nested.node_id,
            nested.cell_index,
            nested.column_id
        );
        Ok(nested)
    }

    /// Add the nesting steps to `tr` without dispatching
    pub fn nest(
        &self,
        tr: &mut Transaction,
        source: NestSource<'_>,
        target: &CellTarget,
    ) -> Result<Nested, DropError> {
        let (mut column_pos, columns_count) = locate_column(tr.doc(), &target.column_id)?;
        if target.cell_index as u64 >= columns_count {
            return Err(DropError::InvalidCell {
                column_id: target.column_id.clone(),
                cell_index: target.cell_index,
                columns_count,
            });
        }

        let node = match source {
            NestSource::New(node) => {
                if node.node_type == schema::COLUMN {
                    return Err(DropError::NestedColumn);
                }
                node
            }
            NestSource::Existing(id) => {
                let (pos, existing) = tr
                    .doc()
                    .find_node(id)
                    .ok_or_else(|| DropError::source_not_found(id))?;
                if existing.node_type == schema::COLUMN {
                    return Err(DropError::NestedColumn);
                }
                ensure_movable(tr.doc(), pos, existing)?;

                let size = existing.node_size();
                let copy = schema::node_from_json(existing.to_json())?;
                tr.delete(pos, pos + size)?;

                // Offsets computed before the deletion shift by its size
                if pos < column_pos {
                    column_pos -= size;
                }
                if tr.doc().node_at(column_pos).and_then(Node::id) != Some(target.column_id.as_str()) {
                    tracing::warn!(
                        "Column '{}' moved unexpectedly while removing '{}', relocating",
                        target.column_id,
                        id
                    );
                    column_pos = locate_column(tr.doc(), &target.column_id)?.0;
                }
                copy
            }
        };

        let node_id = node
            .id()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::MissingField(format!("{}.attrs.id", node.node_type)))?;
        let focus = schema::spec(&node.node_type).is_some_and(|spec| spec.text_bearing);

        let has_row = tr
            .doc()
            .node_at(column_pos)
            .and_then(|column| column.content.first())
            .is_some_and(|row| row.node_type == schema::COLUMN_ROW);

        if has_row {
            if target.is_placeholder_cell {
                tracing::debug!(
                    "Column '{}' already has cells, nesting into the existing row",
                    target.column_id
                );
            }
            // Pads missing cells so the target index exists
            reconcile_column(tr, column_pos)?;
            let insert_pos = cell_content_end(tr.doc(), column_pos, target.cell_index)
                .ok_or_else(|| DropError::InvalidCell {
                    column_id: target.column_id.clone(),
                    cell_index: target.cell_index,
                    columns_count,
                })?;
            tr.insert(insert_pos, node)?;
        } else {
            let mut content = Some(node);
            let cells = (0..columns_count as usize)
                .map(|index| {
                    let cell_content = if index == target.cell_index {
                        content.take().into_iter().collect()
                    } else {
                        Vec::new()
                    };
                    self.factory
                        .create_cell(&target.column_id, index, cell_content)
                })
                .collect();
            tr.insert(column_pos + 1, self.factory.create_row(cells))?;
        }

        reconcile_columns(tr)?;

        let (pos, _) = tr
            .doc()
            .find_node(&node_id)
            .ok_or_else(|| DocumentError::node_not_found(node_id.as_str()))?;
        tr.select_node(pos)?;

        Ok(Nested {
            node_id,
            column_id: target.column_id.clone(),
            cell_index: target.cell_index,
            focus,
        })
    }
}

/// Position and clamped `columnsCount` of the column with `column_id`
fn locate_column(doc: &Doc, column_id: &str) -> Result<(usize, u64), DropError> {
    match doc.find_node(column_id) {
        Some((pos, node)) if node.node_type == schema::COLUMN => Ok((pos, columns_count(node))),
        _ => Err(DropError::column_not_found(column_id)),
    }
}

fn columns_count(column: &Node) -> u64 {
    column
        .attr_u64("columnsCount")
        .unwrap_or(schema::MIN_COLUMNS)
        .clamp(schema::MIN_COLUMNS, schema::MAX_COLUMNS)
}

/// Only blocks sitting at the top level or directly in a cell can be moved
pub(crate) fn ensure_movable(doc: &Doc, pos: usize, node: &Node) -> Result<(), DropError> {
    let is_block = schema::spec(&node.node_type).is_some_and(|spec| spec.block);
    let parent_ok = doc
        .parent_at(pos)
        .map_or(true, |parent| parent.node_type == schema::COLUMN_CELL);
    if is_block && parent_ok {
        Ok(())
    } else {
        Err(DropError::NotMovable {
            id: node.id().unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug)]
struct CellInfo {
    pos: usize,
    size: usize,
    empty: bool,
    index: Option<u64>,
    column_id: Option<String>,
    editor_mode: Option<bool>,
}

/// Cells of the column at `column_pos`, `None` when it has no row
fn row_cells(doc: &Doc, column_pos: usize) -> Option<Vec<CellInfo>> {
    let column = doc.node_at(column_pos)?;
    let row = column.content.first()?;
    let mut pos = column_pos + 2;
    let mut cells = Vec::with_capacity(row.content.len());
    for cell in &row.content {
        let size = cell.node_size();
        cells.push(CellInfo {
            pos,
            size,
            empty: cell.content.is_empty(),
            index: cell.attr_u64("index"),
            column_id: cell.attr_str("columnId").map(str::to_string),
            editor_mode: cell.attr_bool("isEditorMode"),
        });
        pos += size;
    }
    Some(cells)
}

/// Position just before the closing token of a cell
fn cell_content_end(doc: &Doc, column_pos: usize, cell_index: usize) -> Option<usize> {
    row_cells(doc, column_pos)?
        .get(cell_index)
        .map(|cell| cell.pos + cell.size - 1)
}

/// Reconcile every column of the transaction's working document.
///
/// Returns the number of steps added; an already consistent document adds
/// none.
pub fn reconcile_columns(tr: &mut Transaction) -> Result<usize, DocumentError> {
    let mut columns = Vec::new();
    tr.doc().descendants(|node, pos| {
        if node.node_type == schema::COLUMN {
            columns.push(pos);
        }
        true
    });

    let before = tr.steps().len();
    // Back to front so fixing one column never shifts another's position
    for pos in columns.into_iter().rev() {
        reconcile_column(tr, pos)?;
    }
    Ok(tr.steps().len() - before)
}

fn reconcile_column(tr: &mut Transaction, column_pos: usize) -> Result<(), DocumentError> {
    let (column_id, declared, mut count) = {
        let column = tr
            .doc()
            .node_at(column_pos)
            .ok_or_else(|| DocumentError::invalid_position(column_pos, "no column here"))?;
        let column_id = column
            .id()
            .ok_or_else(|| ValidationError::MissingField("column.attrs.id".to_string()))?
            .to_string();
        (column_id, column.attr_u64("columnsCount"), columns_count(column))
    };
    let Some(mut cells) = row_cells(tr.doc(), column_pos) else {
        return Ok(());
    };

    // Drop surplus cells from the end while they are empty
    while cells.len() as u64 > count && cells.last().is_some_and(|cell| cell.empty) {
        if let Some(cell) = cells.pop() {
            tr.delete(cell.pos, cell.pos + cell.size)?;
        }
    }
    // Surplus cells with content are kept; the column grows instead
    if cells.len() as u64 > count {
        count = (cells.len() as u64).min(schema::MAX_COLUMNS);
        tracing::warn!(
            "Column '{}' holds {} non-empty cells, widening to {}",
            column_id,
            cells.len(),
            count
        );
    }
    if declared != Some(count) {
        tr.set_node_attr(column_pos, "columnsCount", Value::from(count))?;
    }

    let factory = NodeFactory::new();
    for index in cells.len()..count as usize {
        let row_end = row_cells(tr.doc(), column_pos)
            .and_then(|cells| cells.last().map(|cell| cell.pos + cell.size))
            .unwrap_or(column_pos + 2);
        tr.insert(row_end, factory.create_cell(&column_id, index, Vec::new()))?;
    }

    let cells = row_cells(tr.doc(), column_pos).unwrap_or_default();
    for (index, cell) in cells.iter().enumerate() {
        if cell.index != Some(index as u64) {
            tr.set_node_attr(cell.pos, "index", Value::from(index as u64))?;
        }
        if cell.column_id.as_deref() != Some(column_id.as_str()) {
            tr.set_node_attr(cell.pos, "columnId", Value::String(column_id.clone()))?;
        }
        if cell.editor_mode != Some(!cell.empty) {
            tr.set_node_attr(cell.pos, "isEditorMode", Value::Bool(!cell.empty))?;
        }
    }
    Ok(())
}
