//! Frozen drop-target geometry
//!
//! Reading layout on every pointer move is expensive, so a palette drag
//! captures the bounding boxes of the top-level items and of every column
//! (with its cells) once, at drag-start. The resulting [`GeometrySnapshot`]
//! is a plain value; hit testing against it needs no view at all, which is
//! also what makes the coordinator testable with synthetic rectangles.

use serde::{Deserialize, Serialize};

use super::error::GeometryError;
use crate::items::is_placeholder_id;

/// Axis-aligned rectangle in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Inclusive containment test
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Bounding box of a rendered top-level item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRect {
    pub id: String,
    pub rect: Rect,
}

/// Bounding box of one cell of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub index: usize,
    pub rect: Rect,
    /// The column has no cell structure yet; the cell is drawn as a placeholder
    #[serde(default)]
    pub is_placeholder: bool,
}

/// Bounding box of a column with its cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRect {
    pub column_id: String,
    pub rect: Rect,
    #[serde(default)]
    pub cells: Vec<CellRect>,
}

impl ColumnRect {
    /// First cell containing the point
    pub fn cell_at(&self, x: f64, y: f64) -> Option<&CellRect> {
        self.cells.iter().find(|cell| cell.rect.contains(x, y))
    }

    /// Whether the point is inside the column, excluding `edge_margin`
    /// pixels at its top and bottom
    pub fn contains_inner(&self, x: f64, y: f64, edge_margin: f64) -> bool {
        x >= self.rect.left
            && x <= self.rect.right()
            && y > self.rect.top + edge_margin
            && y < self.rect.bottom() - edge_margin
    }
}

/// Source of layout measurements (the rendered view)
pub trait LayoutProbe {
    /// Rectangles of the rendered top-level items, in any order
    fn item_rects(&self) -> Result<Vec<ItemRect>, GeometryError>;

    /// Rectangles of every rendered column and its cells
    fn column_rects(&self) -> Result<Vec<ColumnRect>, GeometryError>;
}

/// Geometry captured once at drag-start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySnapshot {
    items: Vec<ItemRect>,
    columns: Vec<ColumnRect>,
}

impl GeometrySnapshot {
    /// Measure the view through `probe`
    pub fn capture(probe: &dyn LayoutProbe, rounding: f64) -> Result<Self, GeometryError> {
        let items = probe.item_rects()?;
        let columns = probe.column_rects()?;
        Ok(Self::from_parts(items, columns, rounding))
    }

    /// Build a snapshot from raw rectangles.
    ///
    /// Items are sorted top to bottom. Rectangles whose vertical midpoints
    /// round to the same value (at `rounding` pixel granularity) are
    /// wrappers of the same item and collapse to the first one. Placeholder
    /// ids are ignored.
    pub fn from_parts(items: Vec<ItemRect>, columns: Vec<ColumnRect>, rounding: f64) -> Self {
        let rounding = if rounding > 0.0 { rounding } else { 1.0 };
        let mut seen: Vec<i64> = Vec::with_capacity(items.len());
        let mut unique: Vec<ItemRect> = Vec::with_capacity(items.len());
        for item in items {
            if is_placeholder_id(&item.id) {
                continue;
            }
            let key = (item.rect.mid_y() / rounding).round() as i64;
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            unique.push(item);
        }
        unique.sort_by(|a, b| a.rect.top.total_cmp(&b.rect.top));

        Self {
            items: unique,
            columns,
        }
    }

    pub fn items(&self) -> &[ItemRect] {
        &self.items
    }

    pub fn columns(&self) -> &[ColumnRect] {
        &self.columns
    }

    /// Column whose inner region (edge margins excluded) contains the point
    pub fn column_at(&self, x: f64, y: f64, edge_margin: f64) -> Option<&ColumnRect> {
        self.columns
            .iter()
            .find(|column| column.contains_inner(x, y, edge_margin))
    }

    /// Top-level insertion index for a pointer at `y`.
    ///
    /// The index of the first item whose midpoint is strictly below the
    /// pointer; the number of items when there is none. A pointer exactly on
    /// a midpoint therefore inserts after that item.
    pub fn insertion_index(&self, y: f64) -> usize {
        self.items
            .iter()
            .position(|item| item.rect.mid_y() > y)
            .unwrap_or(self.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, top: f64, height: f64) -> ItemRect {
        ItemRect {
            id: id.to_string(),
            rect: Rect::new(0.0, top, 600.0, height),
        }
    }

    fn column() -> ColumnRect {
        ColumnRect {
            column_id: "col".to_string(),
            rect: Rect::new(0.0, 100.0, 600.0, 100.0),
            cells: vec![
                CellRect {
                    index: 0,
                    rect: Rect::new(0.0, 100.0, 300.0, 100.0),
                    is_placeholder: true,
                },
                CellRect {
                    index: 1,
                    rect: Rect::new(300.0, 100.0, 300.0, 100.0),
                    is_placeholder: true,
                },
            ],
        }
    }

    #[test]
    fn test_items_are_sorted_and_deduplicated() {
        let snapshot = GeometrySnapshot::from_parts(
            vec![
                item("b", 40.0, 40.0),
                item("a", 0.0, 40.0),
                // wrapper of "b" with a slightly different box
                item("b-wrapper", 40.2, 40.0),
                item("x_temp_123", 80.0, 10.0),
            ],
            Vec::new(),
            1.0,
        );
        let ids: Vec<&str> = snapshot.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_insertion_index_ties_go_after() {
        let snapshot = GeometrySnapshot::from_parts(
            vec![item("a", 0.0, 40.0), item("b", 40.0, 40.0)],
            Vec::new(),
            1.0,
        );
        assert_eq!(snapshot.insertion_index(-5.0), 0);
        assert_eq!(snapshot.insertion_index(19.9), 0);
        // exactly on the midpoint of "a"
        assert_eq!(snapshot.insertion_index(20.0), 1);
        assert_eq!(snapshot.insertion_index(59.0), 1);
        assert_eq!(snapshot.insertion_index(500.0), 2);
    }

    #[test]
    fn test_column_edge_margin() {
        let snapshot = GeometrySnapshot::from_parts(Vec::new(), vec![column()], 1.0);
        assert!(snapshot.column_at(100.0, 105.0, 10.0).is_none());
        assert!(snapshot.column_at(100.0, 195.0, 10.0).is_none());
        let column = snapshot.column_at(400.0, 150.0, 10.0).unwrap();
        assert_eq!(column.cell_at(400.0, 150.0).unwrap().index, 1);
        assert!(snapshot.column_at(700.0, 150.0, 10.0).is_none());
    }

    struct BrokenProbe;

    impl LayoutProbe for BrokenProbe {
        fn item_rects(&self) -> Result<Vec<ItemRect>, GeometryError> {
            Err(GeometryError::Unavailable("view not mounted".to_string()))
        }

        fn column_rects(&self) -> Result<Vec<ColumnRect>, GeometryError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_capture_propagates_probe_failure() {
        assert!(GeometrySnapshot::capture(&BrokenProbe, 1.0).is_err());
    }
}
