//! Performance benchmarks for template designer hot paths
//!
//! Run with: `cargo bench -p template-designer-core`
//!
//! These benchmarks measure work done on every pointer move or drop:
//! - Index to offset resolution on long templates
//! - Insertion index and column hit testing against a frozen snapshot
//! - A full reorder drop (transaction, dispatch, event broadcast)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use template_designer_core::document::{Doc, MemoryDocument};
use template_designer_core::drag::{
    CellRect, CellTarget, ColumnRect, DragCoordinator, GeometrySnapshot, ItemRect, Rect,
};
use template_designer_core::position::index_to_offset;
use template_designer_core::{DragSource, DropTarget, FlatItemList, Node};

/// Template with `count` top-level blocks of mixed sizes
fn build_doc(count: usize) -> Doc {
    let nodes = (0..count)
        .map(|i| match i % 3 {
            0 => Node::new("heading")
                .with_id(format!("h{i}"))
                .with_content(vec![Node::text(format!("Section {i}"))]),
            1 => Node::new("paragraph")
                .with_id(format!("p{i}"))
                .with_content(vec![Node::text("Lorem ipsum dolor sit amet")]),
            _ => Node::new("divider").with_id(format!("d{i}")),
        })
        .collect();
    Doc::from_nodes(nodes).unwrap()
}

/// Stacked item rectangles plus a two-cell column every tenth row
fn build_snapshot(count: usize) -> GeometrySnapshot {
    let items = (0..count)
        .map(|i| ItemRect {
            id: format!("item-{i}"),
            rect: Rect::new(0.0, i as f64 * 40.0, 600.0, 40.0),
        })
        .collect();
    let columns = (0..count)
        .step_by(10)
        .map(|i| {
            let top = i as f64 * 40.0;
            ColumnRect {
                column_id: format!("item-{i}"),
                rect: Rect::new(0.0, top, 600.0, 40.0),
                cells: vec![
                    CellRect {
                        index: 0,
                        rect: Rect::new(0.0, top, 300.0, 40.0),
                        is_placeholder: false,
                    },
                    CellRect {
                        index: 1,
                        rect: Rect::new(300.0, top, 300.0, 40.0),
                        is_placeholder: false,
                    },
                ],
            }
        })
        .collect();
    GeometrySnapshot::from_parts(items, columns, 1.0)
}

fn bench_index_to_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_to_offset");

    for size in [50usize, 500, 5000] {
        let doc = build_doc(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| black_box(index_to_offset(doc, black_box(size as isize / 2))));
        });
    }

    group.finish();
}

fn bench_hit_testing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_testing");
    let snapshot = build_snapshot(500);

    group.bench_function("insertion_index_500", |b| {
        b.iter(|| black_box(snapshot.insertion_index(black_box(9_990.0))));
    });

    group.bench_function("column_at_500", |b| {
        b.iter(|| black_box(snapshot.column_at(black_box(450.0), black_box(8_020.0), 10.0)));
    });

    group.bench_function("capture_from_parts_500", |b| {
        b.iter(|| black_box(build_snapshot(500)));
    });

    group.finish();
}

fn bench_reorder_drop(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_drop");

    group.bench_function("move_first_to_end_200", |b| {
        b.iter_batched(
            || {
                let document = MemoryDocument::new(build_doc(200));
                let mut items = FlatItemList::from_ids(document.doc().top_level_ids());
                let mut coordinator = DragCoordinator::new(10.0, 1.0);
                coordinator.drag_start(DragSource::document_item("h0"), None, &mut items);
                (document, items, coordinator)
            },
            |(mut document, mut items, mut coordinator)| {
                black_box(coordinator.drop(DropTarget::End, &mut document, &mut items))
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("palette_drop_into_column", |b| {
        b.iter_batched(
            || {
                let column = Node::new("column")
                    .with_id("col")
                    .with_attr("columnsCount", json!(3));
                let mut nodes = build_doc(100).children().to_vec();
                nodes.push(column);
                let document = MemoryDocument::new(Doc::from_nodes(nodes).unwrap());
                let mut items = FlatItemList::from_ids(document.doc().top_level_ids());
                let mut coordinator = DragCoordinator::new(10.0, 1.0);
                coordinator.drag_start(DragSource::palette("image"), None, &mut items);
                (document, items, coordinator)
            },
            |(mut document, mut items, mut coordinator)| {
                let target = DropTarget::Cell(CellTarget::new("col", 2, true));
                black_box(coordinator.drop(target, &mut document, &mut items))
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_index_to_offset,
    bench_hit_testing,
    bench_reorder_drop
);
criterion_main!(benches);
