//! Position Resolver
//!
//! Converts between logical item indices (positions in the flat list of
//! top-level items) and document offsets.

use crate::document::{Doc, DocumentAdapter};

/// Offset of the boundary before the top-level item at `index`.
///
/// - `index <= 0` resolves to `0`
/// - `index >= child_count` resolves to the end of the document
/// - otherwise the sizes of all top-level children before `index` are summed
///
/// ```rust
/// use template_designer_core::document::Doc;
/// use template_designer_core::models::Node;
/// use template_designer_core::position::index_to_offset;
///
/// let doc = Doc::from_nodes(vec![
///     Node::new("divider").with_id("a"),
///     Node::new("paragraph").with_id("b"),
/// ])
/// .unwrap();
/// assert_eq!(index_to_offset(&doc, -3), 0);
/// assert_eq!(index_to_offset(&doc, 1), 1);
/// assert_eq!(index_to_offset(&doc, 9), 3);
/// ```
pub fn index_to_offset(doc: &Doc, index: isize) -> usize {
    if index <= 0 {
        return 0;
    }
    let index = index as usize;
    if index >= doc.child_count() {
        return doc.content_size();
    }
    doc.children()[..index].iter().map(|node| node.node_size()).sum()
}

/// [`index_to_offset`] against a live adapter.
///
/// A destroyed or still-initializing document degrades to "append at the
/// end" instead of failing the caller's operation.
pub fn index_to_offset_or_end(document: &dyn DocumentAdapter, index: isize) -> usize {
    if document.is_destroyed() {
        tracing::debug!("Resolving index {} on a destroyed document", index);
        return document.doc().content_size();
    }
    index_to_offset(document.doc(), index)
}

/// Index of the top-level item starting at or containing `offset`.
///
/// Offsets at or past the end resolve to `child_count`.
pub fn offset_to_index(doc: &Doc, offset: usize) -> usize {
    doc.top_level_index_at(offset)
        .unwrap_or_else(|| doc.child_count())
}

/// Index of the top-level item with the given id
pub fn top_level_index_of(doc: &Doc, id: &str) -> Option<usize> {
    doc.children().iter().position(|node| node.id() == Some(id))
}
