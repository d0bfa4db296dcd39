//! Breadth-first (heap index) traversal.

use crate::repr::{BreadthFirstTree, ROOT_SLOT};

/// Evaluate a row against a breadth-first tree.
///
/// Starts at slot 1 and moves to `2i` or `2i + 1` until it reaches a leaf.
#[inline]
pub fn evaluate_breadth_first(tree: &BreadthFirstTree, features: &[f32]) -> f32 {
    let nodes = tree.nodes();
    let mut idx = ROOT_SLOT;
    while idx < nodes.len() && nodes[idx].is_split() {
        idx = 2 * idx + usize::from(!nodes[idx].go_left(features));
    }
    // Loaders guarantee every split has in-bounds children.
    nodes.get(idx).map_or(f32::NAN, |n| n.leaf_value)
}
