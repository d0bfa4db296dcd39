//! Preorder traversal.

use crate::repr::PreorderTree;

/// Evaluate a row against a preorder tree.
///
/// Going left advances the cursor by one; going right skips the left subtree
/// using the node's `right_offset`.
#[inline]
pub fn evaluate_preorder(tree: &PreorderTree, features: &[f32]) -> f32 {
    let nodes = tree.nodes();
    let mut pos = 0usize;
    while nodes[pos].is_split() {
        let node = &nodes[pos];
        pos += if node.go_left(features) {
            1
        } else {
            node.right_offset as usize
        };
    }
    nodes[pos].leaf_value
}
