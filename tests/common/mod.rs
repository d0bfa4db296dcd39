//! Tree and row generators for integration tests.
//!
//! For fixtures and assertion helpers, use `fast_tree::testing`.

#![allow(dead_code)]

use proptest::prelude::*;

use fast_tree::io::{DumpNode, TreeDump};
use fast_tree::repr::NodeId;
use fast_tree::SplitCondition;

#[allow(unused_imports)]
pub use fast_tree::assert_bits_eq;
#[allow(unused_imports)]
pub use fast_tree::testing::{
    canonical_depth_three, row_for_path, CANONICAL_DUMP, CANONICAL_LEAVES, CANONICAL_NUM_FEATURES,
    STUMP_DUMP,
};

/// Features read by generated trees.
pub const NUM_FEATURES: usize = 6;

// =============================================================================
// Tree Generation
// =============================================================================

/// One node decision, consumed in preorder while growing a tree.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub feature: u32,
    pub threshold: f32,
    pub default_left: bool,
    /// Grow a split here (when depth allows) unless zero.
    pub grow: u8,
    pub leaf_value: f32,
}

fn step() -> impl Strategy<Value = Step> {
    (
        0..NUM_FEATURES as u32,
        -2.0f32..2.0,
        any::<bool>(),
        0u8..4,
        -5.0f32..5.0,
    )
        .prop_map(|(feature, threshold, default_left, grow, leaf_value)| Step {
            feature,
            threshold,
            default_left,
            grow,
            leaf_value,
        })
}

/// Grow a dump from `steps`. Node ids are assigned in creation order, so they
/// are neither breadth-first nor preorder positions.
pub fn grow_dump(steps: &[Step], max_depth: usize) -> TreeDump {
    fn grow(
        dump: &mut TreeDump,
        steps: &mut std::slice::Iter<'_, Step>,
        next_id: &mut NodeId,
        id: NodeId,
        depth: usize,
        max_depth: usize,
    ) {
        match steps.next() {
            Some(s) if depth < max_depth && s.grow != 0 => {
                let (yes, no) = (*next_id, *next_id + 1);
                *next_id += 2;
                let condition = SplitCondition::new(s.feature, s.threshold, s.default_left);
                dump.insert(id, DumpNode::Split { condition, yes, no }).unwrap();
                grow(dump, steps, next_id, yes, depth + 1, max_depth);
                grow(dump, steps, next_id, no, depth + 1, max_depth);
            }
            Some(s) => dump.insert(id, DumpNode::Leaf(s.leaf_value)).unwrap(),
            None => dump.insert(id, DumpNode::Leaf(0.0)).unwrap(),
        }
    }

    let mut dump = TreeDump::new();
    let mut next_id = 1;
    grow(&mut dump, &mut steps.iter(), &mut next_id, 0, 0, max_depth);
    dump
}

/// Arbitrary trees up to `max_depth`, as dump text.
pub fn arb_dump_text(max_depth: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(step(), 1..64).prop_map(move |steps| grow_dump(&steps, max_depth).to_text())
}

/// Full depth-3 trees (7 splits, 8 leaves), as dump text.
pub fn arb_full_depth_three() -> impl Strategy<Value = String> {
    prop::collection::vec(step(), 15).prop_map(|mut steps| {
        // Every node above depth 3 splits; the eight at depth 3 become leaves.
        for s in &mut steps {
            s.grow = 1;
        }
        grow_dump(&steps, 3).to_text()
    })
}

// =============================================================================
// Row Generation
// =============================================================================

/// Rows with roughly one value in four missing.
pub fn arb_row() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(
        prop_oneof![
            3 => -3.0f32..3.0,
            1 => Just(f32::NAN),
        ],
        NUM_FEATURES,
    )
}
