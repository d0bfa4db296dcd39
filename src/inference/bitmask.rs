//! Branchless evaluation of a full depth-3 tree.
//!
//! All seven split comparisons run at once in one `f32x8` less-than. The
//! resulting lane mask, with bit `k` set when breadth-first internal node `k`
//! routes left, indexes a 128-entry table that maps every possible decision
//! pattern to the leaf it reaches.
//!
//! ```text
//! internal node k:   0 | 1 2 | 3 4 5 6        (breadth-first slot k + 1)
//! leaves:            8 9 10 11 12 13 14 15    (slots, left to right)
//! rule masks:        11 3 17 1 36 4 64 0
//! ```
//!
//! A leaf's rule mask holds the nodes where its path goes left. Only those
//! bits matter: the nodes where the path goes right are exactly the ones an
//! earlier leaf needs set, so taking the first leaf whose rule mask is a subset
//! of the index picks the reached leaf.

use wide::{f32x8, CmpLt};

use crate::error::{ModelError, ShapeError};
use crate::repr::{BreadthFirstTree, ROOT_SLOT};

/// Splits in the supported shape.
pub const NUM_SPLITS: usize = 7;
/// Leaves in the supported shape.
pub const NUM_LEAVES: usize = 8;
/// Breadth-first slots in the supported shape, slot 0 included.
pub const NUM_SLOTS: usize = 16;
/// Table entries, one per 7-bit decision mask.
pub const TABLE_SIZE: usize = 1 << NUM_SPLITS;

const SPLIT_MASK: i32 = (TABLE_SIZE - 1) as i32;

/// Leaf value per decision mask.
pub type LookupTable = [f32; TABLE_SIZE];

/// Check that `tree` is the full depth-3 shape.
fn check_shape(tree: &BreadthFirstTree) -> Result<(), ShapeError> {
    let nodes = tree.nodes();
    if nodes.len() != NUM_SLOTS {
        return Err(ShapeError::SlotCount {
            expected: NUM_SLOTS,
            actual: nodes.len(),
        });
    }
    let splits = nodes[ROOT_SLOT..NUM_LEAVES].iter().filter(|n| n.is_split()).count();
    if splits != NUM_SPLITS {
        return Err(ShapeError::SplitCount {
            expected: NUM_SPLITS,
            actual: splits,
        });
    }
    let leaves = nodes[NUM_LEAVES..].iter().filter(|n| n.is_leaf()).count();
    if leaves != NUM_LEAVES {
        return Err(ShapeError::LeafCount {
            expected: NUM_LEAVES,
            actual: leaves,
        });
    }
    Ok(())
}

/// Rule mask of every leaf, left to right.
fn leaf_rule_masks() -> [u8; NUM_LEAVES] {
    let mut masks = [0u8; NUM_LEAVES];
    for (leaf, mask) in masks.iter_mut().enumerate() {
        let mut slot = NUM_LEAVES + leaf;
        while slot > ROOT_SLOT {
            let parent = slot / 2;
            if slot % 2 == 0 {
                *mask |= 1 << (parent - 1);
            }
            slot = parent;
        }
    }
    masks
}

/// Build the decision-mask table for a full depth-3 tree.
pub fn build_lookup_table(tree: &BreadthFirstTree) -> Result<LookupTable, ModelError> {
    check_shape(tree)?;
    let leaves = &tree.nodes()[NUM_LEAVES..];
    let rules = leaf_rule_masks();

    let mut table = [0.0f32; TABLE_SIZE];
    for (index, entry) in table.iter_mut().enumerate() {
        let index = index as u8;
        // The all-right leaf has an empty rule, so a match always exists.
        let leaf = rules
            .iter()
            .position(|&m| index & m == m)
            .unwrap_or(NUM_LEAVES - 1);
        *entry = leaves[leaf].leaf_value;
    }
    Ok(table)
}

/// Split constants packed into SIMD lanes, plus the lookup table.
///
/// Lane 7 is a placeholder (feature 0, threshold 0.0) whose bit is masked off.
#[derive(Debug, Clone)]
pub struct BitmaskEvaluator {
    feature_indices: [u32; 8],
    thresholds: f32x8,
    default_left_mask: i32,
    table: LookupTable,
}

impl BitmaskEvaluator {
    /// Pack a full depth-3 tree. Any other shape fails with
    /// [`ModelError::UnsupportedShape`].
    pub fn new(tree: &BreadthFirstTree) -> Result<Self, ModelError> {
        let table = build_lookup_table(tree)?;
        let splits = &tree.nodes()[ROOT_SLOT..ROOT_SLOT + NUM_SPLITS];

        let mut feature_indices = [0u32; 8];
        let mut thresholds = [0.0f32; 8];
        let mut default_left_mask = 0i32;
        for (k, node) in splits.iter().enumerate() {
            feature_indices[k] = node.feature_index;
            thresholds[k] = node.split_value;
            if node.default_left {
                default_left_mask |= 1 << k;
            }
        }

        Ok(Self {
            feature_indices,
            thresholds: f32x8::from(thresholds),
            default_left_mask,
            table,
        })
    }

    #[inline]
    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    /// Decision mask for a row: bit `k` set when internal node `k` routes left.
    #[inline]
    pub fn decision_mask(&self, features: &[f32]) -> usize {
        let mut lanes = [0.0f32; 8];
        for (lane, &f) in lanes.iter_mut().zip(&self.feature_indices) {
            *lane = features.get(f as usize).copied().unwrap_or(f32::NAN);
        }
        let values = f32x8::from(lanes);

        let less = values.cmp_lt(self.thresholds).move_mask();
        let missing_left = values.is_nan().move_mask() & self.default_left_mask;
        ((less | missing_left) & SPLIT_MASK) as usize
    }
}

/// Evaluate a row with one SIMD compare and one table lookup.
#[inline]
pub fn evaluate_bitmask(evaluator: &BitmaskEvaluator, features: &[f32]) -> f32 {
    evaluator.table[evaluator.decision_mask(features)]
}
