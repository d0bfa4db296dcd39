//! Shared fixtures and assertions for unit tests, integration tests and benches.
//!
//! ```ignore
//! use fast_tree::testing::{canonical_depth_three, CANONICAL_DUMP};
//! use fast_tree::assert_bits_eq;
//! ```

use crate::repr::{load_breadth_first, BreadthFirstTree};

// =============================================================================
// Model Fixtures
// =============================================================================

/// Single split on feature 0 at 1.5; missing goes right.
pub const STUMP_DUMP: &str = "\
booster[0]:
0:[f0<1.5] yes=1,no=2,missing=2
\t1:leaf=-1
\t2:leaf=2
";

/// Full depth-3 tree in the shape of the Higgs benchmark model: 7 splits,
/// 8 leaves, mixed missing directions, node ids numbered breadth-first.
pub const CANONICAL_DUMP: &str = "\
booster[0]:
0:[f28<1.5] yes=1,no=2,missing=1,gain=4012.5,cover=62500
\t1:[f0<0.5] yes=3,no=4,missing=4,gain=1220.75,cover=40113
\t\t3:[f4<2.5] yes=7,no=8,missing=7,gain=310.25,cover=21007
\t\t\t7:leaf=-0.0825883001,cover=13220
\t\t\t8:leaf=0.063217625,cover=7787
\t\t4:[f11<-1.25] yes=9,no=10,missing=10,gain=205.5,cover=19106
\t\t\t9:leaf=0.138557851,cover=4511
\t\t\t10:leaf=-0.160050601,cover=14595
\t2:[f13<0.75] yes=5,no=6,missing=5,gain=998.0,cover=22387
\t\t5:[f21<0.125] yes=11,no=12,missing=12,gain=87.125,cover=12001
\t\t\t11:leaf=-0.09623261541,cover=5010
\t\t\t12:leaf=0.0580137558,cover=6991
\t\t6:[f25<3] yes=13,no=14,missing=13,gain=45.5,cover=10386
\t\t\t13:leaf=-0.183263466,cover=3344
\t\t\t14:leaf=-0.0119630694,cover=7042
";

/// Leaf values of [`CANONICAL_DUMP`], left to right.
pub const CANONICAL_LEAVES: [f32; 8] = [
    -0.0825883001,
    0.063217625,
    0.138557851,
    -0.160050601,
    -0.09623261541,
    0.0580137558,
    -0.183263466,
    -0.0119630694,
];

/// Number of features the canonical model reads (highest index is 28).
pub const CANONICAL_NUM_FEATURES: usize = 30;

/// [`CANONICAL_DUMP`] in breadth-first layout.
///
/// # Panics
///
/// Never for the built-in dump.
pub fn canonical_depth_three() -> BreadthFirstTree {
    load_breadth_first(CANONICAL_DUMP).expect("canonical dump is valid")
}

/// A feature row that drives `tree` down the path given by `go_left`, one
/// entry per level, starting at the root. Features the path doesn't read
/// are 0.0.
pub fn row_for_path(tree: &BreadthFirstTree, go_left: &[bool], num_features: usize) -> Vec<f32> {
    let nodes = tree.nodes();
    let mut row = vec![0.0; num_features];
    let mut slot = crate::repr::ROOT_SLOT;
    for &left in go_left {
        let node = &nodes[slot];
        if !node.is_split() {
            break;
        }
        let threshold = node.split_value;
        row[node.feature_index as usize] = if left { threshold - 1.0 } else { threshold + 1.0 };
        slot = 2 * slot + usize::from(!left);
    }
    row
}

// =============================================================================
// Assertions
// =============================================================================

/// Assert two `f32` slices are equal bit for bit.
///
/// Unlike `assert_eq!`, NaN equals NaN and `-0.0` differs from `0.0`.
#[macro_export]
macro_rules! assert_bits_eq {
    ($left:expr, $right:expr) => {{
        let left: &[f32] = &$left;
        let right: &[f32] = &$right;
        assert_eq!(left.len(), right.len(), "length mismatch");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if l.to_bits() != r.to_bits() {
                panic!(
                    "assertion failed: `(left == right)` bitwise at index {}\n  left: `{:?}`\n right: `{:?}`",
                    i, l, r
                );
            }
        }
    }};
}
