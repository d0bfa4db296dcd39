//! Tree evaluators.
//!
//! Each evaluator is a free function over an immutable model and one feature
//! row, returning the leaf value the row reaches:
//!
//! - [`evaluate_breadth_first`]: heap-index walk over a [`BreadthFirstTree`]
//! - [`evaluate_preorder`]: offset walk over a [`PreorderTree`]
//! - [`evaluate_preorder_cover`]: the same walk, counting visited nodes
//! - [`evaluate_bitmask`]: SIMD compare plus table lookup, depth-3 trees only
//!
//! All of them route a split left iff `feature < threshold`, send NaN to the
//! node's default direction, and read feature indices past the end of the row
//! as NaN. For the same dump they return bit-identical results.

use std::fmt;
use std::str::FromStr;

use crate::repr::{BreadthFirstTree, PreorderTree};

pub mod bitmask;
pub mod breadth_first;
pub mod cover;
pub mod preorder;

pub use bitmask::{build_lookup_table, evaluate_bitmask, BitmaskEvaluator, LookupTable};
pub use breadth_first::evaluate_breadth_first;
pub use cover::{
    evaluate_preorder_cover, evaluate_preorder_cover_atomic, AtomicCoverCounts, CoverCounts,
};
pub use preorder::evaluate_preorder;

/// A stateless evaluator: one row in, one prediction out.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, features: &[f32]) -> f32;
}

impl Evaluator for BreadthFirstTree {
    #[inline]
    fn evaluate(&self, features: &[f32]) -> f32 {
        evaluate_breadth_first(self, features)
    }
}

impl Evaluator for PreorderTree {
    #[inline]
    fn evaluate(&self, features: &[f32]) -> f32 {
        evaluate_preorder(self, features)
    }
}

impl Evaluator for BitmaskEvaluator {
    #[inline]
    fn evaluate(&self, features: &[f32]) -> f32 {
        evaluate_bitmask(self, features)
    }
}

/// Benchmark selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluatorKind {
    BreadthFirst,
    Preorder,
    PreorderCover,
    /// Closure-compiled baseline.
    Compiled,
    Bitmask,
}

impl EvaluatorKind {
    pub const ALL: [EvaluatorKind; 5] = [
        EvaluatorKind::BreadthFirst,
        EvaluatorKind::Preorder,
        EvaluatorKind::PreorderCover,
        EvaluatorKind::Compiled,
        EvaluatorKind::Bitmask,
    ];

    /// Canonical benchmark name.
    pub fn name(self) -> &'static str {
        match self {
            EvaluatorKind::BreadthFirst => "breadth-first",
            EvaluatorKind::Preorder => "preorder",
            EvaluatorKind::PreorderCover => "preorder-cover",
            EvaluatorKind::Compiled => "treelite",
            EvaluatorKind::Bitmask => "simd",
        }
    }

    /// Whether this evaluator reports per-node cover.
    pub fn tracks_cover(self) -> bool {
        matches!(self, EvaluatorKind::PreorderCover)
    }
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Benchmark name that matches no evaluator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown benchmark `{0}` (expected one of: breadth-first, preorder, preorder-cover, treelite, simd)")]
pub struct UnknownEvaluator(pub String);

impl FromStr for EvaluatorKind {
    type Err = UnknownEvaluator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breadth-first" | "breadth_first" => Ok(EvaluatorKind::BreadthFirst),
            "preorder" => Ok(EvaluatorKind::Preorder),
            "preorder-cover" | "preorder_cover" => Ok(EvaluatorKind::PreorderCover),
            "treelite" | "compiled" => Ok(EvaluatorKind::Compiled),
            "simd" | "bitmask" => Ok(EvaluatorKind::Bitmask),
            _ => Err(UnknownEvaluator(s.to_string())),
        }
    }
}
