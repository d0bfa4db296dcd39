//! fast-tree: inference throughput of decision-tree layouts.
//!
//! Loads a single regression tree from an XGBoost text dump and evaluates it
//! over a batch of feature rows with one of several strategies, so their raw
//! speed can be compared on identical input.
//!
//! # Key Types
//!
//! - [`BreadthFirstTree`] / [`PreorderTree`] - flat node layouts
//! - [`BitmaskEvaluator`] - SIMD compare plus lookup table, depth-3 trees only
//! - [`CompiledTree`] - closure-compiled baseline
//! - [`CoverCounts`] - per-node visit counts, owned by the caller
//!
//! # Evaluating
//!
//! ```ignore
//! use fast_tree::{load_preorder, evaluate_preorder};
//!
//! let model = load_preorder(&std::fs::read_to_string("model.txt")?, false)?;
//! let prediction = evaluate_preorder(&model.tree, &[0.5, 1.0, f32::NAN]);
//! ```
//!
//! The [`driver`] module runs a whole batch, optionally across rayon workers.

pub mod compile;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod inference;
pub mod io;
pub mod repr;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use compile::{emit_rust, CompiledTree};
pub use config::{BenchConfig, ConfigError};
pub use error::{ModelError, ShapeError};
pub use inference::{
    build_lookup_table, evaluate_bitmask, evaluate_breadth_first, evaluate_preorder,
    evaluate_preorder_cover, BitmaskEvaluator, CoverCounts, Evaluator, EvaluatorKind,
};
pub use repr::{
    load_breadth_first, load_preorder, BreadthFirstTree, Node, PreorderModel, PreorderTree,
    SplitCondition, TreeValidationError,
};
pub use utils::{run_with_threads, Parallelism};
