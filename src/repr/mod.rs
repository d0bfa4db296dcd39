//! In-memory tree representations.
//!
//! A model is loaded once from a text dump into one of two flat layouts:
//!
//! - [`BreadthFirstTree`]: heap-indexed slots, children found by index arithmetic
//! - [`PreorderTree`]: depth-first sequence, right children found by a stored offset
//!
//! Both layouts share the [`Node`] record and encode the same logical tree, so
//! every evaluator returns bit-identical predictions for the same dump.

/// Node identifier as written in the model dump.
pub type NodeId = u32;

pub mod breadth_first;
pub mod node;
pub mod preorder;
pub(crate) mod validate;

pub use breadth_first::{load_breadth_first, BreadthFirstTree, MAX_BREADTH_FIRST_DEPTH, ROOT_SLOT};
pub use node::{Node, NodeKind, SplitCondition};
pub use preorder::{load_preorder, PreorderModel, PreorderTree};
pub use validate::TreeValidationError;
