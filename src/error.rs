//! Error types shared by the loaders and layout builders.

use crate::io::json::LayoutSchema;
use crate::repr::TreeValidationError;

/// Error type for model loading and evaluator construction.
///
/// All variants are fatal: a run never starts evaluating with a model that
/// failed to load.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dump text does not follow the node grammar.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// The nodes parse, but do not form a single well-formed binary tree.
    #[error("malformed model: {0}")]
    MalformedModel(#[from] TreeValidationError),

    /// The bitmask evaluator was given a tree that is not the full depth-3 shape.
    #[error("unsupported tree shape: {0}")]
    UnsupportedShape(#[from] ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a {expected} node array, found {actual}")]
    LayoutMismatch {
        expected: LayoutSchema,
        actual: LayoutSchema,
    },
}

impl ModelError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Shape mismatch for evaluators that only support one fixed tree shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected {expected} breadth-first slots, got {actual}")]
    SlotCount { expected: usize, actual: usize },
    #[error("expected {expected} split nodes, got {actual}")]
    SplitCount { expected: usize, actual: usize },
    #[error("expected {expected} leaves, got {actual}")]
    LeafCount { expected: usize, actual: usize },
}
