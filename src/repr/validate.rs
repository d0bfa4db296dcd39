//! Structural validation shared by every layout.
//!
//! The dump loader validates the parsed node graph once, before any layout is
//! built. The layouts then only need to check their own encoding (heap slots,
//! preorder offsets) when they are rebuilt from raw node arrays.

use std::collections::BTreeMap;

use super::NodeId;

/// Structural validation errors for a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,
    #[error("root node {0} is missing")]
    MissingRoot(NodeId),
    #[error("node {0} is defined more than once")]
    DuplicateNode(NodeId),
    #[error("node {node}: {side} child {child} does not exist")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
    },
    #[error("node {node} references itself as a child")]
    SelfLoop { node: NodeId },
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },
    #[error("node {node} is reached by more than one path")]
    DuplicateVisit { node: NodeId },
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
    #[error("tree depth {depth} exceeds the breadth-first capacity of {max_depth} levels")]
    TooDeep { depth: usize, max_depth: usize },
    #[error("node {node}: missing-value target {target} is neither child")]
    InvalidMissingTarget { node: NodeId, target: NodeId },
    #[error("model holds {0} trees, only single-tree models are supported")]
    MultipleTrees(usize),
    #[error("entry {position}: right offset {offset} points outside {len} entries")]
    OffsetOutOfBounds {
        position: usize,
        offset: u32,
        len: usize,
    },
    #[error("entry {position}: right subtree starts at {actual}, expected {expected}")]
    OffsetMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },
    #[error("entry {position}: split node has no left child, stream is truncated")]
    Truncated { position: usize },
    #[error("entry {position}: placeholder entry inside a tree")]
    UnusedEntry { position: usize },
    #[error("{count} entries after the end of the tree")]
    TrailingNodes { count: usize },
    #[error("layout needs {expected} slots for its depth, got {actual}")]
    SlotCountMismatch { expected: usize, actual: usize },
    #[error("{expected} node ids expected, got {actual}")]
    NodeIdsLenMismatch { expected: usize, actual: usize },
}

/// Minimal view of a node graph for validation: children of split nodes.
pub(crate) trait NodeGraph {
    /// `Some(Some((left, right)))` for split nodes, `Some(None)` for leaves,
    /// `None` when the id is not defined.
    fn children(&self, node: NodeId) -> Option<Option<(NodeId, NodeId)>>;

    fn node_ids(&self) -> Vec<NodeId>;
}

impl<T> NodeGraph for BTreeMap<NodeId, T>
where
    T: HasChildren,
{
    fn children(&self, node: NodeId) -> Option<Option<(NodeId, NodeId)>> {
        self.get(&node).map(HasChildren::children)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.keys().copied().collect()
    }
}

pub(crate) trait HasChildren {
    fn children(&self) -> Option<(NodeId, NodeId)>;
}

/// Check that the graph rooted at `root` is a single binary tree.
///
/// Iterative DFS with colour marking: every child must exist, no node may be
/// visited twice, and every defined node must be reachable from the root.
/// Returns the depth of the deepest leaf (root = 0).
pub(crate) fn validate_graph<G: NodeGraph>(
    graph: &G,
    root: NodeId,
) -> Result<usize, TreeValidationError> {
    let ids = graph.node_ids();
    if ids.is_empty() {
        return Err(TreeValidationError::EmptyTree);
    }
    if graph.children(root).is_none() {
        return Err(TreeValidationError::MissingRoot(root));
    }

    // 0 = unvisited, 1 = visiting, 2 = done
    let mut color: BTreeMap<NodeId, u8> = ids.iter().map(|&id| (id, 0u8)).collect();
    let mut stack: Vec<(NodeId, usize, u8)> = vec![(root, 0, 0)];
    let mut max_depth = 0usize;

    while let Some((node, depth, phase)) = stack.pop() {
        if phase == 1 {
            color.insert(node, 2);
            continue;
        }

        match color.get(&node).copied() {
            Some(0) => {}
            Some(1) => return Err(TreeValidationError::CycleDetected { node }),
            Some(_) => return Err(TreeValidationError::DuplicateVisit { node }),
            None => unreachable!("children are checked before being pushed"),
        }
        color.insert(node, 1);
        stack.push((node, depth, 1));
        max_depth = max_depth.max(depth);

        if let Some(Some((left, right))) = graph.children(node) {
            if left == node || right == node {
                return Err(TreeValidationError::SelfLoop { node });
            }
            for (side, child) in [("left", left), ("right", right)] {
                if graph.children(child).is_none() {
                    return Err(TreeValidationError::ChildOutOfBounds { node, side, child });
                }
            }
            stack.push((right, depth + 1, 0));
            stack.push((left, depth + 1, 0));
        }
    }

    if let Some((&node, _)) = color.iter().find(|(_, &c)| c == 0) {
        return Err(TreeValidationError::UnreachableNode { node });
    }

    Ok(max_depth)
}
