//! Preorder tree layout with explicit right-subtree offsets.
//!
//! ```text
//! dump:            preorder array:
//!      0           pos  node  right_offset
//!     / \           0    0        4
//!    1   2          1    1        2
//!   / \  / \        2    3        -
//!  3  4 5   6       3    4        -
//!                   4    2        2
//!                   5    5        -
//!                   6    6        -
//! ```
//!
//! The left child of a split at `pos` is always `pos + 1`; the right child is
//! `pos + right_offset`. A depth-first scan touches memory sequentially.

use std::collections::BTreeSet;
use std::path::Path;

use log::debug;

use crate::error::ModelError;
use crate::inference::cover::CoverCounts;
use crate::io::dump::{DumpNode, TreeDump, ROOT_ID};

use super::{Node, NodeId, NodeKind, TreeValidationError};

/// A tree stored in preorder.
#[derive(Debug, Clone, PartialEq)]
pub struct PreorderTree {
    nodes: Box<[Node]>,
    /// Source node id per position, used as node identity in cover reports.
    node_ids: Box<[NodeId]>,
}

/// A preorder tree, optionally paired with a zeroed cover accumulator.
#[derive(Debug, Clone)]
pub struct PreorderModel {
    pub tree: PreorderTree,
    pub cover: Option<CoverCounts>,
}

/// Parse a dump and lay it out in preorder.
///
/// With `with_cover`, the model also carries one zeroed counter per node for
/// [`evaluate_preorder_cover`](crate::inference::evaluate_preorder_cover).
pub fn load_preorder(source: &str, with_cover: bool) -> Result<PreorderModel, ModelError> {
    let dump = TreeDump::parse(source)?;
    let tree = PreorderTree::from_dump(&dump)?;
    let cover = with_cover.then(|| CoverCounts::for_tree(&tree));
    Ok(PreorderModel { tree, cover })
}

impl PreorderTree {
    /// Read a dump file and lay it out in preorder.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::from_dump(&TreeDump::from_file(path)?)
    }

    /// Lay out a dump. The dump is validated first.
    pub fn from_dump(dump: &TreeDump) -> Result<Self, ModelError> {
        dump.validate()?;

        let mut nodes: Vec<Node> = Vec::with_capacity(dump.num_nodes());
        let mut node_ids: Vec<NodeId> = Vec::with_capacity(dump.num_nodes());
        // (dump id, position of the parent whose right offset points here)
        let mut stack: Vec<(NodeId, Option<usize>)> = vec![(ROOT_ID, None)];

        while let Some((id, parent)) = stack.pop() {
            let Some(node) = dump.node(id) else {
                continue;
            };
            let pos = nodes.len();
            if let Some(parent) = parent {
                nodes[parent].right_offset = (pos - parent) as u32;
            }
            node_ids.push(id);
            match *node {
                DumpNode::Split { condition, yes, no } => {
                    nodes.push(Node::split(condition, 0));
                    // Left subtree is emitted completely before the right one is popped.
                    stack.push((no, Some(pos)));
                    stack.push((yes, None));
                }
                DumpNode::Leaf(value) => nodes.push(Node::leaf(value)),
            }
        }

        debug!("preorder layout: {} nodes", nodes.len());
        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            node_ids: node_ids.into_boxed_slice(),
        })
    }

    /// Rebuild from a raw preorder array. Node ids default to positions.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeValidationError> {
        let node_ids = (0..nodes.len() as NodeId).collect();
        Self::from_nodes_with_ids(nodes, node_ids)
    }

    /// Rebuild from a raw preorder array and its source node ids.
    ///
    /// The first id must be the dump root and ids must be unique. Then the
    /// preorder walk is replayed: each subtree must start exactly where the
    /// previous one ended, every right offset must land inside the array, and
    /// the walk must consume every entry.
    pub fn from_nodes_with_ids(
        nodes: Vec<Node>,
        node_ids: Vec<NodeId>,
    ) -> Result<Self, TreeValidationError> {
        let len = nodes.len();
        if len == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        if node_ids.len() != len {
            return Err(TreeValidationError::NodeIdsLenMismatch {
                expected: len,
                actual: node_ids.len(),
            });
        }

        if node_ids[0] != ROOT_ID {
            return Err(TreeValidationError::MissingRoot(ROOT_ID));
        }
        let mut seen = BTreeSet::new();
        if let Some(&dup) = node_ids.iter().find(|&&id| !seen.insert(id)) {
            return Err(TreeValidationError::DuplicateNode(dup));
        }

        let mut next = 0usize;
        let mut stack = vec![0usize];
        while let Some(start) = stack.pop() {
            if start != next {
                return Err(TreeValidationError::OffsetMismatch {
                    position: start,
                    expected: next,
                    actual: start,
                });
            }
            let node = &nodes[start];
            next = start + 1;
            match node.kind {
                NodeKind::Unused => return Err(TreeValidationError::UnusedEntry { position: start }),
                NodeKind::Leaf => {}
                NodeKind::Split => {
                    if node.right_offset == 0 {
                        return Err(TreeValidationError::SelfLoop {
                            node: node_ids[start],
                        });
                    }
                    if start + 1 >= len {
                        return Err(TreeValidationError::Truncated { position: start });
                    }
                    let right = start + node.right_offset as usize;
                    if right >= len {
                        return Err(TreeValidationError::OffsetOutOfBounds {
                            position: start,
                            offset: node.right_offset,
                            len,
                        });
                    }
                    stack.push(right);
                    stack.push(start + 1);
                }
            }
        }

        if next != len {
            return Err(TreeValidationError::TrailingNodes { count: len - next });
        }

        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            node_ids: node_ids.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Re-serialize as a dump using the stored node ids.
    pub fn to_dump(&self) -> TreeDump {
        let mut dump = TreeDump::new();
        for (pos, node) in self.nodes.iter().enumerate() {
            let id = self.node_ids[pos];
            dump = match node.kind {
                NodeKind::Split => dump.with_split(
                    id,
                    node.condition(),
                    self.node_ids[pos + 1],
                    self.node_ids[pos + node.right_offset as usize],
                ),
                NodeKind::Leaf => dump.with_leaf(id, node.leaf_value),
                NodeKind::Unused => dump,
            };
        }
        dump
    }
}
