//! Breadth-first (heap-indexed) tree layout.
//!
//! ```text
//! Level 0:           [1]
//! Level 1:        [2]   [3]
//! Level 2:      [4][5] [6][7]
//! ```
//!
//! The children of slot `i` live at `2i` (left) and `2i + 1` (right). Slot 0
//! and any slot below a leaf hold [`Node::UNUSED`]. The array length is
//! `2^(depth + 1)`, so a tree of depth 3 occupies 16 slots.

use std::path::Path;

use log::debug;

use crate::error::ModelError;
use crate::io::dump::{DumpNode, TreeDump, ROOT_ID};

use super::{Node, NodeId, NodeKind, TreeValidationError};

/// Deepest tree the breadth-first layout accepts (`2^21` slots).
pub const MAX_BREADTH_FIRST_DEPTH: usize = 20;

/// Index of the root slot.
pub const ROOT_SLOT: usize = 1;

/// A tree stored in breadth-first heap order.
#[derive(Debug, Clone, PartialEq)]
pub struct BreadthFirstTree {
    nodes: Box<[Node]>,
}

/// Parse a dump and lay it out breadth-first.
pub fn load_breadth_first(source: &str) -> Result<BreadthFirstTree, ModelError> {
    let dump = TreeDump::parse(source)?;
    BreadthFirstTree::from_dump(&dump)
}

impl BreadthFirstTree {
    /// Read a dump file and lay it out breadth-first.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::from_dump(&TreeDump::from_file(path)?)
    }

    /// Lay out a dump. The dump is validated first.
    pub fn from_dump(dump: &TreeDump) -> Result<Self, ModelError> {
        dump.validate()?;
        let depth = dump.depth();
        if depth > MAX_BREADTH_FIRST_DEPTH {
            return Err(TreeValidationError::TooDeep {
                depth,
                max_depth: MAX_BREADTH_FIRST_DEPTH,
            }
            .into());
        }

        let mut nodes = vec![Node::UNUSED; 1 << (depth + 1)];
        let mut stack = vec![(ROOT_ID, ROOT_SLOT)];
        while let Some((id, slot)) = stack.pop() {
            let Some(node) = dump.node(id) else {
                continue;
            };
            match *node {
                DumpNode::Split { condition, yes, no } => {
                    nodes[slot] = Node::split(condition, 0);
                    stack.push((no, 2 * slot + 1));
                    stack.push((yes, 2 * slot));
                }
                DumpNode::Leaf(value) => nodes[slot] = Node::leaf(value),
            }
        }

        debug!(
            "breadth-first layout: {} slots for {} nodes",
            nodes.len(),
            dump.num_nodes()
        );
        Ok(Self {
            nodes: nodes.into_boxed_slice(),
        })
    }

    /// Rebuild from a raw slot array, checking the heap encoding.
    ///
    /// Every split must have both children in bounds and in use, and every
    /// used slot must hang below a split (or be the root). The array must end
    /// with the deepest level: `2^(depth + 1)` slots, no padding.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeValidationError> {
        if nodes.len() <= ROOT_SLOT {
            return Err(TreeValidationError::EmptyTree);
        }
        if nodes[ROOT_SLOT].is_unused() {
            return Err(TreeValidationError::MissingRoot(ROOT_ID));
        }
        if !nodes[0].is_unused() {
            return Err(TreeValidationError::UnreachableNode { node: 0 });
        }

        for (slot, node) in nodes.iter().enumerate().skip(ROOT_SLOT) {
            if node.is_split() {
                for (side, child) in [("left", 2 * slot), ("right", 2 * slot + 1)] {
                    if nodes.get(child).map_or(true, Node::is_unused) {
                        return Err(TreeValidationError::ChildOutOfBounds {
                            node: slot as NodeId,
                            side,
                            child: child as NodeId,
                        });
                    }
                }
            }
            if slot > ROOT_SLOT && !node.is_unused() && !nodes[slot / 2].is_split() {
                return Err(TreeValidationError::UnreachableNode {
                    node: slot as NodeId,
                });
            }
        }

        // The root is in use, so a deepest used slot exists.
        let deepest = nodes.iter().rposition(|n| !n.is_unused()).unwrap_or(ROOT_SLOT);
        let depth = (usize::BITS - 1 - deepest.leading_zeros()) as usize;
        if depth > MAX_BREADTH_FIRST_DEPTH {
            return Err(TreeValidationError::TooDeep {
                depth,
                max_depth: MAX_BREADTH_FIRST_DEPTH,
            });
        }
        let expected = 1usize << (depth + 1);
        if nodes.len() > expected {
            return Err(TreeValidationError::TrailingNodes {
                count: nodes.len() - expected,
            });
        }
        if nodes.len() < expected {
            return Err(TreeValidationError::SlotCountMismatch {
                expected,
                actual: nodes.len(),
            });
        }

        Ok(Self {
            nodes: nodes.into_boxed_slice(),
        })
    }

    /// All slots, including slot 0 and unused placeholders.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of slots in the array.
    #[inline]
    pub fn num_slots(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_splits(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_split()).count()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Re-serialize as a dump. Node ids are `slot - 1`, the numbering XGBoost
    /// uses for complete trees.
    pub fn to_dump(&self) -> TreeDump {
        let mut dump = TreeDump::new();
        for (slot, node) in self.nodes.iter().enumerate().skip(ROOT_SLOT) {
            let id = (slot - 1) as NodeId;
            dump = match node.kind {
                NodeKind::Split => {
                    dump.with_split(id, node.condition(), (2 * slot - 1) as NodeId, (2 * slot) as NodeId)
                }
                NodeKind::Leaf => dump.with_leaf(id, node.leaf_value),
                NodeKind::Unused => dump,
            };
        }
        dump
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::SplitCondition;

    const DEPTH_TWO: &str = "\
0:[f0<0.5] yes=1,no=2,missing=1
\t1:leaf=1
\t2:[f1<0.3] yes=3,no=4,missing=4
\t\t3:leaf=2
\t\t4:leaf=3
";

    #[test]
    fn layout_places_children_at_heap_slots() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let nodes = tree.nodes();

        assert_eq!(tree.num_slots(), 8);
        assert!(nodes[0].is_unused());
        assert_eq!(nodes[1].condition(), SplitCondition::new(0, 0.5, true));
        assert_eq!(nodes[2], Node::leaf(1.0));
        assert_eq!(nodes[3].condition(), SplitCondition::new(1, 0.3, false));
        assert!(nodes[4].is_unused());
        assert!(nodes[5].is_unused());
        assert_eq!(nodes[6], Node::leaf(2.0));
        assert_eq!(nodes[7], Node::leaf(3.0));
        assert_eq!(tree.num_splits(), 2);
        assert_eq!(tree.num_leaves(), 3);
    }

    #[test]
    fn single_leaf_tree() {
        let tree = load_breadth_first("0:leaf=4.5\n").unwrap();
        assert_eq!(tree.num_slots(), 2);
        assert_eq!(tree.nodes()[1], Node::leaf(4.5));
    }

    #[test]
    fn from_nodes_accepts_own_layout() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let rebuilt = BreadthFirstTree::from_nodes(tree.nodes().to_vec()).unwrap();
        assert_eq!(tree, rebuilt);
    }

    #[test]
    fn from_nodes_rejects_missing_child() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let mut nodes = tree.nodes().to_vec();
        nodes[7] = Node::UNUSED;
        assert_eq!(
            BreadthFirstTree::from_nodes(nodes),
            Err(TreeValidationError::ChildOutOfBounds {
                node: 3,
                side: "right",
                child: 7
            })
        );
    }

    #[test]
    fn from_nodes_rejects_orphan_slot() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let mut nodes = tree.nodes().to_vec();
        nodes[4] = Node::leaf(9.0);
        assert_eq!(
            BreadthFirstTree::from_nodes(nodes),
            Err(TreeValidationError::UnreachableNode { node: 4 })
        );
    }

    #[test]
    fn from_nodes_rejects_padding_after_deepest_level() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let mut nodes = tree.nodes().to_vec();
        nodes.resize(16, Node::UNUSED);
        assert_eq!(
            BreadthFirstTree::from_nodes(nodes),
            Err(TreeValidationError::TrailingNodes { count: 8 })
        );
    }

    #[test]
    fn from_nodes_rejects_short_last_level() {
        // Depth 2 with the last level cut after the left split's children.
        let nodes = vec![
            Node::UNUSED,
            Node::split(SplitCondition::new(0, 0.5, true), 0),
            Node::split(SplitCondition::new(1, 0.5, true), 0),
            Node::leaf(1.0),
            Node::leaf(2.0),
            Node::leaf(3.0),
        ];
        assert_eq!(
            BreadthFirstTree::from_nodes(nodes),
            Err(TreeValidationError::SlotCountMismatch {
                expected: 8,
                actual: 6
            })
        );
    }

    #[test]
    fn from_nodes_rejects_truncated_array() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let nodes = tree.nodes()[..4].to_vec();
        assert!(matches!(
            BreadthFirstTree::from_nodes(nodes),
            Err(TreeValidationError::ChildOutOfBounds { node: 3, .. })
        ));
        assert_eq!(
            BreadthFirstTree::from_nodes(vec![Node::UNUSED]),
            Err(TreeValidationError::EmptyTree)
        );
    }

    #[test]
    fn dump_round_trip_preserves_layout() {
        let tree = load_breadth_first(DEPTH_TWO).unwrap();
        let reloaded = load_breadth_first(&tree.to_dump().to_text()).unwrap();
        assert_eq!(tree, reloaded);
    }

    #[test]
    fn too_deep_tree_is_rejected() {
        // A left-leaning chain one level deeper than the layout allows.
        let depth = MAX_BREADTH_FIRST_DEPTH + 1;
        let mut text = String::new();
        for level in 0..depth {
            let id = 2 * level;
            text.push_str(&format!("{id}:[f0<0.5] yes={},no={}\n", id + 2, id + 1));
            text.push_str(&format!("{}:leaf=0\n", id + 1));
        }
        text.push_str(&format!("{}:leaf=1\n", 2 * depth));

        let err = load_breadth_first(&text).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MalformedModel(TreeValidationError::TooDeep { depth: 21, .. })
        ));
    }
}
