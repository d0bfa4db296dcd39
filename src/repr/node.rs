//! Tree node types.

use serde::{Deserialize, Serialize};

/// Split condition for a decision node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitCondition {
    /// Feature index to split on
    pub feature_index: u32,
    /// Threshold value (go left if feature < threshold)
    pub threshold: f32,
    /// Direction for missing values (true = left, false = right)
    pub default_left: bool,
}

impl SplitCondition {
    pub fn new(feature_index: u32, threshold: f32, default_left: bool) -> Self {
        Self {
            feature_index,
            threshold,
            default_left,
        }
    }

    /// Evaluate which direction to go for a feature value.
    /// Returns true for left, false for right.
    #[inline]
    pub fn go_left(&self, feature_value: f32) -> bool {
        if feature_value.is_nan() {
            self.default_left
        } else {
            feature_value < self.threshold
        }
    }
}

/// Role of an array entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NodeKind {
    /// Placeholder slot in the breadth-first array; never reached by a valid tree.
    #[default]
    Unused = 0,
    Split = 1,
    Leaf = 2,
}

/// One entry of a flat tree array.
///
/// The same record serves both layouts. `right_offset` is only meaningful in
/// the preorder layout, where it is the distance from a split node to the
/// first entry of its right subtree (the left child is always the next entry).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    pub feature_index: u32,
    pub split_value: f32,
    pub leaf_value: f32,
    #[serde(default)]
    pub right_offset: u32,
    #[serde(default)]
    pub default_left: bool,
    pub kind: NodeKind,
}

impl Node {
    /// Placeholder for breadth-first slots with no node.
    pub const UNUSED: Node = Node {
        feature_index: 0,
        split_value: 0.0,
        leaf_value: 0.0,
        right_offset: 0,
        default_left: false,
        kind: NodeKind::Unused,
    };

    /// Create a split node. `right_offset` is ignored by the breadth-first layout.
    pub fn split(condition: SplitCondition, right_offset: u32) -> Self {
        Self {
            feature_index: condition.feature_index,
            split_value: condition.threshold,
            leaf_value: 0.0,
            right_offset,
            default_left: condition.default_left,
            kind: NodeKind::Split,
        }
    }

    /// Create a leaf node.
    pub fn leaf(value: f32) -> Self {
        Self {
            leaf_value: value,
            kind: NodeKind::Leaf,
            ..Self::UNUSED
        }
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        self.kind == NodeKind::Split
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    #[inline]
    pub fn is_unused(&self) -> bool {
        self.kind == NodeKind::Unused
    }

    /// The split condition stored in this node. Meaningless for leaves.
    #[inline]
    pub fn condition(&self) -> SplitCondition {
        SplitCondition::new(self.feature_index, self.split_value, self.default_left)
    }

    /// Route a row through this split node.
    ///
    /// Feature indices beyond the row are read as missing.
    #[inline]
    pub fn go_left(&self, features: &[f32]) -> bool {
        let fvalue = features
            .get(self.feature_index as usize)
            .copied()
            .unwrap_or(f32::NAN);
        self.condition().go_left(fvalue)
    }
}
