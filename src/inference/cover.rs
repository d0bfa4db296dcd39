//! Traversal cover: how many rows entered each node.
//!
//! Counters are owned by the caller, never by the model. A parallel run gives
//! each worker its own [`CoverCounts`] and folds them with
//! [`merge`](CoverCounts::merge); [`AtomicCoverCounts`] is the alternative when
//! one accumulator has to be shared.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::repr::{NodeId, PreorderTree};

/// One visit counter per preorder position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverCounts {
    counts: Vec<u64>,
}

impl CoverCounts {
    /// Zeroed counters for `len` positions.
    pub fn new(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Zeroed counters sized to `tree`.
    pub fn for_tree(tree: &PreorderTree) -> Self {
        Self::new(tree.num_nodes())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count at a preorder position, zero when out of range.
    #[inline]
    pub fn get(&self, pos: usize) -> u64 {
        self.counts.get(pos).copied().unwrap_or(0)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Sum over all positions.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    #[inline]
    pub(crate) fn record(&mut self, pos: usize) {
        self.counts[pos] += 1;
    }

    /// Add another accumulator into this one.
    ///
    /// Grows to the longer of the two, so an empty accumulator is a valid
    /// starting point for a fold.
    pub fn merge(&mut self, other: &CoverCounts) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (acc, &n) in self.counts.iter_mut().zip(&other.counts) {
            *acc += n;
        }
    }

    /// Zero every counter, keeping the size.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// `(node_id, count)` for every node of `tree`, ordered by node id.
    pub fn report(&self, tree: &PreorderTree) -> Vec<(NodeId, u64)> {
        let mut rows: Vec<(NodeId, u64)> = tree
            .node_ids()
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, self.get(pos)))
            .collect();
        rows.sort_unstable_by_key(|&(id, _)| id);
        rows
    }
}

/// Shared counters with relaxed atomic increments.
#[derive(Debug, Default)]
pub struct AtomicCoverCounts {
    counts: Box<[AtomicU64]>,
}

impl AtomicCoverCounts {
    pub fn new(len: usize) -> Self {
        Self {
            counts: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn for_tree(tree: &PreorderTree) -> Self {
        Self::new(tree.num_nodes())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub(crate) fn record(&self, pos: usize) {
        self.counts[pos].fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values out.
    pub fn snapshot(&self) -> CoverCounts {
        CoverCounts {
            counts: self.counts.iter().map(|c| c.load(Ordering::Relaxed)).collect(),
        }
    }

    pub fn into_counts(self) -> CoverCounts {
        CoverCounts {
            counts: self.counts.into_vec().into_iter().map(AtomicU64::into_inner).collect(),
        }
    }
}

/// Evaluate a row in preorder, counting every node entered (leaf included).
///
/// Returns exactly what [`evaluate_preorder`](super::evaluate_preorder) returns.
/// `cover` must be sized to `tree`.
#[inline]
pub fn evaluate_preorder_cover(tree: &PreorderTree, features: &[f32], cover: &mut CoverCounts) -> f32 {
    let nodes = tree.nodes();
    let mut pos = 0usize;
    loop {
        cover.record(pos);
        let node = &nodes[pos];
        if !node.is_split() {
            return node.leaf_value;
        }
        pos += if node.go_left(features) {
            1
        } else {
            node.right_offset as usize
        };
    }
}

/// [`evaluate_preorder_cover`] against a shared atomic accumulator.
#[inline]
pub fn evaluate_preorder_cover_atomic(
    tree: &PreorderTree,
    features: &[f32],
    cover: &AtomicCoverCounts,
) -> f32 {
    let nodes = tree.nodes();
    let mut pos = 0usize;
    loop {
        cover.record(pos);
        let node = &nodes[pos];
        if !node.is_split() {
            return node.leaf_value;
        }
        pos += if node.go_left(features) {
            1
        } else {
            node.right_offset as usize
        };
    }
}
