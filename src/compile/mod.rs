//! Compiled baseline.
//!
//! Two ways of turning a tree into straight-line code with its constants baked
//! in:
//!
//! - [`CompiledTree`]: nested closures built at load time, one per node
//! - [`emit_rust`]: a standalone `if`/`else` Rust function, for compiling
//!   the tree into another binary ahead of time

use std::fmt::{self, Write as _};

use crate::inference::Evaluator;
use crate::repr::{BreadthFirstTree, Node, ROOT_SLOT};

type NodeFn = Box<dyn Fn(&[f32]) -> f32 + Send + Sync>;

/// A tree lowered into nested closures.
pub struct CompiledTree {
    root: NodeFn,
    num_nodes: usize,
}

impl fmt::Debug for CompiledTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTree")
            .field("num_nodes", &self.num_nodes)
            .finish_non_exhaustive()
    }
}

impl CompiledTree {
    pub fn compile(tree: &BreadthFirstTree) -> Self {
        let nodes = tree.nodes();
        Self {
            root: lower(nodes, ROOT_SLOT),
            num_nodes: nodes.iter().filter(|n| !n.is_unused()).count(),
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn predict(&self, features: &[f32]) -> f32 {
        (self.root)(features)
    }
}

impl Evaluator for CompiledTree {
    #[inline]
    fn evaluate(&self, features: &[f32]) -> f32 {
        self.predict(features)
    }
}

fn lower(nodes: &[Node], slot: usize) -> NodeFn {
    let node = nodes.get(slot).copied().unwrap_or(Node::UNUSED);
    if !node.is_split() {
        let value = node.leaf_value;
        return Box::new(move |_| value);
    }

    let left = lower(nodes, 2 * slot);
    let right = lower(nodes, 2 * slot + 1);
    let feature = node.feature_index as usize;
    let threshold = node.split_value;
    if node.default_left {
        Box::new(move |x| match x.get(feature) {
            Some(&v) if !v.is_nan() && v >= threshold => right(x),
            _ => left(x),
        })
    } else {
        Box::new(move |x| match x.get(feature) {
            Some(&v) if !v.is_nan() && v < threshold => left(x),
            _ => right(x),
        })
    }
}

/// Emit `tree` as Rust source for `pub fn <fn_name>(features: &[f32]) -> f32`.
///
/// The emitted function follows the same routing rules as the evaluators:
/// NaN and out-of-range features take the node's default direction.
pub fn emit_rust(tree: &BreadthFirstTree, fn_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#[inline]");
    let _ = writeln!(out, "pub fn {fn_name}(features: &[f32]) -> f32 {{");
    let _ = writeln!(
        out,
        "    let x = |i: usize| features.get(i).copied().unwrap_or(f32::NAN);"
    );
    emit_node(&mut out, tree.nodes(), ROOT_SLOT, 1);
    let _ = writeln!(out, "}}");
    out
}

fn emit_node(out: &mut String, nodes: &[Node], slot: usize, depth: usize) {
    let indent = "    ".repeat(depth);
    let node = nodes.get(slot).copied().unwrap_or(Node::UNUSED);
    if !node.is_split() {
        let _ = writeln!(out, "{indent}{}", float_literal(node.leaf_value));
        return;
    }

    let _ = writeln!(
        out,
        "{indent}if {{ let v = x({}); if v.is_nan() {{ {} }} else {{ v < {} }} }} {{",
        node.feature_index,
        node.default_left,
        float_literal(node.split_value)
    );
    emit_node(out, nodes, 2 * slot, depth + 1);
    let _ = writeln!(out, "{indent}}} else {{");
    emit_node(out, nodes, 2 * slot + 1, depth + 1);
    let _ = writeln!(out, "{indent}}}");
}

fn float_literal(value: f32) -> String {
    if value.is_nan() {
        "f32::NAN".to_string()
    } else if value == f32::INFINITY {
        "f32::INFINITY".to_string()
    } else if value == f32::NEG_INFINITY {
        "f32::NEG_INFINITY".to_string()
    } else {
        format!("{value:?}_f32")
    }
}
