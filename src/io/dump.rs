//! XGBoost text dump parser and writer.
//!
//! Parses the line-based format produced by `Booster.dump_model()`:
//!
//! ```text
//! booster[0]:
//! 0:[f28<1.5] yes=1,no=2,missing=1
//! 	1:leaf=-0.0825883001
//! 	2:leaf=0.063217625
//! ```
//!
//! Statistics appended by `with_stats=True` (`gain=`, `cover=`) are accepted
//! and ignored. Indentation is not significant; structure comes from the
//! `yes`/`no` child ids.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use log::debug;

use crate::error::ModelError;
use crate::repr::validate::{validate_graph, HasChildren};
use crate::repr::{NodeId, SplitCondition, TreeValidationError};

/// Root node id in every dump.
pub const ROOT_ID: NodeId = 0;

/// A node as described by the dump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DumpNode {
    /// Internal node: `yes` is taken when `feature < threshold`.
    Split {
        condition: SplitCondition,
        yes: NodeId,
        no: NodeId,
    },
    Leaf(f32),
}

impl HasChildren for DumpNode {
    fn children(&self) -> Option<(NodeId, NodeId)> {
        match *self {
            DumpNode::Split { yes, no, .. } => Some((yes, no)),
            DumpNode::Leaf(_) => None,
        }
    }
}

/// Parsed single-tree dump, keyed by node id.
///
/// Construction through [`TreeDump::parse`] guarantees a validated tree; the
/// [`insert`](TreeDump::insert) builder leaves validation to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDump {
    nodes: BTreeMap<NodeId, DumpNode>,
}

impl TreeDump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a dump file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!("parsing model dump {}", path.display());
        Self::parse(&content)
    }

    /// Parse and validate dump text.
    pub fn parse(content: &str) -> Result<Self, ModelError> {
        let mut dump = TreeDump::new();
        let mut num_boosters = 0usize;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("booster[") {
                num_boosters += 1;
                continue;
            }
            let (id, node) = parse_node_line(line_no, line)?;
            dump.insert(id, node)?;
        }

        if num_boosters > 1 {
            return Err(TreeValidationError::MultipleTrees(num_boosters).into());
        }

        dump.validate()?;
        debug!(
            "parsed dump: {} nodes, {} leaves, depth {}",
            dump.num_nodes(),
            dump.num_leaves(),
            dump.depth()
        );
        Ok(dump)
    }

    /// Add a node. Fails if the id is already defined.
    pub fn insert(&mut self, id: NodeId, node: DumpNode) -> Result<(), TreeValidationError> {
        if self.nodes.insert(id, node).is_some() {
            return Err(TreeValidationError::DuplicateNode(id));
        }
        Ok(())
    }

    /// Builder-style split insertion, for fixtures.
    pub fn with_split(mut self, id: NodeId, condition: SplitCondition, yes: NodeId, no: NodeId) -> Self {
        self.nodes.insert(id, DumpNode::Split { condition, yes, no });
        self
    }

    /// Builder-style leaf insertion, for fixtures.
    pub fn with_leaf(mut self, id: NodeId, value: f32) -> Self {
        self.nodes.insert(id, DumpNode::Leaf(value));
        self
    }

    /// Check that the nodes form one binary tree rooted at [`ROOT_ID`].
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        validate_graph(&self.nodes, ROOT_ID).map(|_| ())
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&DumpNode> {
        self.nodes.get(&id)
    }

    #[inline]
    pub fn root(&self) -> Option<&DumpNode> {
        self.node(ROOT_ID)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, DumpNode::Leaf(_)))
            .count()
    }

    /// Depth of the deepest leaf (root = 0). Zero for invalid trees.
    pub fn depth(&self) -> usize {
        validate_graph(&self.nodes, ROOT_ID).unwrap_or(0)
    }

    /// Write the dump back to text, in preorder with one tab per level.
    ///
    /// Floats are written with the shortest representation that parses back
    /// to the same value, so `parse(to_text())` reproduces the dump exactly.
    pub fn to_text(&self) -> String {
        let mut out = String::from("booster[0]:\n");
        let mut stack = vec![(ROOT_ID, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            for _ in 0..depth {
                out.push('\t');
            }
            match *node {
                DumpNode::Split { condition, yes, no } => {
                    let missing = if condition.default_left { yes } else { no };
                    let _ = writeln!(
                        out,
                        "{id}:[f{}<{}] yes={yes},no={no},missing={missing}",
                        condition.feature_index, condition.threshold
                    );
                    stack.push((no, depth + 1));
                    stack.push((yes, depth + 1));
                }
                DumpNode::Leaf(value) => {
                    let _ = writeln!(out, "{id}:leaf={value}");
                }
            }
        }

        out
    }
}

fn parse_node_line(line_no: usize, line: &str) -> Result<(NodeId, DumpNode), ModelError> {
    let (id_str, body) = line
        .split_once(':')
        .ok_or_else(|| ModelError::syntax(line_no, "expected `<id>:`"))?;
    let id: NodeId = id_str
        .trim()
        .parse()
        .map_err(|_| ModelError::syntax(line_no, format!("invalid node id `{id_str}`")))?;
    let body = body.trim();

    if let Some(rest) = body.strip_prefix("leaf=") {
        let value_str = rest.split(',').next().unwrap_or(rest);
        let value = parse_f32(line_no, "leaf", value_str)?;
        return Ok((id, DumpNode::Leaf(value)));
    }

    let rest = body
        .strip_prefix('[')
        .ok_or_else(|| ModelError::syntax(line_no, "expected `leaf=` or `[f<index><<threshold>]`"))?;
    let (cond, attrs) = rest
        .split_once(']')
        .ok_or_else(|| ModelError::syntax(line_no, "unterminated split condition"))?;
    let (feature, threshold) = cond
        .split_once('<')
        .ok_or_else(|| ModelError::syntax(line_no, "split condition must use `<`"))?;
    let feature_index: u32 = feature
        .trim()
        .strip_prefix('f')
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ModelError::syntax(line_no, format!("invalid feature `{feature}`")))?;
    let threshold = parse_f32(line_no, "threshold", threshold)?;

    let mut yes = None;
    let mut no = None;
    let mut missing = None;
    for pair in attrs.trim().split(',').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ModelError::syntax(line_no, format!("expected `key=value`, got `{pair}`")))?;
        let slot = match key.trim() {
            "yes" => &mut yes,
            "no" => &mut no,
            "missing" => &mut missing,
            // gain, cover and friends
            _ => continue,
        };
        let child: NodeId = value
            .trim()
            .parse()
            .map_err(|_| ModelError::syntax(line_no, format!("invalid child id `{value}`")))?;
        *slot = Some(child);
    }

    let yes = yes.ok_or_else(|| ModelError::syntax(line_no, "missing `yes=`"))?;
    let no = no.ok_or_else(|| ModelError::syntax(line_no, "missing `no=`"))?;
    let default_left = match missing {
        None => false,
        Some(target) if target == yes => true,
        Some(target) if target == no => false,
        Some(target) => {
            return Err(TreeValidationError::InvalidMissingTarget { node: id, target }.into())
        }
    };

    Ok((
        id,
        DumpNode::Split {
            condition: SplitCondition::new(feature_index, threshold, default_left),
            yes,
            no,
        },
    ))
}

fn parse_f32(line_no: usize, field: &str, s: &str) -> Result<f32, ModelError> {
    s.trim()
        .parse()
        .map_err(|_| ModelError::syntax(line_no, format!("invalid {field} value `{}`", s.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUMP: &str = "\
booster[0]:
0:[f0<1.5] yes=1,no=2,missing=2
\t1:leaf=-1
\t2:leaf=2
";

    #[test]
    fn parse_stump() {
        let dump = TreeDump::parse(STUMP).unwrap();

        assert_eq!(dump.num_nodes(), 3);
        assert_eq!(dump.num_leaves(), 2);
        assert_eq!(dump.depth(), 1);
        assert_eq!(
            dump.root(),
            Some(&DumpNode::Split {
                condition: SplitCondition::new(0, 1.5, false),
                yes: 1,
                no: 2,
            })
        );
        assert_eq!(dump.node(1), Some(&DumpNode::Leaf(-1.0)));
    }

    #[test]
    fn parse_ignores_stats_and_blank_lines() {
        let text = "0:[f3<0.25] yes=1,no=2,missing=1,gain=12.5,cover=100\n\n1:leaf=0.5,cover=60\n2:leaf=-0.5,cover=40\n";
        let dump = TreeDump::parse(text).unwrap();

        match dump.root() {
            Some(DumpNode::Split { condition, .. }) => {
                assert_eq!(condition.feature_index, 3);
                assert_eq!(condition.threshold, 0.25);
                assert!(condition.default_left);
            }
            other => panic!("unexpected root {other:?}"),
        }
        assert_eq!(dump.node(1), Some(&DumpNode::Leaf(0.5)));
    }

    #[test]
    fn missing_defaults_to_right_when_omitted() {
        let dump = TreeDump::parse("0:[f0<1] yes=1,no=2\n1:leaf=1\n2:leaf=2\n").unwrap();
        match dump.root() {
            Some(DumpNode::Split { condition, .. }) => assert!(!condition.default_left),
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn syntax_errors_report_line() {
        let err = TreeDump::parse("0:[f0<1] yes=1,no=2\n1:leaf=abc\n2:leaf=2\n").unwrap_err();
        assert!(matches!(err, ModelError::Syntax { line: 2, .. }), "{err}");

        let err = TreeDump::parse("0:[x0<1] yes=1,no=2\n").unwrap_err();
        assert!(matches!(err, ModelError::Syntax { line: 1, .. }), "{err}");

        let err = TreeDump::parse("0:[f0<1] no=2\n").unwrap_err();
        assert!(matches!(err, ModelError::Syntax { line: 1, .. }), "{err}");
    }

    #[test]
    fn structural_errors_are_malformed() {
        let dangling = TreeDump::parse("0:[f0<1] yes=1,no=5\n1:leaf=1\n").unwrap_err();
        assert!(matches!(
            dangling,
            ModelError::MalformedModel(TreeValidationError::ChildOutOfBounds { child: 5, .. })
        ));

        let duplicate = TreeDump::parse("0:leaf=1\n0:leaf=2\n").unwrap_err();
        assert!(matches!(
            duplicate,
            ModelError::MalformedModel(TreeValidationError::DuplicateNode(0))
        ));

        let bad_missing = TreeDump::parse("0:[f0<1] yes=1,no=2,missing=7\n1:leaf=1\n2:leaf=2\n").unwrap_err();
        assert!(matches!(
            bad_missing,
            ModelError::MalformedModel(TreeValidationError::InvalidMissingTarget { node: 0, target: 7 })
        ));
    }

    #[test]
    fn multiple_boosters_are_rejected() {
        let text = "booster[0]:\n0:leaf=1\nbooster[1]:\n";
        let err = TreeDump::parse(text).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MalformedModel(TreeValidationError::MultipleTrees(2))
        ));
    }

    #[test]
    fn text_round_trip() {
        let dump = TreeDump::parse(STUMP).unwrap();
        let reparsed = TreeDump::parse(&dump.to_text()).unwrap();
        assert_eq!(dump, reparsed);
    }
}
