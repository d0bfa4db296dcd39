//! JSON persistence of laid-out node arrays.
//!
//! Unlike the text dump, the JSON form stores a layout as-is, so a tree can
//! be reloaded without re-running the layout pass. Arrays are re-validated on
//! load: a hand-edited file with a bad offset or a dangling slot is rejected
//! with [`ModelError::MalformedModel`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::repr::{BreadthFirstTree, Node, NodeId, PreorderTree};

/// Which layout a node array is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSchema {
    BreadthFirst,
    Preorder,
}

impl fmt::Display for LayoutSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutSchema::BreadthFirst => "breadth_first",
            LayoutSchema::Preorder => "preorder",
        })
    }
}

/// Serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSchema {
    pub layout: LayoutSchema,
    pub nodes: Vec<Node>,
    /// Source node ids, preorder only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<NodeId>>,
}

impl From<&BreadthFirstTree> for TreeSchema {
    fn from(tree: &BreadthFirstTree) -> Self {
        Self {
            layout: LayoutSchema::BreadthFirst,
            nodes: tree.nodes().to_vec(),
            node_ids: None,
        }
    }
}

impl From<&PreorderTree> for TreeSchema {
    fn from(tree: &PreorderTree) -> Self {
        Self {
            layout: LayoutSchema::Preorder,
            nodes: tree.nodes().to_vec(),
            node_ids: Some(tree.node_ids().to_vec()),
        }
    }
}

impl TreeSchema {
    fn expect_layout(&self, expected: LayoutSchema) -> Result<(), ModelError> {
        if self.layout != expected {
            return Err(ModelError::LayoutMismatch {
                expected,
                actual: self.layout,
            });
        }
        Ok(())
    }

    pub fn into_breadth_first(self) -> Result<BreadthFirstTree, ModelError> {
        self.expect_layout(LayoutSchema::BreadthFirst)?;
        Ok(BreadthFirstTree::from_nodes(self.nodes)?)
    }

    pub fn into_preorder(self) -> Result<PreorderTree, ModelError> {
        self.expect_layout(LayoutSchema::Preorder)?;
        let tree = match self.node_ids {
            Some(ids) => PreorderTree::from_nodes_with_ids(self.nodes, ids)?,
            None => PreorderTree::from_nodes(self.nodes)?,
        };
        Ok(tree)
    }

    pub fn to_writer(&self, writer: impl Write) -> Result<(), ModelError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{load_breadth_first, load_preorder, TreeValidationError};
    use crate::testing::CANONICAL_DUMP;

    #[test]
    fn breadth_first_survives_json() {
        let tree = load_breadth_first(CANONICAL_DUMP).unwrap();
        let text = serde_json::to_string(&TreeSchema::from(&tree)).unwrap();
        let back: TreeSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(back.into_breadth_first().unwrap(), tree);
    }

    #[test]
    fn preorder_survives_file() {
        let tree = load_preorder(CANONICAL_DUMP, false).unwrap().tree;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");

        TreeSchema::from(&tree).to_file(&path).unwrap();
        let back = TreeSchema::from_file(&path).unwrap().into_preorder().unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn layout_is_checked() {
        let tree = load_breadth_first(CANONICAL_DUMP).unwrap();
        let err = TreeSchema::from(&tree).into_preorder().unwrap_err();
        assert!(matches!(
            err,
            ModelError::LayoutMismatch {
                expected: LayoutSchema::Preorder,
                actual: LayoutSchema::BreadthFirst
            }
        ));
    }

    #[test]
    fn corrupted_offsets_are_rejected() {
        let text = r#"{
            "layout": "preorder",
            "nodes": [
                {"feature_index": 0, "split_value": 0.5, "leaf_value": 0.0, "right_offset": 5, "kind": "split"},
                {"feature_index": 0, "split_value": 0.0, "leaf_value": 1.0, "kind": "leaf"},
                {"feature_index": 0, "split_value": 0.0, "leaf_value": 2.0, "kind": "leaf"}
            ]
        }"#;
        let schema: TreeSchema = serde_json::from_str(text).unwrap();
        assert!(matches!(
            schema.into_preorder(),
            Err(ModelError::MalformedModel(TreeValidationError::OffsetOutOfBounds {
                position: 0,
                offset: 5,
                len: 3
            }))
        ));
    }
}
