//! On-disk format of the exported GBDT artifact.
//!
//! A JSON document with the trained feature order, a raw-margin bias,
//! and the boosted trees as flat node arrays. Produced by the offline
//! training pipeline's export step; validated exhaustively at load so
//! a corrupt artifact fails the process at startup instead of a
//! request at 3 a.m.

use serde::{Deserialize, Serialize};

use adherix_common::error::{AdherixError, Result};
use adherix_common::schema::FEATURE_SCHEMA;

/// One node in a flat tree array. Children are indices into the same
/// array; traversal goes left when `value < threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// The complete frozen artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtArtifact {
    pub model_version: String,
    /// Feature order the trees were trained against. Must match the
    /// deployed schema exactly.
    pub feature_names: Vec<String>,
    /// Raw-margin bias added before the tree sum.
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl GbdtArtifact {
    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: GbdtArtifact = serde_json::from_str(raw)
            .map_err(|e| AdherixError::ModelLoad(format!("artifact is not valid JSON: {e}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Structural validation: schema agreement, node index bounds,
    /// feature index bounds. Cheap relative to load, and it turns
    /// silent garbage into a startup failure.
    pub fn validate(&self) -> Result<()> {
        if self.model_version.is_empty() {
            return Err(AdherixError::ModelLoad("artifact has no model_version".into()));
        }

        let expected: Vec<&str> = FEATURE_SCHEMA.iter().map(|spec| spec.name).collect();
        let actual: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if expected != actual {
            return Err(AdherixError::ModelLoad(format!(
                "artifact feature order {:?} does not match deployed schema {:?}",
                actual, expected
            )));
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(AdherixError::ModelLoad(format!(
                    "tree {tree_idx} has no nodes"
                )));
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                if let Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } = node
                {
                    if *feature >= self.feature_names.len() {
                        return Err(AdherixError::ModelLoad(format!(
                            "tree {tree_idx} node {node_idx} splits on feature {feature}, \
                             but the model has {} features",
                            self.feature_names.len()
                        )));
                    }
                    // child indices must point forward into the array,
                    // which also rules out cycles
                    if *left <= node_idx
                        || *right <= node_idx
                        || *left >= tree.nodes.len()
                        || *right >= tree.nodes.len()
                    {
                        return Err(AdherixError::ModelLoad(format!(
                            "tree {tree_idx} node {node_idx} has invalid children \
                             ({left}, {right})"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
