//! The loaded model: scoring and per-feature path contributions.

use std::path::Path;

use tracing::info;

use adherix_common::error::{AdherixError, Result};
use adherix_common::schema::{FeatureVector, FEATURE_SCHEMA};

use crate::artifact::{GbdtArtifact, Node, Tree};

/// An immutable, loaded GBDT classifier.
///
/// Constructed once at process startup and shared by reference; no
/// method takes `&mut self`, so concurrent scoring needs no locking.
#[derive(Debug)]
pub struct GbdtModel {
    artifact: GbdtArtifact,
    /// Expected subtree value per node, per tree, precomputed at load
    /// for path attribution. Indexing mirrors `artifact.trees`.
    expectations: Vec<Vec<f64>>,
}

impl GbdtModel {
    /// Load and validate the artifact. Any failure here is fatal: the
    /// process must not serve predictions without a model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AdherixError::ModelLoad(format!("cannot read artifact {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&raw)?;
        info!(
            version = %model.version(),
            trees = model.artifact.trees.len(),
            "model artifact loaded"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact = GbdtArtifact::from_json(raw)?;
        let expectations = artifact.trees.iter().map(node_expectations).collect();
        Ok(Self {
            artifact,
            expectations,
        })
    }

    pub fn version(&self) -> &str {
        &self.artifact.model_version
    }

    pub fn feature_count(&self) -> usize {
        self.artifact.feature_names.len()
    }

    fn check_shape(&self, vector: &FeatureVector) -> Result<()> {
        if vector.len() != self.feature_count() {
            return Err(AdherixError::FeatureShape {
                expected: self.feature_count(),
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Untransformed margin: bias plus the sum of tree outputs.
    pub fn raw_margin(&self, vector: &FeatureVector) -> Result<f64> {
        self.check_shape(vector)?;
        let values = vector.values();
        let sum: f64 = self
            .artifact
            .trees
            .iter()
            .map(|tree| walk_to_leaf(tree, values))
            .sum();
        Ok(self.artifact.base_score + sum)
    }

    /// Score a vector: calibrated probability plus the raw margin.
    pub fn score(&self, vector: &FeatureVector) -> Result<(f64, f64)> {
        let margin = self.raw_margin(vector)?;
        Ok((sigmoid(margin), margin))
    }

    /// Additive path attribution (Saabas): walking each tree, the
    /// change in expected subtree value at every split is credited to
    /// the split feature. Exact invariant:
    /// `baseline + contributions.sum() == raw_margin`.
    ///
    /// Returns `(baseline, per-feature contributions in schema order)`.
    pub fn feature_contributions(&self, vector: &FeatureVector) -> Result<(f64, Vec<f64>)> {
        self.check_shape(vector)?;
        if self.artifact.trees.is_empty() {
            return Err(AdherixError::AttributionUnsupported(
                "artifact has no trees to attribute over".into(),
            ));
        }

        let values = vector.values();
        let mut contributions = vec![0.0; FEATURE_SCHEMA.len()];
        let mut baseline = self.artifact.base_score;

        for (tree, expectations) in self.artifact.trees.iter().zip(&self.expectations) {
            baseline += expectations[0];
            let mut idx = 0;
            loop {
                match tree.nodes[idx] {
                    Node::Leaf { .. } => break,
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        let child = if values[feature] < threshold { left } else { right };
                        contributions[feature] += expectations[child] - expectations[idx];
                        idx = child;
                    }
                }
            }
        }

        Ok((baseline, contributions))
    }
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Follow the splits to a leaf. Child indices were bounds-checked at
/// load, so indexing is safe here.
fn walk_to_leaf(tree: &Tree, values: &[f64]) -> f64 {
    let mut idx = 0;
    loop {
        match tree.nodes[idx] {
            Node::Leaf { value } => return value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                idx = if values[feature] < threshold { left } else { right };
            }
        }
    }
}

/// Expected value of every subtree, as the unweighted mean of its
/// descendant leaves. The exported artifact carries no cover counts,
/// so this approximates the training-distribution expectation; the
/// additivity invariant holds exactly regardless.
fn node_expectations(tree: &Tree) -> Vec<f64> {
    fn leaf_stats(tree: &Tree, idx: usize, out: &mut Vec<(f64, usize)>) -> (f64, usize) {
        let stats = match tree.nodes[idx] {
            Node::Leaf { value } => (value, 1),
            Node::Split { left, right, .. } => {
                let (ls, ln) = leaf_stats(tree, left, out);
                let (rs, rn) = leaf_stats(tree, right, out);
                (ls + rs, ln + rn)
            }
        };
        out[idx] = stats;
        stats
    }

    let mut stats = vec![(0.0, 0usize); tree.nodes.len()];
    leaf_stats(tree, 0, &mut stats);
    stats
        .into_iter()
        .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect()
}
