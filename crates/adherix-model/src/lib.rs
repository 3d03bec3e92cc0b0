//! adherix-model — The frozen gradient-boosted classifier.
//!
//! Training happens offline; this crate only loads the exported
//! artifact and scores dense feature vectors. The loaded model is
//! immutable and `Send + Sync`, shared by reference across every
//! request without synchronization.

pub mod artifact;
pub mod gbdt;

pub use artifact::{GbdtArtifact, Node, Tree};
pub use gbdt::GbdtModel;
