//! adherix-features — Patient snapshots and the feature extraction pipeline.
//!
//! Turns raw clinical/administrative facts into the fixed-order
//! [`adherix_common::FeatureVector`] the model was trained against.
//! Extraction is a pure read: deterministic given the same snapshot
//! and the same `as_of` instant.

pub mod extractor;
pub mod snapshot;
pub mod store;

pub use extractor::FeatureExtractor;
pub use snapshot::PatientSnapshot;
pub use store::{MockPatientStore, PatientStore};
