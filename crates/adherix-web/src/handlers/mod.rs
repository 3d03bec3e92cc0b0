//! HTTP handlers for all web routes.

pub mod metrics;
pub mod model;
pub mod predict;
pub mod system;
