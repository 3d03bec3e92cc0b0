//! adherix-web — HTTP service for the IIT risk prediction core.
//! Exposes:
//!   - Single and batch prediction endpoints
//!   - Model version and feature schema introspection
//!   - Process metrics
//!   - SSE stream of scored predictions

pub mod error;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;
