//! adherix-db — PostgreSQL adapters for the prediction core.
//!
//! Implements the `PatientStore` and `PredictionStore` boundary traits
//! over tokio-postgres. The wider clinical schema (patients, visits,
//! observations CRUD) belongs to the surrounding system; this crate
//! only reads the flattened feature-facts view and appends to the
//! predictions audit table.

pub mod database;
pub mod patients;
pub mod predictions;
pub mod schema;

pub use database::Database;
pub use patients::PgPatientStore;
pub use predictions::PgPredictionStore;
