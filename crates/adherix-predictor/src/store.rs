//! Trait for prediction persistence.
//!
//! Append-only by contract: a new prediction is a new row, never an
//! update. The database adapter lives in adherix-db; the in-memory
//! implementations here keep the orchestrator testable on its own.

use std::sync::Mutex;

use async_trait::async_trait;

use adherix_common::error::{AdherixError, Result};
use adherix_common::prediction::PredictionResult;

/// Outbound boundary to the prediction audit store.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist one prediction. Append-only.
    async fn save(&self, prediction: &PredictionResult) -> Result<()>;
}

/// In-memory append-only store for tests and single-process use.
pub struct MemoryPredictionStore {
    saved: Mutex<Vec<PredictionResult>>,
}

impl MemoryPredictionStore {
    pub fn new() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<PredictionResult> {
        self.saved.lock().expect("prediction store lock").clone()
    }

    pub fn len(&self) -> usize {
        self.saved.lock().expect("prediction store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryPredictionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionStore for MemoryPredictionStore {
    async fn save(&self, prediction: &PredictionResult) -> Result<()> {
        self.saved
            .lock()
            .expect("prediction store lock")
            .push(prediction.clone());
        Ok(())
    }
}

/// Simulates a down audit store: every write fails.
pub struct FailingPredictionStore;

#[async_trait]
impl PredictionStore for FailingPredictionStore {
    async fn save(&self, _prediction: &PredictionResult) -> Result<()> {
        Err(AdherixError::Persistence("write refused".into()))
    }
}
