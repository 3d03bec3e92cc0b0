//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use adherix_predictor::Predictor;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A single prediction was scored
    PredictionScored {
        patient_id: String,
        risk_level: String,
        probability: f64,
    },
    /// A batch run finished
    BatchCompleted { total: usize, failed: usize },
    /// General system notification
    Notification { level: String, message: String },
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            predictor,
            event_tx,
            started_at: Instant::now(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Publish an event; a send error only means nobody is listening.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
