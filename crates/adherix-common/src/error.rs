use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdherixError {
    /// Patient not found or required source facts missing. Client-facing.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A collaborator returned a field of a type that cannot be coerced.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Feature vector does not match what the model was trained against.
    #[error("Feature shape error: expected {expected} features, got {actual}")]
    FeatureShape { expected: usize, actual: usize },

    /// Model artifact missing or corrupt. Fatal at startup.
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Cache service unreachable. Absorbed by the feature cache.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Prediction audit write failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Attribution could not be computed for this model.
    #[error("Attribution unsupported: {0}")]
    AttributionUnsupported(String),

    /// A collaborator call exceeded its deadline. Retryable.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdherixError {
    /// Should the caller see this as their fault (4xx-equivalent)?
    pub fn is_client_error(&self) -> bool {
        matches!(self, AdherixError::DataUnavailable(_))
    }

    /// May the caller retry the same request and expect success?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdherixError::Timeout(_) | AdherixError::CacheUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdherixError>;
