//! Maps core errors onto HTTP responses.
//!
//! Client-facing messages stay terse; the full error is logged
//! server-side before it is flattened to a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use adherix_common::error::AdherixError;

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<AdherixError> for ApiError {
    fn from(e: AdherixError) -> Self {
        match &e {
            AdherixError::DataUnavailable(msg) => {
                warn!(error = %msg, "prediction refused");
                Self {
                    status: StatusCode::NOT_FOUND,
                    message: format!("cannot predict for this patient: {msg}"),
                }
            }
            AdherixError::Timeout(_) => Self {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: "patient data lookup timed out; retry".into(),
            },
            AdherixError::Persistence(_) => {
                error!(error = %e, "strict persistence failure");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    message: "prediction could not be recorded".into(),
                }
            }
            _ => {
                // internal detail stays in the logs
                error!(error = %e, "internal error");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "internal error".into(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
