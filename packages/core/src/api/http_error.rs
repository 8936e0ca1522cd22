//! HTTP error handling
//!
//! Maps service errors onto consistent JSON error responses so every
//! endpoint fails the same way.

use crate::services::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "RESOURCE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "CONDITION_FAILED" => StatusCode::CONFLICT,
            "STORAGE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(inner) => {
                HttpError::new(inner.to_string(), "VALIDATION_ERROR")
            }
            ServiceError::InvalidUpdate(reason) => HttpError::new(reason, "INVALID_INPUT"),
            ServiceError::NotFound(what) => {
                HttpError::new(format!("Not found: {what}"), "RESOURCE_NOT_FOUND")
            }
            ServiceError::ConditionFailed(what) => HttpError::new(
                format!("Conditional update failed: {what}"),
                "CONDITION_FAILED",
            ),
            ServiceError::StorageUnavailable(reason) => {
                HttpError::new(reason, "STORAGE_UNAVAILABLE")
            }
            ServiceError::Generation(inner) => HttpError::with_details(
                "Content generation failed",
                "GENERATION_ERROR",
                inner.to_string(),
            ),
        }
    }
}
