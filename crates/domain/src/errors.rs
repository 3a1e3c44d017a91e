//! Error taxonomy with HTTP status code mappings, per spec §7.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response format.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

/// Domain errors with HTTP status code mappings.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed payload (400 Bad Request).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Multiple validation errors (400 Bad Request).
    #[error("Validation failed")]
    ValidationErrors(Vec<String>),

    /// Schema mismatch or id mismatch (422 Unprocessable Entity).
    #[error("Schema error: {0}")]
    SchemaMismatch(String),

    /// Resource not found (404 Not Found).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing or invalid bearer token (401 Unauthorized).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403 Forbidden).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Blueprint cannot be satisfied by the item bank (409 Conflict).
    #[error("Blueprint infeasible for {blueprint_id}: {}", deficits.join(", "))]
    Infeasible {
        blueprint_id: String,
        deficits: Vec<String>,
    },

    /// Request body exceeds the configured size limit (413 Payload Too Large).
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Rate-limit bucket exhausted (429 Too Many Requests).
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    /// Request-scoped deadline expired (504 Gateway Timeout).
    #[error("Request timed out")]
    Timeout,

    /// External-table mirror rejected or timed out (502 Bad Gateway).
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Unexpected failure (500 Internal Server Error).
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    /// Persistence error (500 Internal Server Error).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) | DomainError::ValidationErrors(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::SchemaMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Infeasible { .. } => StatusCode::CONFLICT,
            DomainError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            DomainError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Upstream(_) => StatusCode::BAD_GATEWAY,
            DomainError::Internal(_) | DomainError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Create a validation error from `validator` errors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error
                            .message
                            .as_ref()
                            .unwrap_or(&std::borrow::Cow::Borrowed("validation failed"))
                    )
                })
            })
            .collect();

        if messages.is_empty() {
            DomainError::Validation("Invalid input".to_string())
        } else {
            DomainError::ValidationErrors(messages)
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if matches!(self, DomainError::Internal(_) | DomainError::Storage(_)) {
            tracing::error!("internal error: {}", self);
        }

        let mut response = match &self {
            DomainError::ValidationErrors(details) => (
                status,
                Json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    issues: Some(details.clone()),
                }),
            )
                .into_response(),
            DomainError::Infeasible { deficits, .. } => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                    issues: Some(deficits.clone()),
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                    issues: None,
                }),
            )
                .into_response(),
        };

        if let DomainError::RateLimited { retry_after_secs } = &self {
            response.headers_mut().insert(
                axum::http::header::RETRY_AFTER,
                axum::http::HeaderValue::from_str(&retry_after_secs.to_string())
                    .expect("retry-after is a valid header value"),
            );
        }

        response
    }
}
