//! Error handling for the course-library HTTP layer.
//!
//! Every failure a handler returns becomes an RFC 9457 style problem
//! document: a type reference, numeric status, title/detail, and (for
//! validation failures) an `errors` map of field to messages.

use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Field-addressed error detail carried by 422 responses.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {message}")]
    Validation {
        errors: FieldErrors,
        message: String,
    },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error carrying field-level detail
    pub fn validation(errors: FieldErrors, message: impl Into<String>) -> Self {
        Self::Validation {
            errors,
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, problem_type, title, detail, errors) = match self {
            AppError::Validation { errors, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "https://datatracker.ietf.org/doc/html/rfc4918#section-11.2",
                "Unprocessable Entity",
                message,
                Some(errors),
            ),
            AppError::Conflict { message } => (
                StatusCode::CONFLICT,
                "https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.10",
                "Conflict",
                message,
                None,
            ),
            AppError::NotFound { message } => (
                StatusCode::NOT_FOUND,
                "https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5",
                "Not Found",
                message,
                None,
            ),
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                "https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1",
                "Bad Request",
                message,
                None,
            ),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1",
                "Internal Server Error",
                e.to_string(),
                None,
            ),
        };

        tracing::error!(
            trace_id = %trace_id,
            status_code = %status.as_u16(),
            detail = %detail,
            "request error"
        );

        // In production, hide internal error details from callers.
        let detail = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR {
            "an internal server error occurred".to_string()
        } else {
            detail
        };

        let mut body = json!({
            "type": problem_type,
            "title": title,
            "status": status.as_u16(),
            "detail": detail,
            "trace_id": trace_id.to_string(),
            "timestamp": timestamp,
        });
        if let Some(errors) = errors {
            body["errors"] = json!(errors);
        }

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    fn field_errors(field: &str, message: &str) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        errors
    }

    #[test]
    fn validation_error_keeps_field_detail() {
        let error = AppError::validation(field_errors("title", "title is required"), "invalid");

        match error {
            AppError::Validation { errors, message } => {
                assert_eq!(errors["title"], vec!["title is required".to_string()]);
                assert_eq!(message, "invalid");
            }
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::bad_request("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::conflict("x").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::validation(FieldErrors::new(), "x")
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn problem_body_carries_the_envelope() {
        let error = AppError::validation(field_errors("title", "title is required"), "invalid");
        let response = error.into_response();

        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/problem+json")
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], 422);
        assert_eq!(body["title"], "Unprocessable Entity");
        assert_eq!(body["errors"]["title"][0], "title is required");
        assert!(body["trace_id"].is_string());
        assert!(body["timestamp"].is_string());
    }
}
