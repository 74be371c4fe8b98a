//! HTTP error types for the `sharedesk` server.
//!
//! Maps domain errors from `sharedesk-core` and `sharedesk-store` into HTTP
//! responses. Every error produces a JSON body of the form
//! `{"success": false, "error": <machine-readable code>, "message": <text>}`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use sharedesk_core::{RecordError, SchemaError, SchemaValidationError};
use sharedesk_store::StoreError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Requested collection or record not found.
    NotFound(String),
    /// Client sent invalid input.
    BadRequest(String),
    /// A conflict (e.g., duplicate record id).
    Conflict(String),
    /// The request body exceeds the configured limit.
    PayloadTooLarge(String),
    /// The storage nodes failed or could not be reached.
    Upstream(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg),
            Self::Upstream(msg) => {
                tracing::error!(error = %msg, "record store failure");
                (StatusCode::BAD_GATEWAY, "upstream_error", msg)
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Duplicate { .. } => Self::Conflict(err.to_string()),
            StoreError::Unsupported { .. }
            | StoreError::InvalidConfig { .. }
            | StoreError::Rejected { .. } => Self::BadRequest(err.to_string()),
            StoreError::Backend { .. } => Self::Upstream(err.to_string()),
        }
    }
}

impl From<SchemaValidationError> for AppError {
    fn from(err: SchemaValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidRequest { .. } | RecordError::Schema(_) => {
                Self::BadRequest(err.to_string())
            }
            RecordError::Store(inner) => inner.into(),
            RecordError::UpdateFailed { .. } => Self::Upstream(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `axum::Json` with rejections rendered as [`AppError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` with rejections rendered as [`AppError`] bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status() {
        let cases = [
            (StoreError::collection_not_found("c"), StatusCode::NOT_FOUND),
            (
                StoreError::Duplicate {
                    what: "record",
                    id: "r".to_owned(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::InvalidConfig {
                    reason: "no key".to_owned(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Backend {
                    reason: "down".to_owned(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn record_store_error_keeps_store_mapping() {
        let err = RecordError::Store(StoreError::collection_not_found("c"));
        assert_eq!(AppError::from(err).into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn schema_validation_is_bad_request() {
        let err = SchemaValidationError::NotAnArray;
        assert_eq!(AppError::from(err).into_response().status(), StatusCode::BAD_REQUEST);
    }
}
