//! Error responses.
//!
//! Every failure a handler can produce is an [`ApiError`]. Client errors are
//! rendered as `{"status": "fail", "message": ...}`, server errors as
//! `{"status": "error", "message": ...}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use teatrade_core::{DomainError, ValidationFailure};
use teatrade_infra::store::{ErrorClass, StoreError, classify};
use teatrade_infra::Retryable;
use teatrade_trading::SheetError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("You do not have permission to perform this action".into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg) => Self::BadRequest(msg),
            DomainError::NotFound => Self::NotFound("record not found".into()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Forbidden => Self::forbidden(),
        }
    }
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl Retryable for ApiError {
    fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(failure) => fail(StatusCode::BAD_REQUEST, failure.message()),
            Self::BadRequest(msg) => fail(StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => fail(StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => fail(StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => fail(StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => fail(StatusCode::CONFLICT, msg),
            Self::Store(err) => store_error_response(err),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                internal_error()
            }
        }
    }
}

fn store_error_response(err: StoreError) -> Response {
    match (&err, classify(&err)) {
        (StoreError::NotFound, _) => fail(StatusCode::NOT_FOUND, "record not found"),
        (_, ErrorClass::Conflict) => fail(StatusCode::CONFLICT, "record already exists"),
        (StoreError::RetriesExhausted { .. }, _) => {
            tracing::error!(error = %err, "giving up on transaction");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "error",
                "The service is busy. Please retry the request.",
            )
        }
        _ => {
            tracing::error!(error = %err, "store error");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "error", "Internal server error")
}

pub fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    json_error(status, "fail", message)
}

pub fn json_error(status: StatusCode, tag: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "status": tag,
            "message": message.into(),
        })),
    )
        .into_response()
}
