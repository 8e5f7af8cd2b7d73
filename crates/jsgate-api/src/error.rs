//! # Rejection-to-Response Mapping
//!
//! [`AppError`] implements `axum::response::IntoResponse` and is the single
//! place where body rejections become HTTP responses:
//!
//! | Rejection | Status | Body |
//! |-----------|--------|------|
//! | malformed input (any kind) | 400 | `{"message":"Invalid json body"}` |
//! | schema violation | 400 | `{"messages":["...", ...]}` |
//! | internal failure | 500 | empty |
//! | body over the buffering limit | 500 | empty (logged at `warn`) |
//!
//! Internal causes are logged here and never written to the response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsgate_schema::{BodyRejection, MalformedInput, ValidationOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::DrainError;

/// Message returned for every malformed body.
pub const INVALID_JSON_BODY: &str = "Invalid json body";

/// Body of a 400 for malformed input.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvalidBodyResponse {
    pub message: String,
}

/// Body of a 400 for schema violations.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationsResponse {
    pub messages: Vec<String>,
}

/// A request that must not reach its handler.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, empty, or non-JSON body (400).
    #[error("invalid json body: {0}")]
    InvalidBody(MalformedInput),

    /// Body breaks the schema (400). One message per violation.
    #[error("schema validation failed: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    /// Body longer than the buffering limit (500). Logged at `warn`.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Anything the client cannot fix (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::SchemaViolation(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BodyRejection> for AppError {
    fn from(rejection: BodyRejection) -> Self {
        match rejection {
            BodyRejection::MalformedInput(kind) => Self::InvalidBody(kind),
            BodyRejection::SchemaViolation(violations) => {
                Self::SchemaViolation(violations.messages())
            }
            BodyRejection::Internal(cause) => Self::Internal(cause),
        }
    }
}

impl From<DrainError> for AppError {
    fn from(err: DrainError) -> Self {
        match err {
            DrainError::TooLarge { limit } => Self::BodyTooLarge { limit },
            other => other.into_rejection().into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InvalidBody(kind) => {
                tracing::debug!(reason = %kind, "rejected malformed body");
                let body = InvalidBodyResponse {
                    message: INVALID_JSON_BODY.to_string(),
                };
                (status, Json(body)).into_response()
            }
            Self::SchemaViolation(messages) => {
                tracing::debug!(count = messages.len(), "rejected body failing schema");
                (status, Json(ViolationsResponse { messages })).into_response()
            }
            Self::BodyTooLarge { limit } => {
                tracing::warn!(limit, "request body over limit");
                status.into_response()
            }
            Self::Internal(cause) => {
                tracing::error!(error = %cause, "internal error while checking request body");
                status.into_response()
            }
        }
    }
}

/// Decide whether the chain continues.
///
/// `Ok(())` lets the request through; `Err` carries the response that ends
/// the chain.
pub fn respond(outcome: ValidationOutcome) -> Result<(), AppError> {
    outcome.into_result().map_err(AppError::from)
}
