//! # Re-readable Request Bodies
//!
//! [`drain_body`] reads a request body into memory once and puts an
//! equivalent, unread body back on the request, so whatever runs next
//! (the handler, an extractor, another layer) sees the original content.

use std::error::Error as _;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use http_body_util::LengthLimitError;
use jsgate_schema::{BodyRejection, MalformedInput};
use thiserror::Error;

/// Default cap on buffered body size: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The body could not be drained.
#[derive(Error, Debug)]
pub enum DrainError {
    /// The request carries no body bytes.
    #[error("request body is empty")]
    EmptyBody,

    /// The body is longer than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// Reading failed partway: transport error or cancellation.
    #[error("failed to read request body: {0}")]
    ReadFailure(#[source] axum::Error),
}

impl DrainError {
    /// Classify a drain failure as a body rejection.
    ///
    /// A read that ended because the stream hit end-of-file early counts as
    /// an empty body; every other read failure is internal.
    pub fn into_rejection(self) -> BodyRejection {
        match self {
            Self::EmptyBody => MalformedInput::Empty.into(),
            Self::ReadFailure(cause) if is_unexpected_eof(&cause) => MalformedInput::Empty.into(),
            Self::TooLarge { limit } => {
                BodyRejection::Internal(format!("request body exceeds {limit} bytes"))
            }
            Self::ReadFailure(cause) => BodyRejection::Internal(format!("{cause:#}")),
        }
    }
}

/// Read the whole body of `request` (at most `limit` bytes) and restore it.
///
/// On success the returned bytes and the request's new body are identical.
/// Draining the same request again yields the same bytes.
pub async fn drain_body(request: &mut Request, limit: usize) -> Result<Bytes, DrainError> {
    let body = std::mem::take(request.body_mut());
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|err| {
        if exceeds_limit(&err) {
            DrainError::TooLarge { limit }
        } else {
            DrainError::ReadFailure(err)
        }
    })?;

    *request.body_mut() = Body::from(bytes.clone());

    if bytes.is_empty() {
        return Err(DrainError::EmptyBody);
    }
    Ok(bytes)
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

fn is_unexpected_eof(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::UnexpectedEof {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
