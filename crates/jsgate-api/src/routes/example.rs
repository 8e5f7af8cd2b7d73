//! Built-in endpoints demonstrating both integration styles.
//!
//! - `POST /` is wrapped in a [`crate::middleware::SchemaValidationLayer`];
//!   the handler only runs for bodies that pass [`EXAMPLE_SCHEMA`].
//! - `POST /v1/bind` validates and decodes through
//!   [`Validated<BindRequest>`] and echoes the decoded value.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use jsgate_schema::CompileError;
use serde::{Deserialize, Serialize};

use crate::extractors::{BodySchema, Validated};
use crate::state::AppState;

/// Object with a required integer `value`.
pub const EXAMPLE_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "value": { "type": "integer" }
    },
    "required": ["value"]
}"#;

/// Body accepted by `POST /v1/bind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRequest {
    pub value1: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<bool>,
}

impl BodySchema for BindRequest {
    const SCHEMA: &'static str = r#"{
        "type": "object",
        "properties": {
            "value1": { "type": "integer" },
            "value2": { "type": "boolean" }
        },
        "required": ["value1"],
        "additionalProperties": false
    }"#;
}

/// Build the example router. Fails if [`EXAMPLE_SCHEMA`] or the
/// [`BindRequest`] schema does not compile.
pub fn router(state: &AppState) -> Result<Router<AppState>, CompileError> {
    let value_layer = state.gate.layer(EXAMPLE_SCHEMA)?;
    state.gate.cache().preload([BindRequest::SCHEMA])?;

    Ok(Router::new()
        .route("/", post(accept).route_layer(value_layer))
        .route("/v1/bind", post(bind)))
}

async fn accept() -> StatusCode {
    StatusCode::OK
}

async fn bind(Validated(request): Validated<BindRequest>) -> Json<BindRequest> {
    tracing::debug!(value1 = request.value1, value2 = ?request.value2, "bound request");
    Json(request)
}
