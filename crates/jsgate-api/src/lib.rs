//! # jsgate-api: JSON Schema Request Validation for Axum
//!
//! Validates request bodies against JSON Schemas before they reach a handler,
//! and maps every rejection to a fixed HTTP response shape.
//!
//! ## Integration styles
//!
//! - [`middleware::SchemaValidationLayer`]: a tower layer in front of a
//!   route. Invalid bodies are answered by the layer; valid bodies reach the
//!   handler with the body restored.
//! - [`extractors::Validated<T>`]: validate against `T`'s schema, then decode
//!   into `T`.
//!
//! ## API Surface
//!
//! | Route | Module | Behavior |
//! |-------|--------|----------|
//! | `POST /` | [`routes::example`] | 200 when the body has an integer `value` |
//! | `POST /v1/bind` | [`routes::example`] | echoes the decoded [`routes::example::BindRequest`] |
//! | `POST /v1/validate/{name}` | [`routes::catalog`] | one route per schema in the schema directory |
//! | `GET /health/*` | here | liveness and readiness probes |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → DefaultBodyLimit → SchemaValidationLayer (per route) → Handler
//! ```

pub mod body;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use jsgate_schema::CompileError;

use crate::state::AppState;

/// Assemble the application router.
///
/// Every route-level schema is compiled here, so a schema that does not
/// compile is reported before the server starts listening.
pub fn app(state: AppState) -> Result<Router, CompileError> {
    let body_limit = state.config.body_limit;

    let api = Router::new()
        .merge(routes::example::router(&state)?)
        .merge(routes::catalog::router(&state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Ok(Router::new().merge(health).merge(api))
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
