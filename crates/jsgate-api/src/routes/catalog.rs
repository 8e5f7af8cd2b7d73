//! `POST /v1/validate/{name}` for every schema in the loaded catalog.
//!
//! Each route carries its own validation layer over the schema compiled at
//! bootstrap. Names that are not in the catalog are not routed (404).

use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::middleware::SchemaValidationLayer;
use crate::state::AppState;

/// Response for a body that passed a catalog schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVerdict {
    pub schema: String,
    pub valid: bool,
}

pub fn router(state: &AppState) -> Router<AppState> {
    state
        .catalog
        .iter()
        .fold(Router::new(), |router, (name, schema)| {
            let layer = SchemaValidationLayer::new(Arc::clone(schema))
                .with_body_limit(state.gate.body_limit());
            let verdict = CatalogVerdict {
                schema: name.clone(),
                valid: true,
            };
            let handler = move || async move { Json(verdict) };

            tracing::debug!(schema = %name, "mounting catalog route");
            router.route(
                &format!("/v1/validate/{name}"),
                post(handler).route_layer(layer),
            )
        })
}
