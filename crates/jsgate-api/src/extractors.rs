//! # Schema-Bound Extractors
//!
//! [`Validated<T>`] validates the request body against the schema attached
//! to `T` (via [`BodySchema`]) and then decodes it into `T`. The schema is
//! resolved through the [`SchemaGate`] found in router state, so it is
//! compiled once and shared by every request.
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct CreateOrder { sku: String, quantity: u32 }
//!
//! impl BodySchema for CreateOrder {
//!     const SCHEMA: &'static str = include_str!("schemas/order.schema.json");
//! }
//!
//! async fn create(Validated(order): Validated<CreateOrder>) -> StatusCode { ... }
//! ```

use axum::extract::{FromRef, FromRequest, Request};
use jsgate_schema::decode_validated;
use serde::de::DeserializeOwned;

use crate::body::drain_body;
use crate::error::AppError;
use crate::middleware::SchemaGate;

/// A request type with an attached JSON Schema.
pub trait BodySchema {
    /// Schema text the body must satisfy before decoding.
    const SCHEMA: &'static str;
}

/// Body that passed `T`'s schema and decoded into `T`.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + BodySchema + Send,
    SchemaGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let gate = SchemaGate::from_ref(state);

        // Schemas bound to types are compiled lazily on first use; a failure
        // here is a deployment defect, not a client error.
        let schema = gate.cache().resolve(T::SCHEMA).map_err(|err| {
            tracing::error!(
                target_type = std::any::type_name::<T>(),
                error = %err,
                "schema attached to request type does not compile"
            );
            AppError::Internal(err.to_string())
        })?;

        let body = drain_body(&mut req, gate.body_limit()).await?;

        decode_validated::<T>(&schema, &body)
            .map(Validated)
            .map_err(AppError::from)
    }
}
