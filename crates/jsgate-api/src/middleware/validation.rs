//! # JSON Schema Validation Layer
//!
//! Tower layer that checks the request body against a compiled schema before
//! the wrapped service runs. On a valid body the request continues with its
//! body restored; otherwise the layer answers with the mapped [`AppError`]
//! response and the inner service is never called.
//!
//! ```ignore
//! let gate = SchemaGate::new(SchemaCache::new());
//! let app = Router::new().route(
//!     "/orders",
//!     post(create_order).route_layer(gate.layer(ORDER_SCHEMA)?),
//! );
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use jsgate_schema::{validate_body, CompileError, CompiledSchema, SchemaCache};
use tower::{Layer, Service};

use crate::body::{drain_body, DEFAULT_BODY_LIMIT};
use crate::error::{respond, AppError};

/// Drain `request` and check its body against `schema`.
///
/// On `Ok` the request carries its restored body; `Err` is the response that
/// ends the chain.
pub async fn check_request(
    request: &mut Request,
    schema: &CompiledSchema,
    body_limit: usize,
) -> Result<(), AppError> {
    let body = drain_body(request, body_limit).await?;
    respond(validate_body(schema, &body))
}

/// Builds validation layers from schema text through a shared cache.
#[derive(Debug, Clone)]
pub struct SchemaGate {
    cache: SchemaCache,
    body_limit: usize,
}

impl SchemaGate {
    /// Gate over `cache` with the default body limit.
    pub fn new(cache: SchemaCache) -> Self {
        Self {
            cache,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the maximum buffered body size.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// The shared cache.
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Maximum buffered body size.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Compile (or fetch) `source` and build a layer for it.
    ///
    /// Call this while assembling the router so that a schema that does not
    /// compile stops startup instead of failing requests.
    pub fn layer(&self, source: impl AsRef<str>) -> Result<SchemaValidationLayer, CompileError> {
        let schema = self.cache.resolve(source)?;
        Ok(SchemaValidationLayer::new(schema).with_body_limit(self.body_limit))
    }
}

/// Layer validating request bodies against one compiled schema.
#[derive(Debug, Clone)]
pub struct SchemaValidationLayer {
    schema: Arc<CompiledSchema>,
    body_limit: usize,
}

impl SchemaValidationLayer {
    /// Layer over an already compiled schema.
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self {
            schema,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the maximum buffered body size.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// The schema this layer enforces.
    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }
}

impl<S> Layer<S> for SchemaValidationLayer {
    type Service = SchemaValidation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SchemaValidation {
            inner,
            schema: Arc::clone(&self.schema),
            body_limit: self.body_limit,
        }
    }
}

/// Service produced by [`SchemaValidationLayer`].
#[derive(Debug, Clone)]
pub struct SchemaValidation<S> {
    inner: S,
    schema: Arc<CompiledSchema>,
    body_limit: usize,
}

impl<S> Service<Request> for SchemaValidation<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // Keep the service that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let schema = Arc::clone(&self.schema);
        let body_limit = self.body_limit;

        Box::pin(async move {
            match check_request(&mut request, &schema, body_limit).await {
                Ok(()) => inner.call(request).await,
                Err(err) => {
                    tracing::debug!(status = %err.status(), "request body rejected");
                    Ok(err.into_response())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use jsgate_schema::MalformedInput;

    const VALUE_SCHEMA: &str = r#"{
        "type": "object",
        "properties": { "value": { "type": "integer" } },
        "required": ["value"]
    }"#;

    fn post(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn check_request_restores_body_on_success() {
        let schema = SchemaCache::new().resolve(VALUE_SCHEMA).unwrap();
        let mut req = post(r#"{"value": 1}"#);
        assert!(check_request(&mut req, &schema, DEFAULT_BODY_LIMIT).await.is_ok());

        let rest = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&rest[..], br#"{"value": 1}"#);
    }

    #[tokio::test]
    async fn check_request_classifies_empty_body() {
        let schema = SchemaCache::new().resolve(VALUE_SCHEMA).unwrap();
        let mut req = post("");
        let err = check_request(&mut req, &schema, DEFAULT_BODY_LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidBody(MalformedInput::Empty)));
    }

    #[tokio::test]
    async fn check_request_flags_over_limit_body() {
        let schema = SchemaCache::new().resolve(VALUE_SCHEMA).unwrap();
        let mut req = post(r#"{"value": 1234567890123456789}"#);
        let err = check_request(&mut req, &schema, 16).await.unwrap_err();
        assert!(matches!(err, AppError::BodyTooLarge { limit: 16 }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn gate_layers_share_cached_schema() {
        let gate = SchemaGate::new(SchemaCache::new()).with_body_limit(1024);
        let a = gate.layer(VALUE_SCHEMA).unwrap();
        let b = gate.layer(VALUE_SCHEMA).unwrap();
        assert!(Arc::ptr_eq(a.schema(), b.schema()));
        assert_eq!(gate.cache().len(), 1);
        assert_eq!(a.body_limit, 1024);
    }

    #[test]
    fn gate_refuses_uncompilable_schema() {
        let gate = SchemaGate::new(SchemaCache::new());
        assert!(gate.layer(r#"{"a": "#).is_err());
        assert!(gate.cache().is_empty());
    }

    #[tokio::test]
    async fn service_short_circuits_invalid_body() {
        use tower::ServiceExt;

        let schema = SchemaCache::new().resolve(VALUE_SCHEMA).unwrap();
        let inner = tower::service_fn(|_req: Request| async {
            Ok::<_, std::convert::Infallible>(StatusCode::IM_A_TEAPOT.into_response())
        });
        let svc = SchemaValidationLayer::new(schema).layer(inner);

        let rejected = svc.clone().oneshot(post(r#"{"value": "bad"}"#)).await.unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let passed = svc.oneshot(post(r#"{"value": 7}"#)).await.unwrap();
        assert_eq!(passed.status(), StatusCode::IM_A_TEAPOT);
    }
}
