//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`validation`]: JSON Schema validation of request bodies.

pub mod tracing_layer;
pub mod validation;

pub use validation::{check_request, SchemaGate, SchemaValidation, SchemaValidationLayer};
