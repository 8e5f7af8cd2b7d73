//! # jsgate-schema: Schema Cache & Body Classification
//!
//! The framework-independent half of jsgate. Everything here operates on
//! schema text and raw body bytes; the HTTP plumbing lives in `jsgate-api`.
//!
//! ## Schema Resolution (`cache`)
//!
//! [`SchemaCache`] maps a [`SchemaSource`] (the verbatim schema text) to a
//! shared [`CompiledSchema`]. Lookups take a shared read lock; the exclusive
//! lock is only taken on a miss, where the entry is re-checked before the
//! [`SchemaCompiler`] runs. Each distinct source is compiled at most once.
//! Compile failures are returned, never cached.
//!
//! ## Body Classification (`validate`)
//!
//! [`validate_body`] turns drained bytes into a [`ValidationOutcome`]:
//!
//! - empty or whitespace-only → [`MalformedInput::Empty`]
//! - JSON syntax error → [`MalformedInput::Syntax`]
//! - document ends mid-value → [`MalformedInput::Truncated`]
//! - schema non-conformance → [`BodyRejection::SchemaViolation`]
//! - anything else → [`BodyRejection::Internal`]
//!
//! ## Typed Decoding (`decode`)
//!
//! [`decode_validated`] validates first and only then deserializes the same
//! bytes into the caller's type. A decode failure after a passing validation
//! is an internal failure, not a client error.
//!
//! ## Crate Policy
//!
//! - No HTTP types. Callers hand in bytes and receive classified outcomes.
//! - Schema compile errors are setup-time errors and are surfaced as
//!   [`CompileError`]; they are never folded into a per-body outcome.

pub mod cache;
pub mod compiler;
pub mod decode;
pub mod error;
pub mod source;
pub mod validate;

pub use cache::SchemaCache;
pub use compiler::{CompiledSchema, Dialect, JsonSchemaCompiler, SchemaCompiler, SchemaOptions};
pub use decode::decode_validated;
pub use error::{CompileError, SchemaLoadError};
pub use source::{SchemaCatalog, SchemaSource};
pub use validate::{
    validate_body, BodyRejection, MalformedInput, ValidationOutcome, ValidationViolations,
    Violation,
};
