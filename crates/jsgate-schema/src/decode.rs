//! # Typed Decoding
//!
//! Validation first, then deserialization of the same bytes.
//!
//! Schema conformance does not imply that the bytes fit the target type:
//! a schema may allow integers beyond `i32`, or accept a field the target
//! type does not know when it uses `deny_unknown_fields`. Such mismatches are
//! a disagreement between the schema and the Rust type, so they surface as
//! [`BodyRejection::Internal`] rather than as client errors.

use serde::de::DeserializeOwned;

use crate::compiler::CompiledSchema;
use crate::validate::{validate_body, BodyRejection};

/// Validate `body` against `schema` and decode it into `T`.
pub fn decode_validated<T: DeserializeOwned>(
    schema: &CompiledSchema,
    body: &[u8],
) -> Result<T, BodyRejection> {
    validate_body(schema, body).into_result()?;

    serde_json::from_slice(body).map_err(|e| {
        BodyRejection::Internal(format!(
            "validated body does not decode into {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}
