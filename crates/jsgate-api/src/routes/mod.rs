//! # API Route Modules
//!
//! - `example`: a value-integer endpoint guarded by a validation layer, and a
//!   typed binding endpoint using [`crate::extractors::Validated`].
//! - `catalog`: one validation endpoint per schema loaded from the schema
//!   directory.

pub mod catalog;
pub mod example;
