//! # Setup-Time Errors
//!
//! Errors raised while turning schema text into validators. These belong to
//! deployment and configuration, not to individual requests: a schema that
//! fails to compile must stop startup or be logged loudly by the caller.

use std::path::PathBuf;

use thiserror::Error;

/// A schema source could not be compiled into a validator.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The schema text is not valid JSON.
    #[error("cannot build schema: invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The schema is valid JSON but the compiler rejected it
    /// (unknown keyword value, unresolvable `$ref`, and so on).
    #[error("cannot build schema: {reason}")]
    Rejected {
        /// Compiler diagnostic.
        reason: String,
    },
}

/// A schema file could not be read from disk.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The directory or file could not be read.
    #[error("schema load error for '{}': {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file name does not yield a usable schema name.
    #[error("schema load error for '{}': {reason}", path.display())]
    InvalidName {
        /// Path that failed.
        path: PathBuf,
        /// Why the name was rejected.
        reason: String,
    },
}
