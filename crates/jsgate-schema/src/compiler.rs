//! # Schema Compilation
//!
//! The [`SchemaCompiler`] trait is the seam between the cache and the
//! JSON Schema engine. [`JsonSchemaCompiler`] is the production
//! implementation backed by the `jsonschema` crate; tests substitute their
//! own compilers to observe how often compilation happens.

use std::fmt;
use std::str::FromStr;

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::error::CompileError;
use crate::source::SchemaSource;
use crate::validate::{ValidationViolations, Violation};

/// JSON Schema dialects that can be forced at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Dialect {
    fn to_draft(self) -> Draft {
        match self {
            Self::Draft4 => Draft::Draft4,
            Self::Draft6 => Draft::Draft6,
            Self::Draft7 => Draft::Draft7,
            Self::Draft201909 => Draft::Draft201909,
            Self::Draft202012 => Draft::Draft202012,
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "draft4" | "draft-04" => Ok(Self::Draft4),
            "6" | "draft6" | "draft-06" => Ok(Self::Draft6),
            "7" | "draft7" | "draft-07" => Ok(Self::Draft7),
            "2019-09" | "draft2019-09" | "draft201909" => Ok(Self::Draft201909),
            "2020-12" | "draft2020-12" | "draft202012" => Ok(Self::Draft202012),
            other => Err(format!("unknown JSON Schema dialect: {other}")),
        }
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Force a dialect. `None` detects it from `$schema`, falling back to
    /// the engine default.
    pub dialect: Option<Dialect>,
    /// Treat `format` keywords as assertions instead of annotations.
    pub validate_formats: bool,
}

/// Turns schema text into a validator.
pub trait SchemaCompiler: Send + Sync {
    /// Compile `source`. Must not have side effects beyond the compile.
    fn compile(&self, source: &SchemaSource) -> Result<Validator, CompileError>;
}

/// [`SchemaCompiler`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaCompiler {
    options: SchemaOptions,
}

impl JsonSchemaCompiler {
    /// Create a compiler with explicit options.
    pub fn new(options: SchemaOptions) -> Self {
        Self { options }
    }
}

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, source: &SchemaSource) -> Result<Validator, CompileError> {
        let schema: Value = serde_json::from_str(source.as_str())?;

        let mut opts = jsonschema::options();
        if let Some(dialect) = self.options.dialect {
            opts.with_draft(dialect.to_draft());
        }
        opts.should_validate_formats(self.options.validate_formats);

        opts.build(&schema).map_err(|e| CompileError::Rejected {
            reason: e.to_string(),
        })
    }
}

/// A validator together with the source it was compiled from.
///
/// Immutable once built; share it behind an `Arc` and validate against it
/// from any number of threads.
pub struct CompiledSchema {
    source: SchemaSource,
    validator: Validator,
}

impl CompiledSchema {
    /// Pair a compiled validator with its source.
    pub fn new(source: SchemaSource, validator: Validator) -> Self {
        Self { source, validator }
    }

    /// Compile `source` directly, bypassing any cache.
    pub fn compile(source: SchemaSource, compiler: &dyn SchemaCompiler) -> Result<Self, CompileError> {
        let validator = compiler.compile(&source)?;
        Ok(Self::new(source, validator))
    }

    /// The text this schema was compiled from.
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Check a parsed document, collecting every violation in the order the
    /// validator reports them.
    pub fn validate_value(&self, instance: &Value) -> Result<(), ValidationViolations> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationViolations::new(violations))
        }
    }

    /// True if `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("source_len", &self.source.as_str().len())
            .finish_non_exhaustive()
    }
}
