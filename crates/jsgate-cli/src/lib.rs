//! # jsgate-cli: CLI Tool for jsgate
//!
//! ## Subcommands
//!
//! - `jsgate check`: Compile one or more schema files and report failures.
//! - `jsgate validate`: Validate a JSON document against a schema file,
//!   classifying it exactly as the server would.
//!
//! ```bash
//! jsgate check schemas/*.schema.json
//! jsgate validate --schema schemas/order.schema.json order.json
//! ```
//!
//! Exit codes: 0 valid, 1 rejected, 2 operational error.

pub mod check;
pub mod validate;

use clap::Args;
use jsgate_schema::{Dialect, JsonSchemaCompiler, SchemaOptions};

/// Compiler flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CompilerArgs {
    /// Force a JSON Schema draft (draft4, draft6, draft7, 2019-09, 2020-12).
    /// Detected from `$schema` when omitted.
    #[arg(long, value_name = "DRAFT")]
    pub draft: Option<Dialect>,

    /// Assert `format` keywords instead of treating them as annotations.
    #[arg(long)]
    pub validate_formats: bool,
}

impl CompilerArgs {
    pub fn options(&self) -> SchemaOptions {
        SchemaOptions {
            dialect: self.draft,
            validate_formats: self.validate_formats,
        }
    }

    pub fn compiler(&self) -> JsonSchemaCompiler {
        JsonSchemaCompiler::new(self.options())
    }
}
