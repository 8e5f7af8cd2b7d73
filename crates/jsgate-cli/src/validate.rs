//! # Validate Subcommand
//!
//! Validates a JSON document against a schema file. The document goes
//! through the same classification as a request body on the server: empty
//! and unparsable input is malformed, parsed input is checked against the
//! schema and every violation is reported.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use jsgate_schema::{
    validate_body, BodyRejection, CompiledSchema, SchemaSource, ValidationOutcome,
};
use serde_json::json;

use crate::CompilerArgs;

/// Arguments for the `jsgate validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file the document must satisfy.
    #[arg(long, short, value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Document to validate. `-` reads standard input.
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub compiler: CompilerArgs,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the document is valid, 1 when it is rejected.
/// An unreadable file or a schema that does not compile is an operational
/// error.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let source = SchemaSource::from_file(&args.schema)?;
    let schema = CompiledSchema::compile(source, &args.compiler.compiler())
        .with_context(|| format!("schema {} does not compile", args.schema.display()))?;

    let document = read_document(&args.document)?;
    let outcome = validate_body(&schema, &document);
    tracing::debug!(valid = outcome.is_valid(), "document classified");

    report(outcome, args.json)
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read document from stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("failed to read document {}", path.display()))
}

fn report(outcome: ValidationOutcome, as_json: bool) -> Result<u8> {
    let messages = match outcome.into_result() {
        Ok(()) => Vec::new(),
        Err(BodyRejection::MalformedInput(e)) => vec![format!("invalid json: {e}")],
        Err(BodyRejection::SchemaViolation(v)) => v.messages(),
        Err(BodyRejection::Internal(reason)) => bail!("validation failed: {reason}"),
    };
    let valid = messages.is_empty();

    if as_json {
        println!("{}", json!({ "valid": valid, "messages": messages }));
    } else if valid {
        println!("valid");
    } else {
        println!("invalid:");
        for message in &messages {
            println!("  - {message}");
        }
    }

    Ok(u8::from(!valid))
}
