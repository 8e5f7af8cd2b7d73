//! # Check Subcommand
//!
//! Compiles each schema file and reports the ones that do not compile.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use jsgate_schema::{CompiledSchema, SchemaCompiler, SchemaSource};

use crate::CompilerArgs;

/// Arguments for the `jsgate check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema files to compile.
    #[arg(value_name = "SCHEMA", required = true)]
    pub schemas: Vec<PathBuf>,

    #[command(flatten)]
    pub compiler: CompilerArgs,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when every schema compiles, 1 otherwise. An
/// unreadable file is an operational error.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let compiler = args.compiler.compiler();
    let failed = check_all(&args.schemas, &compiler)?;

    println!(
        "Schemas: {}/{} compiled",
        args.schemas.len() - failed,
        args.schemas.len()
    );
    Ok(u8::from(failed > 0))
}

fn check_all(paths: &[PathBuf], compiler: &dyn SchemaCompiler) -> Result<usize> {
    let mut failed = 0;
    for path in paths {
        let source = SchemaSource::from_file(path)?;
        match CompiledSchema::compile(source, compiler) {
            Ok(_) => {
                tracing::debug!(path = %path.display(), "schema compiled");
                println!("  OK: {}", path.display());
            }
            Err(e) => {
                failed += 1;
                println!("  FAIL: {}: {e}", path.display());
            }
        }
    }
    Ok(failed)
}
