//! # Check Subcommand
//!
//! Validates one data document against one schema document.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use brand_schema::{SchemaValidator, ValidatorConfig};
use clap::Args;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema document (JSON or YAML).
    pub schema: PathBuf,

    /// Data document to validate (JSON or YAML).
    pub data: PathBuf,

    /// Print the report as a JSON array instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Run the check, writing the report to `out`.
///
/// Returns the process exit code: 0 if valid, 1 if violations were found.
/// Structural failures (missing documents, bad references) are `Err`.
pub fn run_check(
    args: &CheckArgs,
    config: ValidatorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    let validator = SchemaValidator::new(config)?;
    let report = validator
        .validate_file(&args.schema, &args.data)
        .with_context(|| {
            format!(
                "validating {} against {}",
                args.data.display(),
                args.schema.display()
            )
        })?;

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else if report.is_valid() {
        writeln!(out, "Schema validation passed.")?;
    } else {
        writeln!(out, "Schema validation failed:")?;
        for line in report.render() {
            writeln!(out, "- {line}")?;
        }
    }

    Ok(if report.is_valid() { 0 } else { 1 })
}
