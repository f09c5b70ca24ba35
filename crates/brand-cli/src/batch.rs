//! # Batch Subcommand
//!
//! Validates every `(data, schema)` pair listed in a manifest, the way the
//! content pipeline checks a compiled brand system. Every violation is
//! prefixed with the entry's label, and any violation or missing required
//! document fails the run. A structural failure (unreadable schema,
//! unresolvable reference, reference cycle) aborts the run immediately.
//!
//! ```yaml
//! entries:
//!   - path: outputs/seed.json
//!     schema: schemas/seed.schema.json
//!   - path: outputs/voice.json
//!     schema: schemas/voice.schema.json
//!     label: voice
//!     optional: true
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use brand_schema::{SchemaValidator, ValidatorConfig};
use clap::Args;
use serde::Deserialize;

use crate::resolve_path;

/// Arguments for the batch subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Manifest listing data documents and their schemas (YAML or JSON).
    pub manifest: PathBuf,
}

/// A validation manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Documents to validate, in order.
    pub entries: Vec<ManifestEntry>,
}

/// One data document and the schema it must satisfy.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Data document.
    pub path: PathBuf,
    /// Schema document.
    pub schema: PathBuf,
    /// Prefix for this entry's errors. Defaults to `path`.
    #[serde(default)]
    pub label: Option<String>,
    /// A missing data document is a warning rather than an error.
    #[serde(default)]
    pub optional: bool,
}

impl ManifestEntry {
    fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl Manifest {
    /// Read a manifest file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("parsing manifest {}", path.display()))
    }
}

/// Validate every manifest entry, writing a summary to `out`.
///
/// Returns 0 if every present document is valid and every required one
/// exists, else 1.
pub fn run_batch(
    args: &BatchArgs,
    config: ValidatorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    let manifest = Manifest::load(&args.manifest)?;
    let base = args
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    // One session for the whole batch: shared schemas are parsed once.
    let validator = SchemaValidator::new(ValidatorConfig {
        share_cache: true,
        ..config
    })?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut checked = 0usize;

    for entry in &manifest.entries {
        let label = entry.label();
        let data = resolve_path(&entry.path, &base);
        let schema = resolve_path(&entry.schema, &base);

        if !data.exists() {
            if entry.optional {
                warnings.push(format!("Missing optional file: {label}"));
            } else {
                errors.push(format!("Missing expected output: {label}"));
            }
            continue;
        }
        if !schema.exists() {
            let message = format!("Missing schema: {} (for {label})", entry.schema.display());
            if entry.optional {
                warnings.push(message);
            } else {
                errors.push(message);
            }
            continue;
        }

        let report = validator
            .validate_file(&schema, &data)
            .with_context(|| format!("validating {label}"))?;
        checked += 1;
        tracing::debug!(%label, violations = report.len(), "checked manifest entry");
        errors.extend(report.render().into_iter().map(|line| format!("{label}: {line}")));
    }

    if !warnings.is_empty() {
        writeln!(out, "Warnings:")?;
        for w in &warnings {
            writeln!(out, "- {w}")?;
        }
    }

    if errors.is_empty() {
        writeln!(out, "Validation passed ({checked} documents).")?;
        Ok(0)
    } else {
        writeln!(out, "Validation failed:")?;
        for e in &errors {
            writeln!(out, "- {e}")?;
        }
        Ok(1)
    }
}
