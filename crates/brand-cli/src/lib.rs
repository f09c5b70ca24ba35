//! # brand-cli: Schema Checks for the Content Pipeline
//!
//! Provides the `brand-schema` command-line interface.
//!
//! ## Subcommands
//!
//! - `brand-schema check <schema> <data>`: validate one document.
//! - `brand-schema batch <manifest>`: validate every entry of a manifest,
//!   prefixing each error with the entry's label. Any error fails the run.
//!
//! ```bash
//! brand-schema check schemas/seed.schema.json seed.json
//! brand-schema --engine structural batch system/manifest.yaml
//! ```

pub mod batch;
pub mod check;

use std::path::{Path, PathBuf};

use anyhow::Context;
use brand_schema::{EngineChoice, ValidatorConfig};
use clap::Args;

/// Engine settings that override the config file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Validation engine: auto, draft7 or structural.
    #[arg(long, global = true)]
    pub engine: Option<EngineChoice>,

    /// Report each anyOf alternative's errors when none matches.
    #[arg(long, global = true)]
    pub verbose_any_of: bool,

    /// Maximum consecutive $ref hops at one instance location.
    #[arg(long, global = true)]
    pub max_ref_chain: Option<usize>,

    /// Maximum validation recursion depth.
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,
}

/// Assemble the validator configuration: defaults, then the config file,
/// then `BRAND_SCHEMA_*` environment variables, then command-line flags.
pub fn build_config(
    config_path: Option<&Path>,
    overrides: &EngineArgs,
) -> anyhow::Result<ValidatorConfig> {
    let base = match config_path {
        Some(path) => ValidatorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    let mut config = base.with_env().context("reading BRAND_SCHEMA_* environment")?;

    if let Some(engine) = overrides.engine {
        config.engine = engine;
    }
    if overrides.verbose_any_of {
        config.verbose_any_of = true;
    }
    if let Some(limit) = overrides.max_ref_chain {
        anyhow::ensure!(limit > 0, "--max-ref-chain must be at least 1");
        config.max_ref_chain = limit;
    }
    if let Some(limit) = overrides.max_depth {
        anyhow::ensure!(limit > 0, "--max-depth must be at least 1");
        config.max_depth = limit;
    }
    tracing::debug!(?config, "resolved validator configuration");
    Ok(config)
}

/// Resolve a path that may be relative to `base`.
///
/// Absolute paths are returned as-is; relative ones are joined onto `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
