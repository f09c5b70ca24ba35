//! Validator configuration.
//!
//! Defaults suit the content pipeline. Override via a YAML/JSON file,
//! environment variables, or explicit construction, in that order of
//! increasing precedence.

use std::path::Path;

use serde::Deserialize;

use crate::engine::EngineChoice;

/// Default ceiling on consecutive `$ref` hops at one instance location.
pub const DEFAULT_MAX_REF_CHAIN: usize = 64;

/// Default ceiling on structural-walk recursion depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Settings for a [`SchemaValidator`](crate::SchemaValidator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Which engine to use.
    pub engine: EngineChoice,
    /// Ceiling on consecutive `$ref` hops at one instance location.
    pub max_ref_chain: usize,
    /// Ceiling on recursion depth of the structural walk.
    pub max_depth: usize,
    /// Append per-alternative sub-errors after an unmatched `anyOf`.
    pub verbose_any_of: bool,
    /// Keep one schema cache across `validate_file` calls.
    pub share_cache: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            engine: EngineChoice::Auto,
            max_ref_chain: DEFAULT_MAX_REF_CHAIN,
            max_depth: DEFAULT_MAX_DEPTH,
            verbose_any_of: false,
            share_cache: false,
        }
    }
}

impl ValidatorConfig {
    /// Read a config file (YAML or JSON). Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Defaults overlaid with environment variables.
    ///
    /// Variables:
    /// - `BRAND_SCHEMA_ENGINE` (`auto`, `draft7`, `structural`)
    /// - `BRAND_SCHEMA_MAX_REF_CHAIN` (default: 64)
    /// - `BRAND_SCHEMA_MAX_DEPTH` (default: 512)
    /// - `BRAND_SCHEMA_VERBOSE_ANYOF` (`true`/`false`/`1`/`0`)
    /// - `BRAND_SCHEMA_SHARE_CACHE` (`true`/`false`/`1`/`0`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Overlay environment variables on top of `self`.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = var("BRAND_SCHEMA_ENGINE") {
            self.engine = raw
                .parse()
                .map_err(|_| ConfigError::Invalid("BRAND_SCHEMA_ENGINE".to_string(), raw))?;
        }
        if let Some(raw) = var("BRAND_SCHEMA_MAX_REF_CHAIN") {
            self.max_ref_chain = parse_limit("BRAND_SCHEMA_MAX_REF_CHAIN", raw)?;
        }
        if let Some(raw) = var("BRAND_SCHEMA_MAX_DEPTH") {
            self.max_depth = parse_limit("BRAND_SCHEMA_MAX_DEPTH", raw)?;
        }
        if let Some(raw) = var("BRAND_SCHEMA_VERBOSE_ANYOF") {
            self.verbose_any_of = parse_flag("BRAND_SCHEMA_VERBOSE_ANYOF", raw)?;
        }
        if let Some(raw) = var("BRAND_SCHEMA_SHARE_CACHE") {
            self.share_cache = parse_flag("BRAND_SCHEMA_SHARE_CACHE", raw)?;
        }
        Ok(self)
    }
}

fn parse_limit(var: &str, raw: String) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid(var.to_string(), raw)),
    }
}

fn parse_flag(var: &str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(var.to_string(), raw)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {0}: {1}")]
    Read(String, String),
    #[error("invalid config file {0}: {1}")]
    Parse(String, String),
    #[error("invalid value for {0}: '{1}'")]
    Invalid(String, String),
}
