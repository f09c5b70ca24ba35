//! # Validation Engines
//!
//! Two implementations of one capability: the Draft-7 engine backed by the
//! `jsonschema` crate (compiled in with the `draft7` feature) and the
//! built-in [`StructuralValidator`](crate::StructuralValidator) covering a
//! keyword subset. The engine is chosen once, when a
//! [`SchemaValidator`](crate::SchemaValidator) is constructed.
//!
//! Both engines agree on pass/fail for schemas written in the common
//! subset. Their message wording differs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::SchemaCache;
use crate::document::SharedDocument;
use crate::error::SchemaError;
use crate::violation::ValidationReport;

/// A concrete engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Full Draft-7 engine from the `jsonschema` crate.
    Draft7,
    /// Built-in keyword-subset validator.
    Structural,
}

impl EngineKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Draft7 => "draft7",
            EngineKind::Structural => "structural",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested engine, as configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// Draft-7 when compiled in, structural otherwise.
    #[default]
    Auto,
    /// Draft-7 only; construction fails if it is not compiled in.
    Draft7,
    /// Structural only.
    Structural,
}

impl EngineChoice {
    /// Pick the concrete engine for this build.
    pub fn select(self) -> Result<EngineKind, SchemaError> {
        match self {
            EngineChoice::Auto if draft7_available() => Ok(EngineKind::Draft7),
            EngineChoice::Auto => {
                tracing::warn!("draft7 engine not compiled in; using structural validator");
                Ok(EngineKind::Structural)
            }
            EngineChoice::Draft7 if draft7_available() => Ok(EngineKind::Draft7),
            EngineChoice::Draft7 => Err(SchemaError::EngineUnavailable {
                engine: EngineKind::Draft7.to_string(),
            }),
            EngineChoice::Structural => Ok(EngineKind::Structural),
        }
    }
}

impl FromStr for EngineChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EngineChoice::Auto),
            "draft7" | "draft-7" => Ok(EngineChoice::Draft7),
            "structural" | "builtin" => Ok(EngineChoice::Structural),
            other => Err(format!("unknown engine '{other}' (expected auto, draft7 or structural)")),
        }
    }
}

impl fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineChoice::Auto => "auto",
            EngineChoice::Draft7 => "draft7",
            EngineChoice::Structural => "structural",
        })
    }
}

/// True if the Draft-7 engine was compiled into this build.
pub fn draft7_available() -> bool {
    cfg!(feature = "draft7")
}

/// Validates an instance against a loaded schema document.
///
/// `cache` holds the session's schema documents; engines load referenced
/// files through it so each file is parsed once per session.
pub trait ValidationEngine: Send + Sync + fmt::Debug {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Validate `instance` against the root of `schema`.
    ///
    /// Violations are returned in the report; only structural failures
    /// (unloadable documents, unresolvable references, cycles) are `Err`.
    fn validate(
        &self,
        schema: &SharedDocument,
        instance: &Value,
        cache: &Arc<SchemaCache>,
    ) -> Result<ValidationReport, SchemaError>;
}
