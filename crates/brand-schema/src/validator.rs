//! # Schema Validator
//!
//! Entry point used by the content pipeline: validate one data document
//! against one schema document, both named by path.
//!
//! The engine is chosen once, at construction, from
//! [`ValidatorConfig::engine`]. Each [`SchemaValidator::validate_file`]
//! call gets a fresh [`SchemaCache`] unless `share_cache` is set (or a
//! cache is supplied with [`SchemaValidator::with_shared_cache`]), in which
//! case schema documents loaded by one call are reused by later calls until
//! [`SchemaValidator::reset_cache`].

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::SchemaCache;
use crate::config::ValidatorConfig;
use crate::document::{load_value, normalize_path};
use crate::engine::{EngineKind, ValidationEngine};
use crate::error::SchemaError;
use crate::structural::StructuralValidator;
use crate::violation::ValidationReport;

/// Validates data documents against schema documents.
#[derive(Debug)]
pub struct SchemaValidator {
    config: ValidatorConfig,
    engine: Box<dyn ValidationEngine>,
    shared_cache: Option<Arc<SchemaCache>>,
}

impl SchemaValidator {
    /// Build a validator, selecting the engine from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EngineUnavailable`] if `draft7` is requested
    /// explicitly but not compiled in.
    pub fn new(config: ValidatorConfig) -> Result<Self, SchemaError> {
        let kind = config.engine.select()?;
        let engine = build_engine(kind, &config);
        tracing::debug!(engine = %kind, share_cache = config.share_cache, "schema validator ready");
        Ok(Self::with_engine(config, engine))
    }

    /// Build a validator around a specific engine instance.
    pub fn with_engine(config: ValidatorConfig, engine: Box<dyn ValidationEngine>) -> Self {
        let shared_cache = config.share_cache.then(|| Arc::new(SchemaCache::new()));
        Self {
            config,
            engine,
            shared_cache,
        }
    }

    /// Reuse `cache` for every call instead of a fresh per-call cache.
    pub fn with_shared_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Engine selected at construction.
    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    /// Active configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The shared cache, if sharing is enabled.
    pub fn shared_cache(&self) -> Option<&Arc<SchemaCache>> {
        self.shared_cache.as_ref()
    }

    /// Drop every document held by the shared cache. No-op without one.
    pub fn reset_cache(&self) {
        if let Some(cache) = &self.shared_cache {
            cache.clear();
        }
    }

    /// Validate the document at `data_path` against the schema at
    /// `schema_path`.
    ///
    /// An empty report means valid. Missing or malformed documents,
    /// unresolvable references and reference cycles are `Err`.
    pub fn validate_file(
        &self,
        schema_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
    ) -> Result<ValidationReport, SchemaError> {
        let data_path = normalize_path(data_path.as_ref());
        let cache = self.session_cache();
        let schema = cache.load(schema_path.as_ref(), None)?;
        let data = load_value(&data_path, None)?;

        let report = self.engine.validate(&schema, &data, &cache)?;
        tracing::info!(
            schema = %schema.path().display(),
            data = %data_path.display(),
            engine = %self.engine.kind(),
            violations = report.len(),
            "validated document"
        );
        Ok(report)
    }

    /// Validate an in-memory instance against the schema at `schema_path`.
    pub fn validate_value(
        &self,
        schema_path: impl AsRef<Path>,
        instance: &Value,
    ) -> Result<ValidationReport, SchemaError> {
        let cache = self.session_cache();
        let schema = cache.load(schema_path.as_ref(), None)?;
        self.engine.validate(&schema, instance, &cache)
    }

    fn session_cache(&self) -> Arc<SchemaCache> {
        match &self.shared_cache {
            Some(cache) => Arc::clone(cache),
            None => Arc::new(SchemaCache::new()),
        }
    }
}

fn build_engine(kind: EngineKind, config: &ValidatorConfig) -> Box<dyn ValidationEngine> {
    match kind {
        #[cfg(feature = "draft7")]
        EngineKind::Draft7 => Box::new(crate::draft7::Draft7Engine::from_config(config)),
        #[cfg(not(feature = "draft7"))]
        EngineKind::Draft7 => {
            tracing::warn!("draft7 engine requested without the feature; using structural validator");
            Box::new(StructuralValidator::from_config(config))
        }
        EngineKind::Structural => Box::new(StructuralValidator::from_config(config)),
    }
}

/// Validate with the default configuration.
pub fn validate_file(
    schema_path: impl AsRef<Path>,
    data_path: impl AsRef<Path>,
) -> Result<ValidationReport, SchemaError> {
    SchemaValidator::new(ValidatorConfig::default())?.validate_file(schema_path, data_path)
}
