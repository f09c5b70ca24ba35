//! # Draft-7 Engine
//!
//! Full Draft-7 validation through the `jsonschema` crate.
//!
//! ## Schema Resolution
//!
//! The schema document is registered as a resource under the `file://` URI
//! of its normalized path, and the validator is built from a one-line
//! wrapper that references that URI. The document itself is left as
//! written: Draft 7 ignores every keyword beside `$ref`, `$id` included,
//! so a root of `{"$ref": "defs/slug.json"}` still resolves against the
//! schema file's directory exactly as the structural validator resolves it.
//!
//! External documents are fetched by [`CacheRetriever`], which loads them
//! through the session [`SchemaCache`]. No network requests are made.
//!
//! Before compiling, the reference graph is checked by
//! [`check_reference_graph`], so a reference cycle or an overlong chain is
//! a [`SchemaError`] here as well instead of unbounded recursion.
//!
//! ## Output
//!
//! Every reported error is collected, sorted by message (ties keep
//! discovery order) and its instance location rendered as `$`, `.name`,
//! `[index]`.

use std::path::PathBuf;
use std::sync::Arc;

use jsonschema::{Draft, Retrieve, Uri};
use serde_json::{json, Value};
use url::Url;

use crate::cache::SchemaCache;
use crate::config::{ValidatorConfig, DEFAULT_MAX_REF_CHAIN};
use crate::document::SharedDocument;
use crate::engine::{EngineKind, ValidationEngine};
use crate::error::SchemaError;
use crate::graph::check_reference_graph;
use crate::pointer::unescape_segment;
use crate::violation::{InstancePath, ValidationReport, Violation, ViolationKind};

/// Draft-7 engine backed by `jsonschema`.
#[derive(Debug, Clone)]
pub struct Draft7Engine {
    max_ref_chain: usize,
}

impl Default for Draft7Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft7Engine {
    /// Create the engine with the default reference chain ceiling.
    pub fn new() -> Self {
        Self {
            max_ref_chain: DEFAULT_MAX_REF_CHAIN,
        }
    }

    /// Create the engine from a validator configuration.
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            max_ref_chain: config.max_ref_chain,
        }
    }

    /// Override the reference chain ceiling.
    pub fn with_max_ref_chain(mut self, limit: usize) -> Self {
        self.max_ref_chain = limit;
        self
    }
}

impl ValidationEngine for Draft7Engine {
    fn kind(&self) -> EngineKind {
        EngineKind::Draft7
    }

    fn validate(
        &self,
        schema: &SharedDocument,
        instance: &Value,
        cache: &Arc<SchemaCache>,
    ) -> Result<ValidationReport, SchemaError> {
        check_reference_graph(schema, cache, self.max_ref_chain)?;

        let build_error = |reason: String| SchemaError::EngineBuild {
            schema: schema.path().to_path_buf(),
            reason,
        };
        let uri = Url::from_file_path(schema.path())
            .map_err(|()| build_error("schema path has no file URI form".to_string()))?;

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft7);
        opts.with_resource(uri.as_str(), Draft::Draft7.create_resource(schema.root().clone()));
        opts.with_retriever(CacheRetriever {
            cache: Arc::clone(cache),
            schema_dir: schema.base_dir(),
        });
        let validator = opts
            .build(&json!({ "$ref": uri.as_str() }))
            .map_err(|e| build_error(e.to_string()))?;

        let mut errors: Vec<(String, String)> = validator
            .iter_errors(instance)
            .map(|e| {
                let path = render_location(&e.instance_path.to_string(), instance);
                (e.to_string(), path)
            })
            .collect();
        errors.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!(
            schema = %schema.path().display(),
            errors = errors.len(),
            "draft7 validation finished"
        );

        Ok(errors
            .into_iter()
            .map(|(message, path)| Violation {
                path,
                message,
                kind: ViolationKind::Engine,
            })
            .collect::<Vec<_>>()
            .into())
    }
}

/// Resolves external `$ref` URIs through the session schema cache.
///
/// `file://` URIs map directly to paths. Any other URI (for instance one
/// built from a schema's own `https://` `$id`) falls back to its last path
/// segment, looked up next to the schema being validated.
struct CacheRetriever {
    cache: Arc<SchemaCache>,
    schema_dir: PathBuf,
}

impl Retrieve for CacheRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let without_fragment = uri_str.split('#').next().unwrap_or(uri_str);

        let path = if without_fragment.starts_with("file:") {
            Url::parse(without_fragment)?
                .to_file_path()
                .map_err(|()| format!("not a local file URI: {uri_str}"))?
        } else {
            let filename = without_fragment
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| format!("cannot map URI to a local schema: {uri_str}"))?;
            self.schema_dir.join(filename)
        };

        tracing::trace!(uri = uri_str, path = %path.display(), "retrieving referenced schema");
        let document = self.cache.load(&path, Some(uri_str))?;
        Ok(document.root().clone())
    }
}

/// Render a JSON pointer into `instance` as a `$`-rooted locator.
///
/// A numeric segment is an index only where the instance holds an array
/// at that point; on a mapping it is a key.
fn render_location(pointer: &str, instance: &Value) -> String {
    let mut path = InstancePath::root();
    if pointer.is_empty() {
        return path.to_string();
    }

    let mut current = Some(instance);
    for raw in pointer.trim_start_matches('/').split('/') {
        let segment = unescape_segment(raw);
        match (current, segment.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(index)) => {
                path = path.index(index);
                current = items.get(index);
            }
            (node, _) => {
                current = node.and_then(|n| n.get(&segment));
                path = path.property(&segment);
            }
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SchemaDocument;
    use serde_json::json;

    fn run(schema: Value, instance: Value) -> ValidationReport {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, serde_json::to_vec(&schema).unwrap()).unwrap();
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&path, None).unwrap();
        Draft7Engine::new().validate(&doc, &instance, &cache).unwrap()
    }

    #[test]
    fn render_root_and_nested_locations() {
        let instance = json!({"items": [{"a/b": 1}], "0": {"x": true}});
        assert_eq!(render_location("", &instance), "$");
        assert_eq!(render_location("/items/0/a~1b", &instance), "$.items[0].a/b");
        assert_eq!(render_location("/0/x", &instance), "$.0.x");
    }

    #[test]
    fn valid_instance_has_empty_report() {
        let report = run(
            json!({"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}),
            json!({"name": "acme"}),
        );
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn errors_render_instance_paths() {
        let report = run(
            json!({
                "type": "object",
                "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
            }),
            json!({"tags": ["ok", 3]}),
        );
        assert_eq!(report.len(), 1);
        let v = &report.violations()[0];
        assert_eq!(v.path, "$.tags[1]");
        assert_eq!(v.kind, ViolationKind::Engine);
    }

    #[test]
    fn errors_are_sorted_by_message() {
        let report = run(
            json!({"type": "object", "required": ["zeta", "alpha"]}),
            json!({}),
        );
        let messages: Vec<&str> = report.violations().iter().map(|v| v.message.as_str()).collect();
        let mut sorted = messages.clone();
        sorted.sort();
        assert_eq!(messages, sorted);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn relative_file_refs_resolve_next_to_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("defs")).unwrap();
        std::fs::write(
            dir.path().join("defs/common.json"),
            r#"{"definitions": {"slug": {"type": "string", "pattern": "^[a-z-]+$"}}}"#,
        )
        .unwrap();
        let schema_path = dir.path().join("page.json");
        std::fs::write(
            &schema_path,
            r#"{"properties": {"id": {"$ref": "defs/common.json#/definitions/slug"}}}"#,
        )
        .unwrap();

        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&schema_path, None).unwrap();
        let engine = Draft7Engine::new();
        assert!(engine.validate(&doc, &json!({"id": "ok-slug"}), &cache).unwrap().is_valid());
        let report = engine.validate(&doc, &json!({"id": "Not Slug"}), &cache).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].path, "$.id");
        assert!(cache.contains(dir.path().join("defs/common.json")));
    }

    #[test]
    fn missing_referenced_file_is_structural() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("page.json");
        std::fs::write(&schema_path, r#"{"$ref": "absent.json"}"#).unwrap();
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&schema_path, None).unwrap();
        let err = Draft7Engine::new().validate(&doc, &json!({}), &cache).unwrap_err();
        assert!(matches!(err, SchemaError::DocumentNotFound { .. }), "got {err}");
    }

    #[test]
    fn root_ref_resolves_next_to_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("schemas/defs")).unwrap();
        std::fs::write(dir.path().join("schemas/defs/slug.json"), r#"{"type": "string"}"#).unwrap();
        // Same file name one directory up; must not be picked.
        std::fs::write(dir.path().join("schemas/slug.json"), r#"{"type": "integer"}"#).unwrap();
        let schema_path = dir.path().join("schemas/page.json");
        std::fs::write(&schema_path, r#"{"$ref": "defs/slug.json"}"#).unwrap();

        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&schema_path, None).unwrap();
        let engine = Draft7Engine::new();
        assert!(engine.validate(&doc, &json!("ok"), &cache).unwrap().is_valid());
        assert_eq!(engine.validate(&doc, &json!(5), &cache).unwrap().len(), 1);
    }

    #[test]
    fn local_pointers_resolve_against_document_root() {
        let report = run(
            json!({
                "definitions": {"tone": {"enum": ["calm", "bold"]}},
                "properties": {"tone": {"$ref": "#/definitions/tone"}}
            }),
            json!({"tone": "loud"}),
        );
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].path, "$.tone");
    }

    #[test]
    fn reference_cycle_is_structural() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"$ref": "b.json"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"$ref": "a.json"}"#).unwrap();
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&dir.path().join("a.json"), None).unwrap();

        let err = Draft7Engine::new().validate(&doc, &json!({}), &cache).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference { .. }), "got {err}");
    }

    #[test]
    fn chain_ceiling_comes_from_config() {
        let config = ValidatorConfig {
            max_ref_chain: 1,
            ..ValidatorConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("s.json"),
            r##"{"definitions": {"a": {"$ref": "#/definitions/b"}, "b": {}}, "$ref": "#/definitions/a"}"##,
        )
        .unwrap();
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.load(&dir.path().join("s.json"), None).unwrap();

        let err = Draft7Engine::from_config(&config).validate(&doc, &json!(1), &cache).unwrap_err();
        assert!(matches!(err, SchemaError::ReferenceChainTooLong { limit: 1, .. }), "got {err}");
        assert!(Draft7Engine::new().validate(&doc, &json!(1), &cache).unwrap().is_valid());
    }

    #[test]
    fn explicit_id_is_kept() {
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.insert(SchemaDocument::new(
            "/schemas/x.json",
            json!({"$id": "https://example.org/x.json", "type": "string"}),
        ));
        let report = Draft7Engine::new().validate(&doc, &json!(1), &cache).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].path, "$");
    }
}
