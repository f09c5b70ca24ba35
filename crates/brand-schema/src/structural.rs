//! # Structural Validator
//!
//! The built-in validator for the keyword subset used by locally authored
//! content schemas: `$ref`, `anyOf`, `type`, `enum`, `minLength`,
//! `pattern`, `minimum`, `maximum`, `minItems`, `maxItems`, `items`,
//! `required`, `properties` and `additionalProperties`. Other keywords are
//! ignored.
//!
//! ## Evaluation order
//!
//! Keywords on one node are checked in a fixed order and every violation
//! is accumulated:
//!
//! 1. `$ref`, validated at the same instance location.
//! 2. `anyOf`, one synthetic violation if no alternative matches.
//! 3. `type`. A mismatch stops evaluation of this node, since the
//!    remaining keywords presuppose the shape.
//! 4. `enum`.
//! 5. String keywords, 6. numeric bounds, 7. array keywords and `items`,
//!    8. `required`, `properties`, `additionalProperties`.
//!
//! Mapping keys are visited in document order and array elements by index,
//! so the report order is deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use fancy_regex::Regex;
use serde_json::{Map, Value};

use crate::cache::SchemaCache;
use crate::config::{ValidatorConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_REF_CHAIN};
use crate::document::SharedDocument;
use crate::engine::{EngineKind, ValidationEngine};
use crate::error::SchemaError;
use crate::resolve::{resolve_ref, RefChain, ResolutionContext};
use crate::violation::{InstancePath, ValidationReport, Violation, ViolationKind};

/// Recursive keyword-subset validator.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    max_ref_chain: usize,
    max_depth: usize,
    verbose_any_of: bool,
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self {
            max_ref_chain: DEFAULT_MAX_REF_CHAIN,
            max_depth: DEFAULT_MAX_DEPTH,
            verbose_any_of: false,
        }
    }
}

impl StructuralValidator {
    /// Validator with default limits and compact `anyOf` reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator using the limits and `anyOf` mode from `config`.
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            max_ref_chain: config.max_ref_chain,
            max_depth: config.max_depth,
            verbose_any_of: config.verbose_any_of,
        }
    }

    /// Report each alternative's violations after an unmatched `anyOf`.
    pub fn with_verbose_any_of(mut self, verbose: bool) -> Self {
        self.verbose_any_of = verbose;
        self
    }

    /// Ceiling on consecutive `$ref` hops at one instance location.
    pub fn with_max_ref_chain(mut self, limit: usize) -> Self {
        self.max_ref_chain = limit;
        self
    }

    /// Ceiling on recursion depth.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Validate `instance` against `node`, located at `path` in the
    /// instance and resolved under `context`.
    ///
    /// Inputs are not modified. Violations are returned in the report;
    /// structural failures abort with `Err` and no partial report.
    pub fn validate(
        &self,
        instance: &Value,
        node: &Value,
        context: &ResolutionContext,
        path: &InstancePath,
        cache: &SchemaCache,
    ) -> Result<ValidationReport, SchemaError> {
        let mut walk = Walk {
            settings: self,
            cache,
            patterns: HashMap::new(),
        };
        let mut chain = RefChain::new(self.max_ref_chain);
        walk.node(instance, node, context, path, &mut chain, 0)
    }
}

impl ValidationEngine for StructuralValidator {
    fn kind(&self) -> EngineKind {
        EngineKind::Structural
    }

    fn validate(
        &self,
        schema: &SharedDocument,
        instance: &Value,
        cache: &Arc<SchemaCache>,
    ) -> Result<ValidationReport, SchemaError> {
        let context = ResolutionContext::for_document(Arc::clone(schema));
        StructuralValidator::validate(self, instance, schema.root(), &context, &InstancePath::root(), cache)
    }
}

/// State for one top-level validation.
struct Walk<'a> {
    settings: &'a StructuralValidator,
    cache: &'a SchemaCache,
    patterns: HashMap<String, Regex>,
}

impl Walk<'_> {
    fn node(
        &mut self,
        instance: &Value,
        node: &Value,
        context: &ResolutionContext,
        path: &InstancePath,
        chain: &mut RefChain,
        depth: usize,
    ) -> Result<ValidationReport, SchemaError> {
        if depth > self.settings.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.settings.max_depth,
                path: path.to_string(),
            });
        }

        let mut report = ValidationReport::new();
        // Boolean and other non-mapping schemas carry no subset keywords.
        let Value::Object(schema) = node else {
            return Ok(report);
        };

        if let Some(reference) = schema.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| SchemaError::InvalidReference {
                reference: reference.to_string(),
                reason: "$ref must be a string".to_string(),
            })?;
            let resolved = resolve_ref(reference, context, self.cache)?;
            chain.enter(resolved.identity(), reference)?;
            let target = resolved.node()?;
            report.extend(self.node(instance, target, resolved.context(), path, chain, depth + 1)?);
            chain.leave();
        }

        if let Some(Value::Array(alternatives)) = schema.get("anyOf") {
            self.any_of(instance, alternatives, context, path, chain, depth, &mut report)?;
        }

        if let Some(expected) = schema.get("type") {
            if let Some(message) = type_mismatch(instance, expected) {
                report.push(Violation::new(path, ViolationKind::Type, message));
                return Ok(report);
            }
        }

        if let Some(Value::Array(allowed)) = schema.get("enum") {
            if !allowed.iter().any(|candidate| json_equal(instance, candidate)) {
                report.push(Violation::new(
                    path,
                    ViolationKind::Enum,
                    format!("value {instance} not in enum"),
                ));
            }
        }

        match instance {
            Value::String(text) => self.string(text, schema, path, &mut report)?,
            Value::Number(n) => {
                if let Some(value) = n.as_f64() {
                    numeric_bounds(n, value, schema, path, &mut report);
                }
            }
            Value::Array(items) => {
                self.array(items, schema, context, path, chain, depth, &mut report)?
            }
            Value::Object(members) => {
                self.object(members, schema, context, path, chain, depth, &mut report)?
            }
            Value::Bool(_) | Value::Null => {}
        }

        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn any_of(
        &mut self,
        instance: &Value,
        alternatives: &[Value],
        context: &ResolutionContext,
        path: &InstancePath,
        chain: &mut RefChain,
        depth: usize,
        report: &mut ValidationReport,
    ) -> Result<(), SchemaError> {
        let mut failures = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let sub = self.node(instance, alternative, context, path, chain, depth + 1)?;
            if sub.is_empty() {
                return Ok(());
            }
            failures.push(sub);
        }
        if failures.is_empty() {
            return Ok(());
        }

        report.push(Violation::new(
            path,
            ViolationKind::AnyOf,
            "does not match anyOf options",
        ));
        if self.settings.verbose_any_of {
            for (i, sub) in failures.into_iter().enumerate() {
                for violation in sub.into_inner() {
                    report.push(Violation {
                        path: violation.path,
                        message: format!("anyOf[{i}]: {}", violation.message),
                        kind: ViolationKind::AnyOfBranch,
                    });
                }
            }
        }
        Ok(())
    }

    fn string(
        &mut self,
        text: &str,
        schema: &Map<String, Value>,
        path: &InstancePath,
        report: &mut ValidationReport,
    ) -> Result<(), SchemaError> {
        if let Some(min) = schema.get("minLength").and_then(Value::as_f64) {
            if (text.chars().count() as f64) < min {
                report.push(Violation::new(
                    path,
                    ViolationKind::MinLength,
                    format!("string length < {}", schema["minLength"]),
                ));
            }
        }

        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            if !pattern.is_empty() && !self.pattern_matches(pattern, text, path)? {
                report.push(Violation::new(
                    path,
                    ViolationKind::Pattern,
                    format!("string does not match pattern '{pattern}'"),
                ));
            }
        }
        Ok(())
    }

    /// Search `text` for `pattern`. Lookaround and backreferences are
    /// supported; a pattern that fails to compile, or exhausts the
    /// backtracking limit, is fatal.
    fn pattern_matches(
        &mut self,
        pattern: &str,
        text: &str,
        path: &InstancePath,
    ) -> Result<bool, SchemaError> {
        let invalid = |e: fancy_regex::Error| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            path: path.to_string(),
            reason: e.to_string(),
        };
        if !self.patterns.contains_key(pattern) {
            let compiled = Regex::new(pattern).map_err(invalid)?;
            self.patterns.insert(pattern.to_string(), compiled);
        }
        self.patterns[pattern].is_match(text).map_err(invalid)
    }

    #[allow(clippy::too_many_arguments)]
    fn array(
        &mut self,
        items: &[Value],
        schema: &Map<String, Value>,
        context: &ResolutionContext,
        path: &InstancePath,
        chain: &RefChain,
        depth: usize,
        report: &mut ValidationReport,
    ) -> Result<(), SchemaError> {
        let len = items.len() as f64;
        if let Some(min) = schema.get("minItems").and_then(Value::as_f64) {
            if len < min {
                report.push(Violation::new(
                    path,
                    ViolationKind::MinItems,
                    format!("array has fewer than {} items", schema["minItems"]),
                ));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_f64) {
            if len > max {
                report.push(Violation::new(
                    path,
                    ViolationKind::MaxItems,
                    format!("array has more than {} items", schema["maxItems"]),
                ));
            }
        }

        // Only the single-schema form of `items` is part of the subset.
        if let Some(item_schema @ Value::Object(_)) = schema.get("items") {
            for (index, item) in items.iter().enumerate() {
                let mut item_chain = chain.fresh();
                report.extend(self.node(
                    item,
                    item_schema,
                    context,
                    &path.index(index),
                    &mut item_chain,
                    depth + 1,
                )?);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn object(
        &mut self,
        members: &Map<String, Value>,
        schema: &Map<String, Value>,
        context: &ResolutionContext,
        path: &InstancePath,
        chain: &RefChain,
        depth: usize,
        report: &mut ValidationReport,
    ) -> Result<(), SchemaError> {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !members.contains_key(name) {
                    report.push(Violation::new(
                        path,
                        ViolationKind::Required,
                        format!("missing required property '{name}'"),
                    ));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));

        for (key, value) in members {
            match properties.and_then(|p| p.get(key)) {
                Some(property_schema) => {
                    let mut member_chain = chain.fresh();
                    report.extend(self.node(
                        value,
                        property_schema,
                        context,
                        &path.property(key),
                        &mut member_chain,
                        depth + 1,
                    )?);
                }
                None if closed => report.push(Violation::new(
                    path,
                    ViolationKind::AdditionalProperty,
                    format!("additional property '{key}' not allowed"),
                )),
                None => {}
            }
        }
        Ok(())
    }
}

fn numeric_bounds(
    number: &serde_json::Number,
    value: f64,
    schema: &Map<String, Value>,
    path: &InstancePath,
    report: &mut ValidationReport,
) {
    if let Some(minimum) = schema.get("minimum").and_then(Value::as_f64) {
        if value < minimum {
            report.push(Violation::new(
                path,
                ViolationKind::Minimum,
                format!("value {number} < minimum {}", schema["minimum"]),
            ));
        }
    }
    if let Some(maximum) = schema.get("maximum").and_then(Value::as_f64) {
        if value > maximum {
            report.push(Violation::new(
                path,
                ViolationKind::Maximum,
                format!("value {number} > maximum {}", schema["maximum"]),
            ));
        }
    }
}

/// `None` if `instance` satisfies the `type` keyword, else the message.
fn type_mismatch(instance: &Value, expected: &Value) -> Option<String> {
    match expected {
        Value::String(name) => {
            (!type_matches(instance, name)).then(|| format!("expected type {name}"))
        }
        Value::Array(names) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            (!names.iter().any(|name| type_matches(instance, name)))
                .then(|| {
                    let quoted: Vec<String> = names.iter().map(|name| format!("'{name}'")).collect();
                    format!("expected type [{}]", quoted.join(", "))
                })
        }
        _ => None,
    }
}

fn type_matches(instance: &Value, name: &str) -> bool {
    match name {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => is_integer(instance),
        "boolean" => instance.is_boolean(),
        "null" => instance.is_null(),
        _ => false,
    }
}

/// Integral numbers, including floats with no fractional part (`1.0`).
fn is_integer(instance: &Value) -> bool {
    match instance {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

/// Value equality for `enum`: numbers compare by value (`1 == 1.0`),
/// booleans never equal numbers, containers compare element-wise.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(l), Some(r)) if l == r)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, l)| y.get(k).is_some_and(|r| json_equal(l, r)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SchemaDocument;
    use proptest::prelude::*;
    use serde_json::json;

    fn check(schema: Value, instance: Value) -> ValidationReport {
        check_with(StructuralValidator::new(), schema, instance).unwrap()
    }

    fn check_with(
        validator: StructuralValidator,
        schema: Value,
        instance: Value,
    ) -> Result<ValidationReport, SchemaError> {
        let cache = Arc::new(SchemaCache::new());
        let doc = cache.insert(SchemaDocument::new("/schemas/inline.json", schema));
        ValidationEngine::validate(&validator, &doc, &instance, &cache)
    }

    #[test]
    fn type_only_schema_accepts_matching_shapes() {
        let cases = [
            ("object", json!({"a": 1})),
            ("array", json!([1, "x"])),
            ("string", json!("text")),
            ("number", json!(1.5)),
            ("number", json!(3)),
            ("integer", json!(7)),
            ("integer", json!(2.0)),
            ("boolean", json!(false)),
            ("null", json!(null)),
        ];
        for (name, instance) in cases {
            let report = check(json!({"type": name}), instance.clone());
            assert!(report.is_valid(), "{name} vs {instance}: {report}");
        }
    }

    #[test]
    fn booleans_are_not_numbers() {
        for name in ["number", "integer"] {
            let report = check(json!({"type": name}), json!(true));
            assert_eq!(report.render(), [format!("$: expected type {name}")]);
        }
        let report = check(json!({"type": "integer"}), json!(1.5));
        assert_eq!(report.count(ViolationKind::Type), 1);
    }

    #[test]
    fn type_list_passes_if_any_matches() {
        let schema = json!({"type": ["string", "null"]});
        assert!(check(schema.clone(), json!(null)).is_valid());
        assert!(check(schema.clone(), json!("x")).is_valid());
        assert_eq!(
            check(schema, json!(3)).render(),
            ["$: expected type ['string', 'null']"]
        );
    }

    #[test]
    fn type_mismatch_stops_remaining_keywords() {
        let schema = json!({
            "type": "object",
            "required": ["a", "b"],
            "enum": [{"a": 1}]
        });
        let report = check(schema, json!("not an object"));
        assert_eq!(report.render(), ["$: expected type object"]);
    }

    #[test]
    fn missing_required_yields_one_error_per_name() {
        let schema = json!({"type": "object", "required": ["title", "body", "slug"]});
        let report = check(schema, json!({"body": "x"}));
        assert_eq!(
            report.render(),
            [
                "$: missing required property 'title'",
                "$: missing required property 'slug'",
            ]
        );
        assert_eq!(report.count(ViolationKind::Required), 2);
    }

    #[test]
    fn pattern_is_a_search_not_a_full_match() {
        let schema = json!({"type": "string", "pattern": "^[A-Z]"});
        assert_eq!(
            check(schema.clone(), json!("abc")).render(),
            ["$: string does not match pattern '^[A-Z]'"]
        );
        assert!(check(schema, json!("Abc")).is_valid());
        assert!(check(json!({"pattern": "b+"}), json!("abbbc")).is_valid());
    }

    #[test]
    fn pattern_supports_lookaround_and_backreferences() {
        let draft_guard = json!({"type": "string", "pattern": "^(?!draft)"});
        assert!(check(draft_guard.clone(), json!("final")).is_valid());
        assert_eq!(
            check(draft_guard, json!("draft-2")).render(),
            ["$: string does not match pattern '^(?!draft)'"]
        );

        let doubled = json!({"pattern": "(\\w)\\1"});
        assert!(check(doubled.clone(), json!("coffee")).is_valid());
        assert_eq!(check(doubled, json!("tea")).len(), 1);
    }

    #[test]
    fn invalid_pattern_is_structural() {
        let err = check_with(StructuralValidator::new(), json!({"pattern": "(unclosed"}), json!("x"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }), "got {err}");
    }

    #[test]
    fn min_length_counts_characters() {
        let schema = json!({"minLength": 3});
        assert!(check(schema.clone(), json!("héé")).is_valid());
        assert_eq!(check(schema, json!("hé")).render(), ["$: string length < 3"]);
    }

    #[test]
    fn numeric_bounds_are_inclusive_and_independent() {
        let schema = json!({"minimum": 1, "maximum": 10});
        assert!(check(schema.clone(), json!(1)).is_valid());
        assert!(check(schema.clone(), json!(10)).is_valid());
        assert_eq!(check(schema.clone(), json!(0.5)).render(), ["$: value 0.5 < minimum 1"]);
        assert_eq!(check(schema, json!(11)).render(), ["$: value 11 > maximum 10"]);

        // Inverted bounds report both.
        let report = check(json!({"minimum": 5, "maximum": 2}), json!(3));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn bounds_ignore_non_matching_instance_kinds() {
        let schema = json!({"minimum": 5, "minLength": 5, "minItems": 5, "required": ["x"]});
        assert!(check(schema.clone(), json!(true)).is_valid());
        assert!(check(schema, json!(null)).is_valid());
    }

    #[test]
    fn min_items_ignores_element_content() {
        let schema = json!({"type": "array", "minItems": 2});
        assert_eq!(
            check(schema.clone(), json!([{"anything": true}])).render(),
            ["$: array has fewer than 2 items"]
        );
        assert!(check(schema, json!([null, {"x": []}])).is_valid());
    }

    #[test]
    fn max_items_bound() {
        let schema = json!({"maxItems": 1});
        assert!(check(schema.clone(), json!([1])).is_valid());
        assert_eq!(check(schema, json!([1, 2])).render(), ["$: array has more than 1 items"]);
    }

    #[test]
    fn items_errors_carry_index_paths() {
        let schema = json!({
            "type": "array",
            "minItems": 2,
            "items": {"type": "object", "required": ["id"], "properties": {"id": {"type": "string"}}}
        });
        let report = check(schema, json!([{"id": 1}, {"id": "ok"}, {}]));
        assert_eq!(
            report.render(),
            [
                "$[0].id: expected type string",
                "$[2]: missing required property 'id'",
            ]
        );
    }

    #[test]
    fn additional_properties_false_rejects_unknown_keys() {
        let closed = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": false
        });
        let instance = json!({"name": "acme", "extra": 1});
        let report = check(closed, instance.clone());
        assert_eq!(report.render(), ["$: additional property 'extra' not allowed"]);

        let open = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        assert!(check(open, instance.clone()).is_valid());

        let explicit_true = json!({"properties": {"name": {}}, "additionalProperties": true});
        assert!(check(explicit_true, instance.clone()).is_valid());

        // A schema-valued additionalProperties is not `false`; keys pass.
        let schema_valued = json!({"properties": {}, "additionalProperties": {"type": "string"}});
        assert!(check(schema_valued, instance).is_valid());
    }

    #[test]
    fn report_order_follows_keywords_then_keys() {
        let schema = json!({
            "type": "object",
            "required": ["z"],
            "properties": {
                "b": {"type": "string"},
                "a": {"type": "integer"}
            },
            "additionalProperties": false
        });
        let report = check(schema, json!({"b": 1, "q": true, "a": "x"}));
        assert_eq!(
            report.render(),
            [
                "$: missing required property 'z'",
                "$.b: expected type string",
                "$: additional property 'q' not allowed",
                "$.a: expected type integer",
            ]
        );
    }

    #[test]
    fn enum_compares_by_value() {
        let schema = json!({"enum": ["draft", "final", 1, {"k": [1, 2]}]});
        assert!(check(schema.clone(), json!("final")).is_valid());
        assert!(check(schema.clone(), json!(1.0)).is_valid());
        assert!(check(schema.clone(), json!({"k": [1, 2]})).is_valid());
        assert_eq!(
            check(schema.clone(), json!("other")).render(),
            [r#"$: value "other" not in enum"#]
        );
        assert_eq!(check(schema, json!(true)).count(ViolationKind::Enum), 1);
    }

    #[test]
    fn any_of_single_matching_branch_is_valid() {
        let branches = [
            json!({"type": "string", "minLength": 2}),
            json!({"type": "integer", "minimum": 0}),
            json!({"type": "object", "required": ["id"]}),
        ];
        let schema = json!({"anyOf": branches});
        for instance in [json!("ab"), json!(4), json!({"id": 1})] {
            assert!(check(schema.clone(), instance.clone()).is_valid(), "{instance}");
        }
    }

    #[test]
    fn any_of_no_match_yields_one_synthetic_error() {
        let schema = json!({"anyOf": [
            {"type": "string", "minLength": 2},
            {"type": "integer", "minimum": 0}
        ]});
        let report = check(schema, json!(-1));
        assert_eq!(report.render(), ["$: does not match anyOf options"]);
    }

    #[test]
    fn verbose_any_of_exposes_branch_errors() {
        let schema = json!({"anyOf": [
            {"type": "string"},
            {"type": "integer", "minimum": 0}
        ]});
        let report = check_with(
            StructuralValidator::new().with_verbose_any_of(true),
            schema,
            json!(-1),
        )
        .unwrap();
        assert_eq!(
            report.render(),
            [
                "$: does not match anyOf options",
                "$: anyOf[0]: expected type string",
                "$: anyOf[1]: value -1 < minimum 0",
            ]
        );
        assert_eq!(report.count(ViolationKind::AnyOf), 1);
        assert_eq!(report.count(ViolationKind::AnyOfBranch), 2);
    }

    #[test]
    fn empty_any_of_contributes_nothing() {
        assert!(check(json!({"anyOf": []}), json!(1)).is_valid());
    }

    #[test]
    fn any_of_errors_accumulate_with_sibling_keywords() {
        let schema = json!({
            "anyOf": [{"type": "string"}],
            "type": "integer",
            "minimum": 10
        });
        let report = check(schema, json!(3));
        assert_eq!(
            report.render(),
            ["$: does not match anyOf options", "$: value 3 < minimum 10"]
        );
    }

    #[test]
    fn same_document_refs_resolve_against_root() {
        let schema = json!({
            "definitions": {
                "slug": {"type": "string", "pattern": "^[a-z-]+$"}
            },
            "type": "object",
            "properties": {"id": {"$ref": "#/definitions/slug"}}
        });
        assert!(check(schema.clone(), json!({"id": "brand-voice"})).is_valid());
        assert_eq!(
            check(schema, json!({"id": "Brand Voice"})).render(),
            ["$.id: string does not match pattern '^[a-z-]+$'"]
        );
    }

    #[test]
    fn ref_to_root_matches_direct_validation() {
        let root = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#"}}
            },
            "additionalProperties": false
        });
        let instance = json!({"children": [{"name": 1}, {"name": "ok", "x": 0}], "y": 1});

        let cache = SchemaCache::new();
        let doc = cache.insert(SchemaDocument::new("/schemas/tree.json", root));
        let ctx = ResolutionContext::for_document(Arc::clone(&doc));
        let validator = StructuralValidator::new();
        let direct = validator
            .validate(&instance, doc.root(), &ctx, &InstancePath::root(), &cache)
            .unwrap();
        let via_ref = validator
            .validate(&instance, &json!({"$ref": "#"}), &ctx, &InstancePath::root(), &cache)
            .unwrap();

        assert!(!direct.is_empty());
        assert_eq!(direct, via_ref);
    }

    #[test]
    fn self_ref_without_descent_is_cyclic() {
        let err = check_with(StructuralValidator::new(), json!({"$ref": "#"}), json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference { .. }), "got {err}");
    }

    #[test]
    fn ref_loop_within_document_is_cyclic() {
        let schema = json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"anyOf": [{"$ref": "#/definitions/a"}]}
            },
            "$ref": "#/definitions/a"
        });
        let err = check_with(StructuralValidator::new(), schema, json!(1)).unwrap_err();
        match err {
            SchemaError::CyclicReference { chain } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected CyclicReference, got {other}"),
        }
    }

    #[test]
    fn unresolved_same_document_pointer_is_structural() {
        let err = check_with(
            StructuralValidator::new(),
            json!({"properties": {"a": {"$ref": "#/definitions/missing"}}}),
            json!({"a": 1}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedPointer { ref segment, .. } if segment == "definitions"));
    }

    #[test]
    fn non_string_ref_is_structural() {
        let err = check_with(StructuralValidator::new(), json!({"$ref": 5}), json!(1)).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidReference { .. }));
    }

    #[test]
    fn depth_ceiling_is_reported() {
        let schema = json!({"items": {"$ref": "#"}});
        let instance = json!([[[[[[]]]]]]);
        let err = check_with(StructuralValidator::new().with_max_depth(4), schema.clone(), instance.clone())
            .unwrap_err();
        assert!(matches!(err, SchemaError::DepthExceeded { limit: 4, .. }), "got {err}");

        assert!(check(schema, instance).is_valid());
    }

    #[test]
    fn ref_chain_ceiling_is_reported() {
        let schema = json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"$ref": "#/definitions/c"},
                "c": {"type": "string"}
            },
            "$ref": "#/definitions/a"
        });
        assert!(check(schema.clone(), json!("x")).is_valid());
        let err = check_with(StructuralValidator::new().with_max_ref_chain(2), schema, json!("x"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ReferenceChainTooLong { limit: 2, .. }), "got {err}");
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let schema = json!({"type": "string", "format": "email", "x-docs": "ignored", "const": 1});
        assert!(check(schema, json!("not-an-email")).is_valid());
    }

    #[test]
    fn inputs_are_not_mutated() {
        let schema = json!({"properties": {"a": {"type": "string"}}, "additionalProperties": false});
        let instance = json!({"a": 1, "b": 2});
        let (s, i) = (schema.clone(), instance.clone());
        let _ = check(schema, instance);
        assert_eq!(s, json!({"properties": {"a": {"type": "string"}}, "additionalProperties": false}));
        assert_eq!(i, json!({"a": 1, "b": 2}));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ]
    }

    fn any_json() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    proptest! {
        #[test]
        fn matching_type_alone_is_always_valid(instance in any_json()) {
            let report = check(json!({"type": type_name(&instance)}), instance);
            prop_assert!(report.is_valid());
        }
    }
}
