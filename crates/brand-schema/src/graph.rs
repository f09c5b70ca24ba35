//! # Reference Graph Check
//!
//! Walks every `$ref` reachable from a schema without an instance, the way
//! a compiling engine does. The chain rules match the structural
//! validator: references and in-place applicators (`allOf`, `anyOf`,
//! `oneOf`, `not`, `if`/`then`/`else`, schema `dependencies`) stay at the
//! same instance location and share one [`RefChain`]; `properties`,
//! `items` and the other child applicators start a fresh chain.
//!
//! A schema that passes this check has no reference cycle that consumes no
//! instance, and no chain longer than the configured ceiling. Every
//! referenced document and pointer is resolved along the way, so a broken
//! reference surfaces as the same [`SchemaError`] either engine reports.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::SchemaCache;
use crate::document::SharedDocument;
use crate::error::SchemaError;
use crate::resolve::{resolve_ref, RefChain, RefIdentity, ResolutionContext};

/// Subschemas applied to the same instance location.
const IN_PLACE: &[&str] = &["allOf", "anyOf", "oneOf", "not", "if", "then", "else"];

/// Mappings of subschemas applied to members of an object.
const CHILD_MAPS: &[&str] = &["properties", "patternProperties"];

/// Subschemas (or arrays of them) applied to members, items or keys.
const CHILD_SCHEMAS: &[&str] = &[
    "additionalProperties",
    "items",
    "additionalItems",
    "contains",
    "propertyNames",
];

/// Check the `$ref` graph reachable from `schema`.
///
/// Fails with [`SchemaError::CyclicReference`] or
/// [`SchemaError::ReferenceChainTooLong`] under the same rules the
/// structural validator applies at validation time, and with the usual
/// resolution errors for references that do not resolve.
pub fn check_reference_graph(
    schema: &SharedDocument,
    cache: &SchemaCache,
    max_ref_chain: usize,
) -> Result<(), SchemaError> {
    let mut walk = GraphWalk {
        cache,
        limit: max_ref_chain,
        expanded: HashSet::new(),
    };
    let context = ResolutionContext::for_document(Arc::clone(schema));
    walk.location(schema.root(), &context, String::new())?;
    tracing::trace!(
        schema = %schema.path().display(),
        locations = walk.expanded.len(),
        "reference graph checked"
    );
    Ok(())
}

struct GraphWalk<'a> {
    cache: &'a SchemaCache,
    limit: usize,
    expanded: HashSet<RefIdentity>,
}

impl GraphWalk<'_> {
    /// Walk `node` as the start of a new instance location, once per node.
    fn location(
        &mut self,
        node: &Value,
        context: &ResolutionContext,
        pointer: String,
    ) -> Result<(), SchemaError> {
        let identity = RefIdentity::new(context.root().path(), &pointer);
        if !self.expanded.insert(identity) {
            return Ok(());
        }
        let mut chain = RefChain::new(self.limit);
        self.node(node, context, &pointer, &mut chain)
    }

    fn node(
        &mut self,
        node: &Value,
        context: &ResolutionContext,
        pointer: &str,
        chain: &mut RefChain,
    ) -> Result<(), SchemaError> {
        let Value::Object(schema) = node else {
            return Ok(());
        };

        if let Some(reference) = schema.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| SchemaError::InvalidReference {
                reference: reference.to_string(),
                reason: "$ref must be a string".to_string(),
            })?;
            let resolved = resolve_ref(reference, context, self.cache)?;
            chain.enter(resolved.identity(), reference)?;
            self.node(
                resolved.node()?,
                resolved.context(),
                resolved.identity().pointer(),
                chain,
            )?;
            chain.leave();
        }

        for keyword in IN_PLACE {
            match schema.get(*keyword) {
                Some(Value::Array(subschemas)) => {
                    for (i, sub) in subschemas.iter().enumerate() {
                        let at = child(&child(pointer, keyword), &i.to_string());
                        self.node(sub, context, &at, chain)?;
                    }
                }
                Some(sub) => self.node(sub, context, &child(pointer, keyword), chain)?,
                None => {}
            }
        }

        if let Some(Value::Object(dependencies)) = schema.get("dependencies") {
            for (name, sub) in dependencies {
                if sub.is_object() {
                    let at = child(&child(pointer, "dependencies"), name);
                    self.node(sub, context, &at, chain)?;
                }
            }
        }

        for keyword in CHILD_MAPS {
            if let Some(Value::Object(members)) = schema.get(*keyword) {
                for (name, sub) in members {
                    self.location(sub, context, child(&child(pointer, keyword), name))?;
                }
            }
        }

        for keyword in CHILD_SCHEMAS {
            match schema.get(*keyword) {
                Some(Value::Array(subschemas)) => {
                    for (i, sub) in subschemas.iter().enumerate() {
                        self.location(sub, context, child(&child(pointer, keyword), &i.to_string()))?;
                    }
                }
                Some(sub) => self.location(sub, context, child(pointer, keyword))?,
                None => {}
            }
        }

        Ok(())
    }
}

/// Append one escaped segment to a normalized pointer.
fn child(pointer: &str, segment: &str) -> String {
    let segment = segment.replace('~', "~0").replace('/', "~1");
    if pointer.is_empty() {
        segment
    } else {
        format!("{pointer}/{segment}")
    }
}
