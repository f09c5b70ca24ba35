//! # Pointer Resolution
//!
//! Resolves an in-document fragment (`#/definitions/name`) to a node.
//! Segments are `/`-separated with `~1` for `/` and `~0` for `~`.

use serde_json::Value;

use crate::document::SchemaDocument;
use crate::error::SchemaError;

/// Strip the leading `#` and `/` from a fragment, yielding the canonical
/// form used in reference identities. The whole document is `""`.
pub fn normalize_pointer(pointer: &str) -> &str {
    let p = pointer.strip_prefix('#').unwrap_or(pointer);
    p.strip_prefix('/').unwrap_or(p)
}

/// Decode one pointer segment. `~1` is decoded before `~0`, so `~01`
/// yields `~1` rather than `/`.
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Resolve `pointer` against `document`.
///
/// `""`, `"#"` and `"#/"` return the root. Each segment descends one
/// mapping key; a numeric segment also indexes into an array. Any segment
/// that does not resolve is a fatal [`SchemaError::UnresolvedPointer`].
pub fn resolve_pointer<'a>(
    document: &'a SchemaDocument,
    pointer: &str,
) -> Result<&'a Value, SchemaError> {
    let path = normalize_pointer(pointer);
    if path.is_empty() {
        return Ok(document.root());
    }

    let mut current = document.root();
    for raw in path.split('/') {
        let segment = unescape_segment(raw);
        let next = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| SchemaError::UnresolvedPointer {
            document: document.path().to_path_buf(),
            pointer: pointer.to_string(),
            segment: segment.clone(),
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc() -> SchemaDocument {
        SchemaDocument::new(
            "/schemas/root.json",
            json!({
                "definitions": {
                    "color": {"type": "string"},
                    "a/b": {"type": "number"},
                    "t~n": {"type": "boolean"}
                },
                "anyOf": [{"type": "null"}, {"type": "integer"}]
            }),
        )
    }

    #[test]
    fn empty_and_hash_return_root() {
        let d = doc();
        for p in ["", "#", "#/", "/"] {
            assert_eq!(resolve_pointer(&d, p).unwrap(), d.root(), "pointer {p:?}");
        }
    }

    #[test]
    fn descends_mapping_keys() {
        let d = doc();
        let node = resolve_pointer(&d, "#/definitions/color").unwrap();
        assert_eq!(node, &json!({"type": "string"}));
    }

    #[test]
    fn unescapes_slash_and_tilde() {
        let d = doc();
        assert_eq!(
            resolve_pointer(&d, "#/definitions/a~1b").unwrap(),
            &json!({"type": "number"})
        );
        assert_eq!(
            resolve_pointer(&d, "#/definitions/t~0n").unwrap(),
            &json!({"type": "boolean"})
        );
    }

    #[test]
    fn indexes_into_arrays() {
        let d = doc();
        assert_eq!(
            resolve_pointer(&d, "#/anyOf/1").unwrap(),
            &json!({"type": "integer"})
        );
    }

    #[test]
    fn missing_segment_is_fatal_and_named() {
        let d = doc();
        let err = resolve_pointer(&d, "#/definitions/missing/deeper").unwrap_err();
        match err {
            SchemaError::UnresolvedPointer { segment, pointer, document } => {
                assert_eq!(segment, "missing");
                assert_eq!(pointer, "#/definitions/missing/deeper");
                assert_eq!(document, std::path::PathBuf::from("/schemas/root.json"));
            }
            other => panic!("expected UnresolvedPointer, got {other}"),
        }
    }

    #[test]
    fn descent_through_scalar_is_fatal() {
        let d = doc();
        let err = resolve_pointer(&d, "#/definitions/color/type/x").unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedPointer { ref segment, .. } if segment == "x"));
    }

    #[test]
    fn tilde_zero_one_decodes_to_literal_tilde_one() {
        assert_eq!(unescape_segment("~01"), "~1");
    }

    proptest! {
        #[test]
        fn escaped_keys_resolve(key in "[a-z/~]{1,12}") {
            let escaped = key.replace('~', "~0").replace('/', "~1");
            let mut defs = serde_json::Map::new();
            defs.insert(key.clone(), json!({ "k": key.clone() }));
            let d = SchemaDocument::new("/s.json", json!({ "defs": defs }));
            let node = resolve_pointer(&d, &format!("#/defs/{escaped}")).unwrap();
            prop_assert_eq!(&node["k"], &json!(key));
        }
    }
}
