//! # Documents
//!
//! Loading of schema and data documents from disk, and the path
//! normalization that gives every schema document a stable identity.
//!
//! Documents are JSON. Files with a `.yaml` or `.yml` extension are parsed
//! as YAML and converted into the same [`serde_json::Value`] model, so the
//! validators never see two value representations.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;

/// One loaded schema file: its root node and the normalized absolute path
/// that identifies it. Immutable once loaded.
#[derive(Debug)]
pub struct SchemaDocument {
    path: PathBuf,
    root: Value,
}

impl SchemaDocument {
    /// Wrap an already-parsed value under the given identity.
    ///
    /// The path is normalized, so two spellings of the same location
    /// produce equal identities.
    pub fn new(path: impl AsRef<Path>, root: Value) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            root,
        }
    }

    /// Read and parse a document from disk.
    pub fn load(path: impl AsRef<Path>, referenced_from: Option<&str>) -> Result<Self, SchemaError> {
        let path = normalize_path(path.as_ref());
        let root = load_value(&path, referenced_from)?;
        Ok(Self { path, root })
    }

    /// Normalized absolute path of this document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory used to resolve relative file references found inside
    /// this document.
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Root node of the document.
    pub fn root(&self) -> &Value {
        &self.root
    }
}

/// Shared handle to a loaded document.
pub type SharedDocument = Arc<SchemaDocument>;

/// Make a path absolute (against the current directory) and collapse `.`
/// and `..` components lexically. Symlinks are not followed.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Read a JSON or YAML file into a JSON value.
///
/// A missing file is [`SchemaError::DocumentNotFound`] carrying the
/// referencing location; unreadable or malformed content is reported with
/// the path and the underlying diagnostic.
pub fn load_value(path: &Path, referenced_from: Option<&str>) -> Result<Value, SchemaError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SchemaError::DocumentNotFound {
                path: path.to_path_buf(),
                referenced_from: referenced_from.map(str::to_string),
            });
        }
        Err(e) => {
            return Err(SchemaError::DocumentRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded document");

    if is_yaml(path) {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| SchemaError::DocumentParse {
                path: path.to_path_buf(),
                reason: format!("invalid YAML: {e}"),
            })?;
        yaml_to_json(&yaml).map_err(|reason| SchemaError::DocumentParse {
            path: path.to_path_buf(),
            reason,
        })
    } else {
        serde_json::from_str(&content).map_err(|e| SchemaError::DocumentParse {
            path: path.to_path_buf(),
            reason: format!("invalid JSON: {e}"),
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Convert a YAML value tree into the JSON value model.
///
/// Scalar map keys are stringified, tags are dropped, and floats that JSON
/// cannot represent (NaN, infinities) are rejected.
fn yaml_to_json(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("non-finite number {f} has no JSON form"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        Yaml::String(s) => Ok(Value::String(s.clone())),
        Yaml::Sequence(seq) => seq.iter().map(yaml_to_json).collect::<Result<_, _>>().map(Value::Array),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    other => return Err(format!("unsupported mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json(v)?);
            }
            Ok(Value::Object(object))
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}
