//! # Reference Resolution
//!
//! Resolves `$ref` strings to a target node plus the context that nested
//! references inside that target must use.
//!
//! - `#/pointer` resolves against the current root document. Base
//!   directory and root are unchanged.
//! - `file.json#/pointer` (pointer optional) loads `file.json` relative to
//!   the current base directory through the [`SchemaCache`]. Base directory
//!   and root both switch to the loaded file, so references written inside
//!   a foreign document always resolve relative to that document.
//!
//! Reference cycles are detected by [`RefChain`], which records the
//! `(path, pointer)` identities followed at one instance location.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cache::SchemaCache;
use crate::document::{normalize_path, SharedDocument};
use crate::error::SchemaError;
use crate::pointer::{normalize_pointer, resolve_pointer};

/// Base directory and root document in effect for a schema node.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    base_dir: PathBuf,
    root: SharedDocument,
}

impl ResolutionContext {
    /// Context for validating against the root of `document`.
    pub fn for_document(document: SharedDocument) -> Self {
        Self {
            base_dir: document.base_dir(),
            root: document,
        }
    }

    /// Directory that relative file references resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Document that same-document pointers resolve against.
    pub fn root(&self) -> &SharedDocument {
        &self.root
    }
}

/// Identity of a reference target: normalized document path plus
/// normalized pointer (`""` for the whole document).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefIdentity {
    path: PathBuf,
    pointer: String,
}

impl RefIdentity {
    pub(crate) fn new(path: &Path, pointer: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            pointer: normalize_pointer(pointer).to_string(),
        }
    }

    /// Normalized pointer, without the leading `#/`.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }
}

impl fmt::Display for RefIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "{}#", self.path.display())
        } else {
            write!(f, "{}#/{}", self.path.display(), self.pointer)
        }
    }
}

/// A resolved `$ref`: the target's identity and the context in which the
/// target node must be validated.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    identity: RefIdentity,
    context: ResolutionContext,
}

impl ResolvedRef {
    /// The target node inside the new root document.
    pub fn node(&self) -> Result<&Value, SchemaError> {
        resolve_pointer(&self.context.root, &self.identity.pointer)
    }

    /// Context for the target node.
    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// `(path, pointer)` identity used for cycle detection.
    pub fn identity(&self) -> &RefIdentity {
        &self.identity
    }
}

/// Resolve `reference` found in a node validated under `context`.
///
/// File loads go through `cache`; a missing file or a pointer that does
/// not resolve is a fatal [`SchemaError`].
pub fn resolve_ref(
    reference: &str,
    context: &ResolutionContext,
    cache: &SchemaCache,
) -> Result<ResolvedRef, SchemaError> {
    if reference.starts_with('#') {
        resolve_pointer(&context.root, reference)?;
        return Ok(ResolvedRef {
            identity: RefIdentity::new(context.root.path(), reference),
            context: context.clone(),
        });
    }

    let (file_part, pointer) = match reference.find('#') {
        Some(i) => (&reference[..i], &reference[i..]),
        None => (reference, ""),
    };
    if file_part.is_empty() {
        return Err(SchemaError::InvalidReference {
            reference: reference.to_string(),
            reason: "empty file part".to_string(),
        });
    }

    let target = normalize_path(&context.base_dir.join(file_part));
    let referenced_from = format!("{reference} in {}", context.root.path().display());
    let document = cache.load(&target, Some(&referenced_from))?;

    tracing::trace!(
        reference,
        target = %document.path().display(),
        pointer,
        "resolved file reference"
    );

    resolve_pointer(&document, pointer)?;
    Ok(ResolvedRef {
        identity: RefIdentity::new(document.path(), pointer),
        context: ResolutionContext::for_document(document),
    })
}

/// The `$ref` identities followed at one instance location.
///
/// A reference that returns to an identity already on the chain can never
/// consume any of the instance, so it is reported as a cycle. Descending
/// into a property or item starts a fresh chain.
#[derive(Debug, Clone)]
pub struct RefChain {
    visited: Vec<RefIdentity>,
    limit: usize,
}

impl RefChain {
    /// Empty chain allowing at most `limit` hops.
    pub fn new(limit: usize) -> Self {
        Self {
            visited: Vec::new(),
            limit,
        }
    }

    /// Empty chain with the same ceiling, for a child instance location.
    pub fn fresh(&self) -> Self {
        Self::new(self.limit)
    }

    /// Record a hop to `identity`.
    pub fn enter(&mut self, identity: &RefIdentity, reference: &str) -> Result<(), SchemaError> {
        if self.visited.contains(identity) {
            let mut chain: Vec<String> = self.visited.iter().map(ToString::to_string).collect();
            chain.push(identity.to_string());
            return Err(SchemaError::CyclicReference { chain });
        }
        if self.visited.len() >= self.limit {
            return Err(SchemaError::ReferenceChainTooLong {
                limit: self.limit,
                reference: reference.to_string(),
            });
        }
        self.visited.push(identity.clone());
        Ok(())
    }

    /// Undo the most recent [`enter`](Self::enter).
    pub fn leave(&mut self) {
        self.visited.pop();
    }

    /// Number of hops currently on the chain.
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Returns true if no hop is recorded.
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
