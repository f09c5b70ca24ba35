//! # Structural Errors
//!
//! Failures in the schema machinery itself: a document that cannot be
//! loaded or parsed, a pointer or `$ref` that cannot be resolved, a
//! reference cycle, or a resource ceiling being hit.
//!
//! These are distinct from validation violations. A violation describes
//! the instance and is reported as data in a
//! [`ValidationReport`](crate::ValidationReport); a `SchemaError` aborts
//! the whole `validate_file` call and is never folded into a report.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal error raised while loading or resolving schema documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema or data document does not exist.
    #[error("document not found: {path}{}", referenced_suffix(.referenced_from))]
    DocumentNotFound {
        /// Normalized path that was requested.
        path: PathBuf,
        /// The `$ref` (or caller) that requested the document, if any.
        referenced_from: Option<String>,
    },

    /// A document exists but could not be read.
    #[error("cannot read document {path}: {reason}")]
    DocumentRead {
        /// Normalized path of the document.
        path: PathBuf,
        /// Underlying IO failure.
        reason: String,
    },

    /// A document was read but is not well-formed JSON/YAML.
    #[error("cannot parse document {path}: {reason}")]
    DocumentParse {
        /// Normalized path of the document.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// A pointer segment does not name a node in the target document.
    #[error("unresolved pointer segment '{segment}' in '{pointer}' (document {document})")]
    UnresolvedPointer {
        /// Document the pointer was resolved against.
        document: PathBuf,
        /// The full original pointer.
        pointer: String,
        /// The first segment that failed to resolve.
        segment: String,
    },

    /// A `$ref` value is malformed (not a string, or an empty file part).
    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The raw reference as written in the schema.
        reference: String,
        /// Why the reference was rejected.
        reason: String,
    },

    /// Following `$ref`s returned to an identity already on the chain.
    #[error("cyclic reference: {}", .chain.join(" -> "))]
    CyclicReference {
        /// The `path#pointer` identities visited, ending with the repeat.
        chain: Vec<String>,
    },

    /// Too many consecutive `$ref` hops without consuming the instance.
    #[error("reference chain exceeded {limit} hops at '{reference}'")]
    ReferenceChainTooLong {
        /// Configured ceiling.
        limit: usize,
        /// The reference that would have exceeded it.
        reference: String,
    },

    /// The validator recursed deeper than the configured ceiling.
    #[error("validation depth exceeded {limit} at {path}")]
    DepthExceeded {
        /// Configured ceiling.
        limit: usize,
        /// Instance locator where the ceiling was hit.
        path: String,
    },

    /// A `pattern` keyword holds an expression that does not compile.
    #[error("invalid pattern '{pattern}' at {path}: {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Instance locator being checked.
        path: String,
        /// Regex compiler diagnostic.
        reason: String,
    },

    /// The requested engine was not compiled into this build.
    #[error("validation engine '{engine}' is not available in this build")]
    EngineUnavailable {
        /// Name of the requested engine.
        engine: String,
    },

    /// The Draft-7 engine rejected the schema while compiling it.
    #[error("cannot build validator for schema {schema}: {reason}")]
    EngineBuild {
        /// Schema document path.
        schema: PathBuf,
        /// Engine diagnostic.
        reason: String,
    },
}

fn referenced_suffix(referenced_from: &Option<String>) -> String {
    match referenced_from {
        Some(r) => format!(" (referenced from '{r}')"),
        None => String::new(),
    }
}
