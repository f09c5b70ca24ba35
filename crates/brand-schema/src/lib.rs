//! # brand-schema: Content Schema Validation
//!
//! Checks structured content artifacts (brand seeds, section registries,
//! generated outputs) against locally authored schemas, including schemas
//! split across files with `$ref`.
//!
//! ## Engines
//!
//! - **Draft-7** ([`draft7`], default feature `draft7`): the `jsonschema`
//!   crate, rooted at the schema file so relative references resolve
//!   against sibling files. The reference graph is checked up front, so
//!   cycles are reported the same way on both engines.
//! - **Structural** ([`StructuralValidator`]): a built-in validator for the
//!   keyword subset the content schemas use. Always available.
//!
//! [`SchemaValidator`] selects one engine at construction and exposes
//! `validate_file(schema, data)`. Both engines return a
//! [`ValidationReport`] whose entries render as `<path>: <message>`, with
//! `$`-rooted instance locators. Callers may rely on identical pass/fail
//! verdicts between engines for the common keyword subset, not on
//! identical message text.
//!
//! ## Errors
//!
//! Violations are data. Problems with the schema machinery itself (missing
//! or malformed documents, unresolvable pointers or references, reference
//! cycles, resource ceilings) are [`SchemaError`]s that abort the call.
//!
//! ```no_run
//! use brand_schema::{SchemaValidator, ValidatorConfig};
//!
//! let validator = SchemaValidator::new(ValidatorConfig::default())?;
//! let report = validator.validate_file("schemas/seed.schema.json", "seed.json")?;
//! for line in report.render() {
//!     eprintln!("- {line}");
//! }
//! # Ok::<(), brand_schema::SchemaError>(())
//! ```

pub mod cache;
pub mod config;
pub mod document;
#[cfg(feature = "draft7")]
pub mod draft7;
pub mod engine;
pub mod error;
pub mod graph;
pub mod pointer;
pub mod resolve;
pub mod structural;
pub mod validator;
pub mod violation;

pub use cache::SchemaCache;
pub use config::{ConfigError, ValidatorConfig};
pub use document::{SchemaDocument, SharedDocument};
pub use engine::{EngineChoice, EngineKind, ValidationEngine};
pub use error::SchemaError;
pub use graph::check_reference_graph;
pub use pointer::resolve_pointer;
pub use resolve::{resolve_ref, ResolutionContext, ResolvedRef};
pub use structural::StructuralValidator;
pub use validator::{validate_file, SchemaValidator};
pub use violation::{InstancePath, ValidationReport, Violation, ViolationKind};
