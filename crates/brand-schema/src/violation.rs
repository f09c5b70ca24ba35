//! # Violations
//!
//! Validation findings against an instance. A [`Violation`] pairs an
//! instance locator with a message; a [`ValidationReport`] is the ordered
//! list returned by one validation. An empty report means the instance is
//! valid.
//!
//! Locators always describe the instance, never the schema: `$` is the
//! root, `.name` descends into a mapping key and `[index]` into a sequence.

use std::fmt;

use serde::Serialize;

/// Keyword family that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// `type` did not match.
    Type,
    /// Value not listed in `enum`.
    Enum,
    /// String shorter than `minLength`.
    MinLength,
    /// String does not match `pattern`.
    Pattern,
    /// Number below `minimum`.
    Minimum,
    /// Number above `maximum`.
    Maximum,
    /// Sequence shorter than `minItems`.
    MinItems,
    /// Sequence longer than `maxItems`.
    MaxItems,
    /// Name listed in `required` is absent.
    Required,
    /// Key rejected by `additionalProperties: false`.
    AdditionalProperty,
    /// No `anyOf` alternative matched.
    AnyOf,
    /// Sub-error of one `anyOf` alternative (verbose mode only).
    AnyOfBranch,
    /// Reported by the Draft-7 engine; the message carries the detail.
    Engine,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Instance locator (`$`, `$.name`, `$.list[0]`).
    pub path: String,
    /// Human-readable description.
    pub message: String,
    /// Keyword family.
    pub kind: ViolationKind,
}

impl Violation {
    /// Build a violation at `path`.
    pub fn new(path: &InstancePath, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.as_str().to_string(),
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Instance locator under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePath(String);

impl InstancePath {
    /// The root locator, `$`.
    pub fn root() -> Self {
        Self("$".to_string())
    }

    /// Locator of mapping key `name` below this one.
    pub fn property(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    /// Locator of sequence element `index` below this one.
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    /// Rendered locator.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstancePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered violations from one validation. Never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Empty (valid) report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the instance is valid.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Count of violations of one kind.
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    /// `<path>: <message>` lines in report order.
    pub fn render(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub(crate) fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }
}

impl From<Vec<Violation>> for ValidationReport {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
