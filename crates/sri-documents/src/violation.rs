//! # Violations: Accumulated Validation Findings
//!
//! A [`Violation`] names a stable rule code, its category, the field path it
//! concerns and a human-readable message. Validators push violations into a
//! [`Violations`] accumulator and finish with a [`ValidationResult`].
//!
//! Paths are dotted with zero-based indices: `recipients[0].items[2].quantity`.

use serde::Serialize;
use sri_core::{AccessKeyError, IdentifierDefect};

/// Category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Missing or malformed required field.
    Structural,
    /// An identifier or access key fails its check digit.
    Checksum,
    /// A cross-field regulatory rule fails.
    BusinessRule,
    /// A date window, count or numeric bound is exceeded.
    Range,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Structural => "structural",
            Self::Checksum => "checksum",
            Self::BusinessRule => "business_rule",
            Self::Range => "range",
        };
        f.write_str(s)
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Stable rule code, e.g. `AMOUNT_EXCEEDS_ORIGINAL`.
    pub code: &'static str,
    pub kind: ViolationKind,
    /// Field the violation concerns.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} at {}: {}", self.kind, self.code, self.path, self.message)
    }
}

/// Outcome of validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    /// Violations in the order the rules produced them.
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The violations; empty when valid.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v,
        }
    }

    /// Violations of one category.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations().iter().filter(move |v| v.kind == kind)
    }

    /// Whether any violation carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.violations().iter().any(|v| v.code == code)
    }

    pub fn into_result(self) -> Result<(), Vec<Violation>> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(v) => Err(v),
        }
    }
}

/// Accumulator used by validation rules.
#[derive(Debug, Default)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: ViolationKind,
        code: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.items.push(Violation {
            code,
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn structural(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.push(ViolationKind::Structural, code, path, message);
    }

    pub fn checksum(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.push(ViolationKind::Checksum, code, path, message);
    }

    pub fn business(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.push(ViolationKind::BusinessRule, code, path, message);
    }

    pub fn range(&mut self, code: &'static str, path: impl Into<String>, message: impl Into<String>) {
        self.push(ViolationKind::Range, code, path, message);
    }

    /// Record an identifier defect: check-digit failures are checksum
    /// violations, everything else is structural.
    pub fn identifier(&mut self, path: impl Into<String>, defect: &IdentifierDefect) {
        if defect.is_checksum() {
            self.checksum("IDENTIFIER_CHECKSUM", path, defect.to_string());
        } else {
            self.structural("IDENTIFIER_MALFORMED", path, defect.to_string());
        }
    }

    /// Record an access-key error with the same split.
    pub fn access_key(&mut self, path: impl Into<String>, error: &AccessKeyError) {
        if error.is_checksum() {
            self.checksum("ACCESS_KEY_CHECKSUM", path, error.to_string());
        } else {
            self.structural("ACCESS_KEY_MALFORMED", path, error.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_result(self) -> ValidationResult {
        if self.items.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(self.items)
        }
    }
}
