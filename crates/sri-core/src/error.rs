//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used by the core primitives. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Identifier defects say exactly which structural step failed, so the
//!   document validators can classify them as structural or checksum
//!   violations without string matching.
//! - Access-key errors distinguish a malformed key from one whose check
//!   digit does not verify.
//! - Document validation failures are *not* errors. They are returned as
//!   values by `sri-documents`; the types here cover constructor and I/O
//!   failures only.

use serde::Serialize;
use thiserror::Error;

use crate::codes::DocumentType;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum SriError {
    /// An identifier failed validation.
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierDefect),

    /// A fixed-width code was malformed.
    #[error("code error: {0}")]
    Code(#[from] CodeError),

    /// Access key generation or parsing failed.
    #[error("access key error: {0}")]
    AccessKey(#[from] AccessKeyError),

    /// Validation policy could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why a national identifier was rejected.
///
/// Variants are ordered the way the checks run: shape first, then the
/// province and subclass prefixes, then the establishment suffix, and the
/// check digit last.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "defect", rename_all = "snake_case")]
pub enum IdentifierDefect {
    /// Wrong number of characters.
    #[error("expected {expected} digits, got {actual} characters")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Contains something other than ASCII digits.
    #[error("identifier must contain only digits")]
    NonDigit,

    /// First two digits are not a province code in 01..=24.
    #[error("invalid province code {0:02}")]
    InvalidProvince(u8),

    /// Third digit does not select a known identifier subclass.
    #[error("invalid third digit {0}")]
    InvalidThirdDigit(u8),

    /// Trailing establishment suffix of an entity identifier is 000.
    #[error("establishment suffix must be 001 or greater")]
    InvalidEstablishment,

    /// Check digit does not match the computed value.
    #[error("check digit mismatch: computed {computed}, found {found}")]
    ChecksumMismatch {
        /// Value produced by the check-digit engine (may be 10 under the
        /// standard modulo-11 table, which never matches a single digit).
        computed: u8,
        /// Digit present in the identifier.
        found: u8,
    },

    /// Passport numbers are 6 to 20 uppercase letters or digits.
    #[error("invalid passport number")]
    InvalidPassport,

    /// Foreign identifications are 1 to 20 characters.
    #[error("invalid foreign identification")]
    InvalidForeignId,

    /// The final-consumer identification type requires the fixed sentinel.
    #[error("final consumer identification must be 9999999999999")]
    NotFinalConsumer,

    /// Identification type code is not in the catalog.
    #[error("unknown identification type code {0:?}")]
    UnknownType(String),
}

impl IdentifierDefect {
    /// Whether this defect is a check-digit failure rather than a
    /// structural one.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

/// A fixed-width code (establishment, emission point, sequential, numeric
/// fill, document type) was malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// Establishment code is not exactly three digits.
    #[error("establishment code must be exactly 3 digits, got {0:?}")]
    Establishment(String),

    /// Emission point code is not exactly three digits.
    #[error("emission point code must be exactly 3 digits, got {0:?}")]
    EmissionPoint(String),

    /// Sequential outside 1..=999_999_999.
    #[error("sequential must be between 1 and 999999999, got {0}")]
    Sequential(u64),

    /// Numeric fill outside 0..=99_999_999 or not eight digits.
    #[error("numeric fill must be 8 digits, got {0:?}")]
    NumericFill(String),

    /// Document type code not recognised.
    #[error("unknown document type code {0:?}")]
    DocumentType(String),

    /// Voucher number is not `EEE-PPP-SSSSSSSSS`.
    #[error("voucher number must be EEE-PPP-SSSSSSSSS, got {0:?}")]
    VoucherNumber(String),
}

/// Error generating or parsing a 49-digit access key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessKeyError {
    /// Key is not exactly 49 characters.
    #[error("access key must be 49 digits, got {0} characters")]
    WrongLength(usize),

    /// Key contains a non-digit character.
    #[error("access key must contain only digits")]
    NonDigit,

    /// Embedded emission date is not a calendar date.
    #[error("access key embeds an invalid date {0:?}")]
    InvalidDate(String),

    /// Embedded document type code is unknown.
    #[error("access key embeds an unknown document type {0:?}")]
    UnknownDocumentType(String),

    /// Trailing check digit does not verify.
    #[error("access key check digit mismatch: computed {computed}, found {found}")]
    ChecksumMismatch {
        /// Digit computed from the 48-digit body.
        computed: u8,
        /// Digit present in the key.
        found: u8,
    },

    /// The standard modulo-11 table produced 10 for this body. The caller
    /// must supply a different numeric fill.
    #[error("check digit for {document_type} key is 10 under the standard table; choose another numeric fill")]
    UnrepresentableCheckDigit {
        /// Document type whose remap table produced the value.
        document_type: DocumentType,
    },
}

impl AccessKeyError {
    /// Whether this error is a check-digit failure rather than a
    /// structural one.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

/// Error loading a [`crate::ValidationPolicy`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The policy file could not be read.
    #[error("failed to read policy file {path}: {source}")]
    Read {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The policy document is not valid YAML for the policy schema.
    #[error("failed to parse policy: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A policy value is out of range.
    #[error("invalid policy value for {field}: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_defect_display() {
        let e = IdentifierDefect::InvalidProvince(30);
        assert_eq!(e.to_string(), "invalid province code 30");
        let e = IdentifierDefect::WrongLength {
            expected: 10,
            actual: 9,
        };
        assert!(e.to_string().contains("expected 10 digits"));
    }

    #[test]
    fn checksum_classification() {
        assert!(IdentifierDefect::ChecksumMismatch {
            computed: 3,
            found: 4
        }
        .is_checksum());
        assert!(!IdentifierDefect::NonDigit.is_checksum());
        assert!(AccessKeyError::ChecksumMismatch {
            computed: 1,
            found: 2
        }
        .is_checksum());
        assert!(!AccessKeyError::WrongLength(48).is_checksum());
    }

    #[test]
    fn defect_serializes_with_tag() {
        let json = serde_json::to_value(IdentifierDefect::InvalidThirdDigit(7)).unwrap();
        assert_eq!(json["defect"], "invalid_third_digit");
    }

    #[test]
    fn sri_error_from_conversions() {
        let e: SriError = IdentifierDefect::NonDigit.into();
        assert!(matches!(e, SriError::Identifier(_)));
        let e: SriError = CodeError::Sequential(0).into();
        assert!(e.to_string().starts_with("code error"));
    }
}
