//! # Access Key: 49-Digit Document Identity
//!
//! Layout (all ASCII digits, fixed widths):
//!
//! ```text
//! offset  0..8   emission date DDMMYYYY
//!         8..10  document type code
//!        10..23  issuer RUC
//!        23      environment flag
//!        24..27  establishment
//!        27..30  emission point
//!        30..39  sequential (zero-padded)
//!        39..47  numeric fill
//!        47      emission type flag
//!        48      check digit
//! ```
//!
//! The check digit is modulo 11 over the first 48 digits, right to left,
//! weights `2..=7` cycling. The remap table is the one the document type
//! declares through [`DocumentType::access_key_remap`].
//!
//! Generation is a pure function of [`AccessKeyInput`]. The numeric fill is
//! an input, so the same input always yields the same key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::checkdigit::{mod11, parse_digits, Direction, Mod11Remap, ACCESS_KEY_WEIGHTS};
use crate::codes::{
    DocumentType, EmissionPoint, EmissionType, Environment, Establishment, NumericFill, Sequential,
};
use crate::error::AccessKeyError;
use crate::identity::Ruc;
use crate::temporal::KEY_DATE_FORMAT;

/// Total width of an access key.
pub const ACCESS_KEY_LEN: usize = 49;

const BODY_LEN: usize = ACCESS_KEY_LEN - 1;

/// Everything an access key is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyInput {
    pub emission_date: NaiveDate,
    pub document_type: DocumentType,
    pub issuer: Ruc,
    #[serde(default)]
    pub environment: Environment,
    pub establishment: Establishment,
    pub emission_point: EmissionPoint,
    pub sequential: Sequential,
    pub numeric_fill: NumericFill,
    #[serde(default)]
    pub emission_type: EmissionType,
}

impl AccessKeyInput {
    /// The 48-digit body, before the check digit.
    pub fn body(&self) -> String {
        let mut body = String::with_capacity(ACCESS_KEY_LEN);
        body.push_str(&self.emission_date.format(KEY_DATE_FORMAT).to_string());
        body.push_str(self.document_type.code());
        body.push_str(self.issuer.as_str());
        body.push_str(self.environment.code());
        body.push_str(self.establishment.as_str());
        body.push_str(self.emission_point.as_str());
        body.push_str(&self.sequential.padded());
        body.push_str(&self.numeric_fill.padded());
        body.push_str(self.emission_type.code());
        body
    }
}

/// Compute the check value for a 48-digit body under `remap`.
///
/// Returns `None` if the body contains a non-digit. Under
/// [`Mod11Remap::Standard`] the value may be 10.
pub fn compute_check_digit(body: &str, remap: Mod11Remap) -> Option<u8> {
    let digits = parse_digits(body)?;
    Some(mod11(&digits, &ACCESS_KEY_WEIGHTS, Direction::RightToLeft, remap))
}

/// A validated 49-digit access key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessKey(String);

impl<'de> Deserialize<'de> for AccessKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl AccessKey {
    /// Generate the key for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKeyError::UnrepresentableCheckDigit`] when the
    /// document type's remap table yields 10; the caller picks another
    /// numeric fill.
    pub fn generate(input: &AccessKeyInput) -> Result<Self, AccessKeyError> {
        let body = input.body();
        let remap = input.document_type.access_key_remap();
        let check = compute_check_digit(&body, remap).ok_or(AccessKeyError::NonDigit)?;
        if check > 9 {
            tracing::debug!(
                document_type = %input.document_type,
                "access key check digit unrepresentable"
            );
            return Err(AccessKeyError::UnrepresentableCheckDigit {
                document_type: input.document_type,
            });
        }
        tracing::debug!(document_type = %input.document_type, %remap, "access key generated");
        Ok(Self(format!("{body}{check}")))
    }

    /// Parse and verify a key: width, digits, embedded date, document type
    /// and check digit.
    pub fn parse(value: &str) -> Result<Self, AccessKeyError> {
        let len = value.chars().count();
        if len != ACCESS_KEY_LEN {
            return Err(AccessKeyError::WrongLength(len));
        }
        let digits = parse_digits(value).ok_or(AccessKeyError::NonDigit)?;
        let date = &value[0..8];
        NaiveDate::parse_from_str(date, KEY_DATE_FORMAT)
            .map_err(|_| AccessKeyError::InvalidDate(date.to_string()))?;
        let document_type = DocumentType::from_code(&value[8..10])
            .map_err(|_| AccessKeyError::UnknownDocumentType(value[8..10].to_string()))?;
        let computed = mod11(
            &digits[..BODY_LEN],
            &ACCESS_KEY_WEIGHTS,
            Direction::RightToLeft,
            document_type.access_key_remap(),
        );
        let found = digits[BODY_LEN];
        if computed != found {
            return Err(AccessKeyError::ChecksumMismatch { computed, found });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Emission date embedded at offsets 0..8.
    pub fn emission_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0[0..8], KEY_DATE_FORMAT).ok()
    }

    /// Document type embedded at offsets 8..10.
    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_code(&self.0[8..10]).ok()
    }

    pub fn issuer(&self) -> &str {
        &self.0[10..23]
    }

    pub fn environment(&self) -> Option<Environment> {
        Environment::from_code(&self.0[23..24])
    }

    pub fn establishment(&self) -> &str {
        &self.0[24..27]
    }

    pub fn emission_point(&self) -> &str {
        &self.0[27..30]
    }

    pub fn sequential(&self) -> &str {
        &self.0[30..39]
    }

    pub fn numeric_fill(&self) -> &str {
        &self.0[39..47]
    }

    pub fn emission_type(&self) -> &str {
        &self.0[47..48]
    }

    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[BODY_LEN] - b'0'
    }
}

impl std::fmt::Display for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
