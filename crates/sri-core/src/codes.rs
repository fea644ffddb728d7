//! # Fixed-Width Codes
//!
//! Enumerated codes and zero-padded numeric fields that appear in both the
//! access key and the document bodies. Every type here validates its width
//! at construction, so the access-key layout can never drift.

use serde::{Deserialize, Serialize};

use crate::checkdigit::Mod11Remap;
use crate::error::CodeError;
use crate::identity::impl_validating_deserialize;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Electronic document type (`codDoc`).
///
/// The monthly transactional summary has no code: it carries no access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "01")]
    Invoice,
    #[serde(rename = "04")]
    CreditNote,
    #[serde(rename = "05")]
    DebitNote,
    #[serde(rename = "06")]
    ShipmentGuide,
    #[serde(rename = "07")]
    Withholding,
}

impl DocumentType {
    /// All access-key-bearing document types.
    pub fn all() -> &'static [DocumentType] {
        &[
            Self::Invoice,
            Self::CreditNote,
            Self::DebitNote,
            Self::ShipmentGuide,
            Self::Withholding,
        ]
    }

    /// Two-digit code embedded in the access key.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "01",
            Self::CreditNote => "04",
            Self::DebitNote => "05",
            Self::ShipmentGuide => "06",
            Self::Withholding => "07",
        }
    }

    /// Look up a type by its two-digit code.
    pub fn from_code(code: &str) -> Result<Self, CodeError> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| CodeError::DocumentType(code.to_string()))
    }

    /// The modulo-11 remap table this type's access key is checked with.
    pub fn access_key_remap(&self) -> Mod11Remap {
        match self {
            Self::Invoice | Self::ShipmentGuide => Mod11Remap::Standard,
            Self::Withholding | Self::CreditNote | Self::DebitNote => Mod11Remap::Extended,
        }
    }

    /// Root element name of the rendered document.
    pub fn root_name(&self) -> &'static str {
        match self {
            Self::Invoice => "factura",
            Self::CreditNote => "notaCredito",
            Self::DebitNote => "notaDebito",
            Self::ShipmentGuide => "guiaRemision",
            Self::Withholding => "comprobanteRetencion",
        }
    }

    /// Schema version attribute of the rendered root.
    pub fn schema_version(&self) -> &'static str {
        match self {
            Self::Invoice => "1.1.0",
            Self::CreditNote => "1.1.0",
            Self::DebitNote => "1.0.0",
            Self::ShipmentGuide => "1.1.0",
            Self::Withholding => "2.0.0",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
            Self::DebitNote => "debit_note",
            Self::ShipmentGuide => "shipment_guide",
            Self::Withholding => "withholding",
        };
        f.write_str(s)
    }
}

/// Target environment of the authority's web service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    #[serde(alias = "1")]
    Test,
    #[serde(alias = "2")]
    Production,
}

impl Environment {
    /// One-digit flag: `1` test, `2` production.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Test => "1",
            Self::Production => "2",
        }
    }

    /// Look up an environment by its flag.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Test),
            "2" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Emission type flag. Only normal emission is issued offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionType {
    #[default]
    #[serde(alias = "1")]
    Normal,
}

impl EmissionType {
    /// One-digit flag.
    pub fn code(&self) -> &'static str {
        "1"
    }

    /// Look up an emission type by its flag.
    pub fn from_code(code: &str) -> Option<Self> {
        (code == "1").then_some(Self::Normal)
    }
}

// ---------------------------------------------------------------------------
// Zero-padded fields
// ---------------------------------------------------------------------------

fn three_digits(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Establishment code: exactly three digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Establishment(String);

impl_validating_deserialize!(Establishment);

impl Establishment {
    /// Create an establishment code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Establishment`] unless the value is exactly three
    /// ASCII digits. No padding is applied: `"1"` is rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, CodeError> {
        let s = value.into();
        if !three_digits(&s) {
            return Err(CodeError::Establishment(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Establishment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Emission point code: exactly three digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmissionPoint(String);

impl_validating_deserialize!(EmissionPoint);

impl EmissionPoint {
    /// Create an emission point code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::EmissionPoint`] unless the value is exactly three
    /// ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, CodeError> {
        let s = value.into();
        if !three_digits(&s) {
            return Err(CodeError::EmissionPoint(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmissionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document sequential, 1 through 999 999 999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Sequential(u32);

impl Sequential {
    pub const MAX: u64 = 999_999_999;

    /// Create a sequential.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Sequential`] for zero or values wider than nine
    /// digits.
    pub fn new(value: u64) -> Result<Self, CodeError> {
        if value == 0 || value > Self::MAX {
            return Err(CodeError::Sequential(value));
        }
        Ok(Self(value as u32))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Nine-digit zero-padded form.
    pub fn padded(&self) -> String {
        format!("{:09}", self.0)
    }
}

impl TryFrom<u64> for Sequential {
    type Error = CodeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sequential> for u64 {
    fn from(s: Sequential) -> u64 {
        u64::from(s.0)
    }
}

/// Eight-digit numeric fill embedded in the access key.
///
/// The fill carries no meaning. The issuer picks it (any source of numbers
/// will do) and must keep it to regenerate the same key later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumericFill(u32);

impl NumericFill {
    pub const MAX: u32 = 99_999_999;

    /// Create a fill from an integer.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::NumericFill`] when the value exceeds eight digits.
    pub fn new(value: u32) -> Result<Self, CodeError> {
        if value > Self::MAX {
            return Err(CodeError::NumericFill(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Parse an exactly-eight-digit string.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeError::NumericFill(s.to_string()));
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| CodeError::NumericFill(s.to_string()))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Eight-digit zero-padded form.
    pub fn padded(&self) -> String {
        format!("{:08}", self.0)
    }
}

impl TryFrom<String> for NumericFill {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NumericFill> for String {
    fn from(f: NumericFill) -> String {
        f.padded()
    }
}

impl std::fmt::Display for NumericFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.padded())
    }
}

// ---------------------------------------------------------------------------
// Voucher numbers
// ---------------------------------------------------------------------------

/// Human-readable document number `EEE-PPP-SSSSSSSSS`.
pub fn voucher_number(
    establishment: &Establishment,
    point: &EmissionPoint,
    sequential: Sequential,
) -> String {
    format!("{}-{}-{}", establishment, point, sequential.padded())
}

/// Split a voucher number into its three parts.
///
/// # Errors
///
/// Returns [`CodeError::VoucherNumber`] unless the value is exactly
/// `EEE-PPP-SSSSSSSSS` with a non-zero sequential.
pub fn parse_voucher_number(
    value: &str,
) -> Result<(Establishment, EmissionPoint, Sequential), CodeError> {
    let bad = || CodeError::VoucherNumber(value.to_string());
    let mut parts = value.split('-');
    let (Some(e), Some(p), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };
    if s.len() != 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let establishment = Establishment::new(e).map_err(|_| bad())?;
    let point = EmissionPoint::new(p).map_err(|_| bad())?;
    let seq = s.parse::<u64>().map_err(|_| bad())?;
    let sequential = Sequential::new(seq).map_err(|_| bad())?;
    Ok((establishment, point, sequential))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_codes() {
        for t in DocumentType::all() {
            assert_eq!(DocumentType::from_code(t.code()).unwrap(), *t);
        }
        assert!(matches!(
            DocumentType::from_code("03"),
            Err(CodeError::DocumentType(_))
        ));
    }

    #[test]
    fn document_type_remap_assignment() {
        assert_eq!(DocumentType::Invoice.access_key_remap(), Mod11Remap::Standard);
        assert_eq!(DocumentType::ShipmentGuide.access_key_remap(), Mod11Remap::Standard);
        assert_eq!(DocumentType::Withholding.access_key_remap(), Mod11Remap::Extended);
        assert_eq!(DocumentType::CreditNote.access_key_remap(), Mod11Remap::Extended);
        assert_eq!(DocumentType::DebitNote.access_key_remap(), Mod11Remap::Extended);
    }

    #[test]
    fn document_type_serde_uses_code() {
        assert_eq!(serde_json::to_string(&DocumentType::ShipmentGuide).unwrap(), "\"06\"");
        let t: DocumentType = serde_json::from_str("\"07\"").unwrap();
        assert_eq!(t, DocumentType::Withholding);
    }

    #[test]
    fn environment_accepts_names_and_flags() {
        let e: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(e.code(), "2");
        let e: Environment = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(e, Environment::Test);
        assert_eq!(Environment::default(), Environment::Test);
        assert_eq!(Environment::from_code("3"), None);
    }

    #[test]
    fn emission_type_flag() {
        assert_eq!(EmissionType::default().code(), "1");
        assert_eq!(EmissionType::from_code("1"), Some(EmissionType::Normal));
        assert_eq!(EmissionType::from_code("2"), None);
    }

    #[test]
    fn three_digit_codes_are_exact() {
        assert!(Establishment::new("001").is_ok());
        assert!(Establishment::new("1").is_err());
        assert!(Establishment::new("0001").is_err());
        assert!(EmissionPoint::new("0a1").is_err());
        let bad: Result<EmissionPoint, _> = serde_json::from_str("\"12\"");
        assert!(bad.is_err());
    }

    #[test]
    fn sequential_bounds_and_padding() {
        assert!(Sequential::new(0).is_err());
        assert!(Sequential::new(1_000_000_000).is_err());
        assert_eq!(Sequential::new(42).unwrap().padded(), "000000042");
        assert_eq!(Sequential::new(999_999_999).unwrap().padded(), "999999999");
        let s: Sequential = serde_json::from_str("7").unwrap();
        assert_eq!(s.value(), 7);
        assert!(serde_json::from_str::<Sequential>("0").is_err());
    }

    #[test]
    fn numeric_fill_forms() {
        assert_eq!(NumericFill::new(7).unwrap().padded(), "00000007");
        assert!(NumericFill::new(100_000_000).is_err());
        assert_eq!(NumericFill::parse("12345678").unwrap().value(), 12_345_678);
        assert!(NumericFill::parse("1234567").is_err());
        assert!(NumericFill::parse("1234567x").is_err());
        let json = serde_json::to_string(&NumericFill::new(42).unwrap()).unwrap();
        assert_eq!(json, "\"00000042\"");
    }

    #[test]
    fn voucher_number_format_and_parse() {
        let e = Establishment::new("001").unwrap();
        let p = EmissionPoint::new("002").unwrap();
        let s = Sequential::new(123).unwrap();
        let v = voucher_number(&e, &p, s);
        assert_eq!(v, "001-002-000000123");
        let (e2, p2, s2) = parse_voucher_number(&v).unwrap();
        assert_eq!((e2, p2, s2), (e, p, s));
        assert!(parse_voucher_number("001-002-123").is_err());
        assert!(parse_voucher_number("001002000000123").is_err());
        assert!(parse_voucher_number("001-002-000000000").is_err());
        assert!(parse_voucher_number("001-002-000000001-9").is_err());
    }
}
