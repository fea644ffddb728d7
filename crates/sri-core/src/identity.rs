//! # National Identifiers
//!
//! Validation of the two national identifier classes and the
//! identification-type catalog used for counterparties.
//!
//! - **Cédula** (individual, 10 digits): province prefix, third digit below
//!   6, modulo-10 check digit in position 10.
//! - **RUC** (entity tax ID, 13 digits): a 10-digit root plus a 3-digit
//!   establishment suffix. The third digit selects the checksum profile:
//!
//! | third digit | kind | checked digits | engine | check position |
//! |---|---|---|---|---|
//! | 0–5 | natural person | 9 | mod10 `[2,1,2,1,2,1,2,1,2]` | 10 |
//! | 6 | public entity | 8 | mod11 `[3,2,7,6,5,4,3,2]` | 9 |
//! | 9 | private entity | 9 | mod11 `[4,3,2,7,6,5,4,3,2]` | 10 |
//!
//! The establishment suffix is checked before the check digit, so a RUC
//! ending in `000` is a structural failure whatever its checksum.
//!
//! The free functions ([`validate_individual`], [`validate_entity`]) are
//! strict about their input. The newtypes ([`Cedula`], [`Ruc`]) strip
//! surrounding whitespace and dashes first.

use serde::{Deserialize, Serialize};

use crate::checkdigit::{mod10, mod11, parse_digits, Direction, Mod11Remap};
use crate::error::IdentifierDefect;

/// Identification used for anonymous end-consumer sales.
pub const FINAL_CONSUMER_ID: &str = "9999999999999";

const INDIVIDUAL_WEIGHTS: [u8; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];
const PUBLIC_ENTITY_WEIGHTS: [u8; 8] = [3, 2, 7, 6, 5, 4, 3, 2];
const PRIVATE_ENTITY_WEIGHTS: [u8; 9] = [4, 3, 2, 7, 6, 5, 4, 3, 2];

const CEDULA_LEN: usize = 10;
const RUC_LEN: usize = 13;
const PROVINCES: std::ops::RangeInclusive<u8> = 1..=24;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_validating_deserialize;

// ---------------------------------------------------------------------------
// Identifier kinds and check results
// ---------------------------------------------------------------------------

/// Subclass of a 13-digit entity identifier, selected by its third digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Third digit 0–5: a person registered for tax purposes.
    NaturalPerson,
    /// Third digit 6.
    PublicEntity,
    /// Third digit 9.
    PrivateEntity,
}

impl EntityKind {
    /// Select the kind from a third digit. Digits 7 and 8 select nothing.
    pub fn from_third_digit(d: u8) -> Option<Self> {
        match d {
            0..=5 => Some(Self::NaturalPerson),
            6 => Some(Self::PublicEntity),
            9 => Some(Self::PrivateEntity),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NaturalPerson => "natural_person",
            Self::PublicEntity => "public_entity",
            Self::PrivateEntity => "private_entity",
        };
        f.write_str(s)
    }
}

/// Outcome of an identifier check: validity, the detected subtype (entity
/// identifiers only) and, when invalid, the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IdentifierDefect>,
}

impl IdentifierCheck {
    fn ok(kind: Option<EntityKind>) -> Self {
        Self {
            valid: true,
            kind,
            reason: None,
        }
    }

    fn fail(kind: Option<EntityKind>, reason: IdentifierDefect) -> Self {
        Self {
            valid: false,
            kind,
            reason: Some(reason),
        }
    }

    /// Collapse into a `Result`, discarding the detected kind on failure.
    pub fn into_result(self) -> Result<Option<EntityKind>, IdentifierDefect> {
        match self.reason {
            None => Ok(self.kind),
            Some(reason) => Err(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn digits_of(id: &str, expected: usize) -> Result<Vec<u8>, IdentifierDefect> {
    let actual = id.chars().count();
    if actual != expected {
        return Err(IdentifierDefect::WrongLength { expected, actual });
    }
    parse_digits(id).ok_or(IdentifierDefect::NonDigit)
}

fn check_province(digits: &[u8]) -> Result<(), IdentifierDefect> {
    let province = digits[0] * 10 + digits[1];
    if PROVINCES.contains(&province) {
        Ok(())
    } else {
        Err(IdentifierDefect::InvalidProvince(province))
    }
}

fn compare(computed: u8, found: u8) -> Result<(), IdentifierDefect> {
    if computed == found {
        Ok(())
    } else {
        Err(IdentifierDefect::ChecksumMismatch { computed, found })
    }
}

fn individual_checksum(digits: &[u8]) -> Result<(), IdentifierDefect> {
    let computed = mod10(&digits[..9], &INDIVIDUAL_WEIGHTS, Direction::LeftToRight);
    compare(computed, digits[9])
}

fn individual(id: &str) -> Result<(), IdentifierDefect> {
    let digits = digits_of(id, CEDULA_LEN)?;
    check_province(&digits)?;
    if digits[2] >= 6 {
        return Err(IdentifierDefect::InvalidThirdDigit(digits[2]));
    }
    individual_checksum(&digits)
}

fn entity(id: &str) -> (Option<EntityKind>, Result<(), IdentifierDefect>) {
    let digits = match digits_of(id, RUC_LEN) {
        Ok(d) => d,
        Err(e) => return (None, Err(e)),
    };
    if let Err(e) = check_province(&digits) {
        return (None, Err(e));
    }
    let Some(kind) = EntityKind::from_third_digit(digits[2]) else {
        return (None, Err(IdentifierDefect::InvalidThirdDigit(digits[2])));
    };
    let suffix = digits[10..13]
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(*d));
    if suffix == 0 {
        return (Some(kind), Err(IdentifierDefect::InvalidEstablishment));
    }
    let checksum = match kind {
        EntityKind::NaturalPerson => individual_checksum(&digits),
        EntityKind::PublicEntity => compare(
            mod11(
                &digits[..8],
                &PUBLIC_ENTITY_WEIGHTS,
                Direction::LeftToRight,
                Mod11Remap::Standard,
            ),
            digits[8],
        ),
        EntityKind::PrivateEntity => compare(
            mod11(
                &digits[..9],
                &PRIVATE_ENTITY_WEIGHTS,
                Direction::LeftToRight,
                Mod11Remap::Standard,
            ),
            digits[9],
        ),
    };
    (Some(kind), checksum)
}

/// Validate a 10-digit individual identifier (cédula).
pub fn validate_individual(id: &str) -> IdentifierCheck {
    match individual(id) {
        Ok(()) => IdentifierCheck::ok(None),
        Err(e) => IdentifierCheck::fail(None, e),
    }
}

/// Validate a 13-digit entity identifier (RUC) and classify its subtype.
///
/// The subtype is reported whenever the third digit selected one, including
/// on establishment or checksum failure.
pub fn validate_entity(id: &str) -> IdentifierCheck {
    match entity(id) {
        (kind, Ok(())) => IdentifierCheck::ok(kind),
        (kind, Err(e)) => IdentifierCheck::fail(kind, e),
    }
}

fn normalize(value: String) -> String {
    value
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

// ---------------------------------------------------------------------------
// Validated newtypes
// ---------------------------------------------------------------------------

/// A validated 10-digit individual identifier.
///
/// Accepts `"1710034065"` and `"171003406-5"`; stores digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
// Only `new` and the validating deserializer construct it: always exactly
// `CEDULA_LEN` ASCII digits.
pub struct Cedula(String);

impl_validating_deserialize!(Cedula);

impl Cedula {
    /// Create a cédula, validating shape, province, third digit and
    /// check digit.
    ///
    /// # Errors
    ///
    /// Returns the first [`IdentifierDefect`] encountered.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierDefect> {
        let s = normalize(value.into());
        individual(&s)?;
        Ok(Self(s))
    }

    /// Access the identifier digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit province code.
    pub fn province(&self) -> &str {
        debug_assert_eq!(self.0.len(), CEDULA_LEN);
        &self.0[..2]
    }
}

impl std::fmt::Display for Cedula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated 13-digit entity identifier (RUC).
///
/// Accepts `"1790016919001"` and `"1790016919-001"`; stores digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
// Only `new` and the validating deserializer construct it: always exactly
// `RUC_LEN` ASCII digits.
pub struct Ruc(String);

impl_validating_deserialize!(Ruc);

impl Ruc {
    /// Create a RUC, validating every structural rule and the check digit.
    ///
    /// # Errors
    ///
    /// Returns the first [`IdentifierDefect`] encountered.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierDefect> {
        let s = normalize(value.into());
        entity(&s).1?;
        Ok(Self(s))
    }

    /// Access the identifier digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entity subtype selected by the third digit.
    pub fn kind(&self) -> EntityKind {
        debug_assert_eq!(self.0.len(), RUC_LEN);
        let third = self.0.as_bytes()[2] - b'0';
        EntityKind::from_third_digit(third).unwrap_or(EntityKind::PrivateEntity)
    }

    /// The 10-digit root.
    pub fn root(&self) -> &str {
        debug_assert_eq!(self.0.len(), RUC_LEN);
        &self.0[..10]
    }

    /// The 3-digit establishment suffix.
    pub fn establishment_suffix(&self) -> &str {
        debug_assert_eq!(self.0.len(), RUC_LEN);
        &self.0[10..]
    }

    /// Human-readable form with the suffix split off: `1790016919-001`.
    pub fn formatted(&self) -> String {
        format!("{}-{}", self.root(), self.establishment_suffix())
    }
}

impl std::fmt::Display for Ruc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identification-type catalog
// ---------------------------------------------------------------------------

/// Counterparty identification type as coded on electronic documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentificationType {
    #[serde(rename = "04")]
    Ruc,
    #[serde(rename = "05")]
    Cedula,
    #[serde(rename = "06")]
    Passport,
    #[serde(rename = "07")]
    FinalConsumer,
    #[serde(rename = "08")]
    Foreign,
}

impl IdentificationType {
    /// All identification types in code order.
    pub fn all() -> &'static [IdentificationType] {
        &[
            Self::Ruc,
            Self::Cedula,
            Self::Passport,
            Self::FinalConsumer,
            Self::Foreign,
        ]
    }

    /// Two-digit wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ruc => "04",
            Self::Cedula => "05",
            Self::Passport => "06",
            Self::FinalConsumer => "07",
            Self::Foreign => "08",
        }
    }

    /// Look up a type by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.code() == code)
    }

    /// Infer the type from the identifier's shape: 13 digits is a RUC
    /// (the final-consumer sentinel included), 10 digits a cédula, empty
    /// the final consumer, anything else a passport.
    pub fn infer(value: &str) -> Self {
        let value = value.trim();
        if value == FINAL_CONSUMER_ID || value.is_empty() {
            return Self::FinalConsumer;
        }
        let all_digits = value.bytes().all(|b| b.is_ascii_digit());
        match value.len() {
            13 if all_digits => Self::Ruc,
            10 if all_digits => Self::Cedula,
            _ => Self::Passport,
        }
    }
}

impl std::fmt::Display for IdentificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Check an identifier against the rules of its declared type.
pub fn check_identification(
    id_type: IdentificationType,
    value: &str,
) -> Result<(), IdentifierDefect> {
    match id_type {
        IdentificationType::Ruc => entity(value).1,
        IdentificationType::Cedula => individual(value),
        IdentificationType::Passport => {
            let len = value.chars().count();
            let shape = value
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if (6..=20).contains(&len) && shape {
                Ok(())
            } else {
                Err(IdentifierDefect::InvalidPassport)
            }
        }
        IdentificationType::FinalConsumer => {
            if value == FINAL_CONSUMER_ID {
                Ok(())
            } else {
                Err(IdentifierDefect::NotFinalConsumer)
            }
        }
        IdentificationType::Foreign => {
            let len = value.trim().chars().count();
            if (1..=20).contains(&len) {
                Ok(())
            } else {
                Err(IdentifierDefect::InvalidForeignId)
            }
        }
    }
}
