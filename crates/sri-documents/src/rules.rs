//! # Rule Combinator
//!
//! Every document type supplies a static, stage-ordered table of
//! [`Rule`]s. [`evaluate`] runs the table against a document and a
//! [`RuleContext`], accumulating violations from every rule whose
//! prerequisite holds.
//!
//! ## Design
//!
//! A rule is a plain function pointer, so tables are `const` and carry no
//! allocation. A rule with a prerequisite (`Rule::when`) is skipped when
//! the prerequisite fails. That is the only short-circuit: line-item rules
//! do not run against an absent item list, but a missing field never hides
//! an unrelated violation.
//!
//! The helpers below are the presence, identifier and format checks that
//! the document types share. Each pushes violations with stable codes.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use sri_core::codes::parse_voucher_number;
use sri_core::money::fits_cents;
use sri_core::{
    check_identification, validate_entity, IdentificationType, Sequential, ValidationPolicy,
};

use crate::catalog;
use crate::model::{Counterparty, Header, LineItem, Payment, TaxLine};
use crate::violation::{ValidationResult, Violations};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Inputs a rule may consult besides the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    pub policy: ValidationPolicy,
    /// Reference date for "not too far in the future" windows.
    pub today: NaiveDate,
}

impl RuleContext {
    pub fn new(policy: ValidationPolicy, today: NaiveDate) -> Self {
        Self { policy, today }
    }

    /// Default policy, explicit reference date.
    pub fn with_today(today: NaiveDate) -> Self {
        Self::new(ValidationPolicy::default(), today)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Validation stage. Rule tables are sorted by stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Presence,
    Identifiers,
    Temporal,
    Cardinality,
    BusinessRules,
    Format,
}

/// Body of a rule.
pub type Check<T> = fn(&T, &RuleContext, &mut Violations);

/// One named check within a document type's table.
pub struct Rule<T> {
    pub name: &'static str,
    pub stage: Stage,
    requires: Option<fn(&T) -> bool>,
    check: Check<T>,
}

impl<T> Rule<T> {
    /// A rule that always runs.
    pub const fn new(name: &'static str, stage: Stage, check: Check<T>) -> Self {
        Self {
            name,
            stage,
            requires: None,
            check,
        }
    }

    /// A rule that runs only when `requires` holds.
    pub const fn when(
        name: &'static str,
        stage: Stage,
        requires: fn(&T) -> bool,
        check: Check<T>,
    ) -> Self {
        Self {
            name,
            stage,
            requires: Some(requires),
            check,
        }
    }

    /// Whether this rule's prerequisite holds for `doc`.
    pub fn applies(&self, doc: &T) -> bool {
        self.requires.map_or(true, |requires| requires(doc))
    }
}

impl<T> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("conditional", &self.requires.is_some())
            .finish()
    }
}

/// Whether a table is in stage order.
pub fn is_staged<T>(rules: &[Rule<T>]) -> bool {
    rules.windows(2).all(|w| w[0].stage <= w[1].stage)
}

/// Run `rules` against `doc`.
pub fn evaluate<T>(
    document: &'static str,
    rules: &[Rule<T>],
    doc: &T,
    ctx: &RuleContext,
) -> ValidationResult {
    debug_assert!(is_staged(rules), "{document} rules out of stage order");
    let mut violations = Violations::new();
    for rule in rules {
        if !rule.applies(doc) {
            tracing::trace!(document, rule = rule.name, "prerequisite absent, rule skipped");
            continue;
        }
        (rule.check)(doc, ctx, &mut violations);
    }
    tracing::debug!(document, violations = violations.len(), "document validated");
    violations.into_result()
}

// ---------------------------------------------------------------------------
// Presence helpers
// ---------------------------------------------------------------------------

/// Require non-blank text. Returns whether it was present.
pub(crate) fn require_text(v: &mut Violations, path: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        v.structural("MISSING_FIELD", path, format!("{path} is required"));
        false
    } else {
        true
    }
}

/// Require non-blank text of at least `min` characters.
pub(crate) fn require_min_len(v: &mut Violations, path: &str, value: &str, min: usize) {
    if require_text(v, path, value) && value.trim().chars().count() < min {
        v.structural(
            "TEXT_TOO_SHORT",
            path,
            format!("{path} must have at least {min} characters"),
        );
    }
}

/// Require an optional value.
pub(crate) fn require<T: Copy>(v: &mut Violations, path: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        v.structural("MISSING_FIELD", path, format!("{path} is required"));
    }
    value
}

/// Require a three-digit code.
pub(crate) fn require_three_digit(v: &mut Violations, path: &str, value: &str) {
    if !require_text(v, path, value) {
        return;
    }
    if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
        v.structural(
            "MALFORMED_CODE",
            path,
            format!("{path} must be exactly 3 digits, got {value:?}"),
        );
    }
}

/// Require a sequential in `1..=999999999`.
pub(crate) fn require_sequential(v: &mut Violations, path: &str, value: Option<u64>) {
    if let Some(seq) = require(v, path, value) {
        if Sequential::new(seq).is_err() {
            v.structural(
                "INVALID_SEQUENTIAL",
                path,
                format!("sequential must be between 1 and {}, got {seq}", Sequential::MAX),
            );
        }
    }
}

/// Mandatory header fields.
pub(crate) fn check_header_presence(v: &mut Violations, header: &Header) {
    require_text(v, "header.issuer.ruc", &header.issuer.ruc);
    require_text(v, "header.issuer.legal_name", &header.issuer.legal_name);
    require_text(v, "header.issuer.main_address", &header.issuer.main_address);
    require_three_digit(v, "header.establishment", &header.establishment);
    require_three_digit(v, "header.emission_point", &header.emission_point);
    require_sequential(v, "header.sequential", header.sequential);
    require(v, "header.emission_date", header.emission_date);
}

/// Name and identification of a counterparty, and a known type code.
pub(crate) fn check_counterparty_presence(v: &mut Violations, path: &str, party: &Counterparty) {
    require_text(v, &format!("{path}.legal_name"), &party.legal_name);
    match party.resolved_id_type() {
        Ok(IdentificationType::FinalConsumer) => {}
        Ok(_) => {
            require_text(v, &format!("{path}.identification"), &party.identification);
        }
        Err(code) => v.structural(
            "UNKNOWN_ID_TYPE",
            format!("{path}.id_type"),
            format!("unknown identification type {code:?}"),
        ),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Latest emission year an access key can carry: the key holds four year
/// digits.
pub(crate) const MAX_EMISSION_YEAR: i32 = 9999;

/// The emission date fits the access key's `DDMMYYYY` segment.
pub(crate) fn check_emission_date(v: &mut Violations, header: &Header) {
    let Some(date) = header.emission_date else {
        return;
    };
    if !(1..=MAX_EMISSION_YEAR).contains(&date.year()) {
        v.range(
            "EMISSION_DATE_OUT_OF_RANGE",
            "header.emission_date",
            format!("emission year must be between 1 and {MAX_EMISSION_YEAR}, got {}", date.year()),
        );
    }
}

/// `date` moved by `days`, clamped to the calendar's bounds.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

// ---------------------------------------------------------------------------
// Identifier helpers
// ---------------------------------------------------------------------------

/// The issuer RUC passes the entity check.
pub(crate) fn check_issuer_identifier(v: &mut Violations, header: &Header) {
    if header.issuer.ruc.trim().is_empty() {
        return;
    }
    if let Some(defect) = validate_entity(&header.issuer.ruc).reason {
        v.identifier("header.issuer.ruc", &defect);
    }
}

/// A counterparty identifier passes the check for its type. Absent or
/// unknown-typed identifiers were already reported at presence.
pub(crate) fn check_counterparty_identifier(v: &mut Violations, path: &str, party: &Counterparty) {
    let Ok(id_type) = party.resolved_id_type() else {
        return;
    };
    let id = party.identification.trim();
    if id.is_empty() && id_type != IdentificationType::FinalConsumer {
        return;
    }
    let id = if id.is_empty() { sri_core::FINAL_CONSUMER_ID } else { id };
    if let Err(defect) = check_identification(id_type, id) {
        v.identifier(format!("{path}.identification"), &defect);
    }
}

// ---------------------------------------------------------------------------
// Amounts, codes and references
// ---------------------------------------------------------------------------

/// Amount must not be negative.
pub(crate) fn check_non_negative(v: &mut Violations, path: &str, value: Option<Decimal>) {
    if let Some(amount) = value {
        if amount.is_sign_negative() && !amount.is_zero() {
            v.range("NEGATIVE_AMOUNT", path, format!("{path} must not be negative, got {amount}"));
        }
    }
}

/// Report a sum that left the decimal range. Returns the value when it fits.
pub(crate) fn check_overflow<T>(v: &mut Violations, path: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        v.range(
            "AMOUNT_OVERFLOW",
            path,
            format!("{path} adds up beyond the representable range"),
        );
    }
    value
}

/// Amount must be expressible in cents.
pub(crate) fn check_cents(v: &mut Violations, path: &str, value: Option<Decimal>) {
    if let Some(amount) = value {
        if !fits_cents(amount) {
            v.structural(
                "AMOUNT_PRECISION",
                path,
                format!("{path} has more than 2 decimal digits: {amount}"),
            );
        }
    }
}

/// `EEE-PPP-SSSSSSSSS`.
pub(crate) fn check_voucher_number(v: &mut Violations, path: &str, value: &str) {
    if !require_text(v, path, value) {
        return;
    }
    if parse_voucher_number(value).is_err() {
        v.structural(
            "VOUCHER_NUMBER_FORMAT",
            path,
            format!("{path} must be EEE-PPP-SSSSSSSSS, got {value:?}"),
        );
    }
}

/// Tax code membership, VAT rate consistency and presence of base and
/// value.
pub(crate) fn check_tax_lines(v: &mut Violations, path: &str, taxes: &[TaxLine]) {
    for (i, tax) in taxes.iter().enumerate() {
        let at = format!("{path}[{i}]");
        if require_text(v, &format!("{at}.code"), &tax.code) && !catalog::is_tax_code(&tax.code) {
            v.structural(
                "UNKNOWN_CODE",
                format!("{at}.code"),
                format!("unknown tax code {:?}", tax.code),
            );
        }
        let vat = tax.code == catalog::TAX_VAT;
        if vat && require_text(v, &format!("{at}.percentage_code"), &tax.percentage_code) {
            match catalog::vat_rate(&tax.percentage_code) {
                None => v.structural(
                    "UNKNOWN_CODE",
                    format!("{at}.percentage_code"),
                    format!("unknown VAT percentage code {:?}", tax.percentage_code),
                ),
                Some(rate) => {
                    if let (Some(expected), Some(declared)) = (rate.percent, tax.rate) {
                        if Decimal::from(expected) != declared {
                            v.business(
                                "RATE_MISMATCH",
                                format!("{at}.rate"),
                                format!(
                                    "percentage code {} carries {expected}%, declared {declared}",
                                    rate.code
                                ),
                            );
                        }
                    }
                }
            }
        }
        require(v, &format!("{at}.base"), tax.base);
        require(v, &format!("{at}.value"), tax.value);
        check_non_negative(v, &format!("{at}.base"), tax.base);
        check_non_negative(v, &format!("{at}.value"), tax.value);
    }
}

/// Payment-method membership and presence of each total.
pub(crate) fn check_payments(v: &mut Violations, path: &str, payments: &[Payment]) {
    for (i, payment) in payments.iter().enumerate() {
        let at = format!("{path}[{i}]");
        if require_text(v, &format!("{at}.method"), &payment.method)
            && catalog::payment_method(&payment.method).is_none()
        {
            v.structural(
                "UNKNOWN_CODE",
                format!("{at}.method"),
                format!("unknown payment method {:?}", payment.method),
            );
        }
        require(v, &format!("{at}.total"), payment.total);
        check_non_negative(v, &format!("{at}.total"), payment.total);
    }
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

/// Mandatory fields of a product line.
pub(crate) fn check_item_presence(v: &mut Violations, at: &str, item: &LineItem) {
    require_text(v, &format!("{at}.main_code"), &item.main_code);
    require_text(v, &format!("{at}.description"), &item.description);
    require(v, &format!("{at}.quantity"), item.quantity);
    require(v, &format!("{at}.unit_price"), item.unit_price);
    require(v, &format!("{at}.total_without_tax"), item.total_without_tax);
}

/// Signs, quantity and taxes of a product line.
pub(crate) fn check_item_amounts(v: &mut Violations, at: &str, item: &LineItem) {
    check_non_negative(v, &format!("{at}.unit_price"), item.unit_price);
    check_non_negative(v, &format!("{at}.discount"), item.discount);
    check_non_negative(v, &format!("{at}.total_without_tax"), item.total_without_tax);
    if let Some(quantity) = item.quantity {
        if quantity <= Decimal::ZERO {
            v.range(
                "QUANTITY_TOO_SMALL",
                format!("{at}.quantity"),
                format!("quantity must be positive, got {quantity}"),
            );
        }
    }
    check_tax_lines(v, &format!("{at}.taxes"), &item.taxes);
}

pub(crate) fn check_item_cents(v: &mut Violations, at: &str, item: &LineItem) {
    check_cents(v, &format!("{at}.discount"), item.discount);
    check_cents(v, &format!("{at}.total_without_tax"), item.total_without_tax);
    for (j, tax) in item.taxes.iter().enumerate() {
        check_cents(v, &format!("{at}.taxes[{j}].base"), tax.base);
        check_cents(v, &format!("{at}.taxes[{j}].value"), tax.value);
    }
}
