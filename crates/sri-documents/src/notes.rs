//! # Credit and Debit Notes (`codDoc 04`, `05`)
//!
//! Both notes adjust a previously authorized document. They share the
//! reference checks through the [`Note`] trait:
//!
//! - the referenced type must accept the note kind (no notes on notes);
//! - its authorization is a 49-digit access key whose check digit verifies
//!   when the embedded type is one this crate issues, and whose embedded
//!   type matches the declared one;
//! - it was issued no more than `note_max_age_days` before the note and not
//!   after it;
//! - the note's amount does not exceed the original's. Debit notes follow
//!   `cap_debit_note_amount`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::money::{format_amount, format_rate};
use sri_core::temporal::{body_date, days_between, KEY_DATE_FORMAT};
use sri_core::{AccessKey, AccessKeyError, DocumentType, ACCESS_KEY_LEN};

use crate::catalog::{self, NoteKind, NoteMotive};
use crate::model::{self, AdditionalField, Counterparty, Header, LineItem, Payment, TaxLine};
use crate::rules::{self, Rule, RuleContext, Stage};
use crate::serialize::{self, Node};
use crate::violation::{ValidationResult, Violations};

/// The document a note modifies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifiedDocument {
    /// `01` invoice, `03` purchase settlement, `41` reimbursement voucher.
    pub document_code: String,
    /// `EEE-PPP-SSSSSSSSS`.
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    /// The original's 49-digit access key.
    pub authorization: Option<String>,
    /// The original's total.
    pub amount: Option<Decimal>,
}

/// Behaviour shared by credit and debit notes.
pub trait Note {
    const KIND: NoteKind;
    /// Field the amount cap reports against.
    const AMOUNT_PATH: &'static str;

    fn header(&self) -> &Header;
    fn buyer(&self) -> &Counterparty;
    fn modified(&self) -> &ModifiedDocument;
    fn motive_code(&self) -> &str;
    /// Amount the note adjusts the original by, taxes included.
    fn amount(&self) -> Option<Decimal>;

    fn motive(&self) -> Option<&'static NoteMotive> {
        catalog::note_motive(Self::KIND, self.motive_code())
    }

    /// Whether the amount cap applies under `ctx`.
    fn capped(ctx: &RuleContext) -> bool {
        match Self::KIND {
            NoteKind::Credit => true,
            NoteKind::Debit => ctx.policy.cap_debit_note_amount,
        }
    }
}

/// A credit note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditNote {
    pub header: Header,
    pub buyer: Counterparty,
    pub modified: ModifiedDocument,
    /// Credit-note motive code, `1` to `9`.
    pub motive: String,
    /// Printed reason; the motive's description when absent.
    pub reason: Option<String>,
    pub total_without_taxes: Option<Decimal>,
    /// Amount credited, taxes included.
    pub amount: Option<Decimal>,
    pub items: Vec<LineItem>,
    pub additional: Vec<AdditionalField>,
}

/// A debit note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebitNote {
    pub header: Header,
    pub buyer: Counterparty,
    pub modified: ModifiedDocument,
    /// Debit-note motive code, `1` to `9`.
    pub motive: String,
    pub reasons: Vec<DebitReason>,
    pub taxes: Vec<TaxLine>,
    pub payments: Vec<Payment>,
    pub additional: Vec<AdditionalField>,
}

/// A charge added by a debit note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebitReason {
    pub reason: String,
    pub value: Option<Decimal>,
}

impl Note for CreditNote {
    const KIND: NoteKind = NoteKind::Credit;
    const AMOUNT_PATH: &'static str = "amount";

    fn header(&self) -> &Header {
        &self.header
    }
    fn buyer(&self) -> &Counterparty {
        &self.buyer
    }
    fn modified(&self) -> &ModifiedDocument {
        &self.modified
    }
    fn motive_code(&self) -> &str {
        &self.motive
    }
    fn amount(&self) -> Option<Decimal> {
        self.amount
    }
}

impl Note for DebitNote {
    const KIND: NoteKind = NoteKind::Debit;
    const AMOUNT_PATH: &'static str = "reasons";

    fn header(&self) -> &Header {
        &self.header
    }
    fn buyer(&self) -> &Counterparty {
        &self.buyer
    }
    fn modified(&self) -> &ModifiedDocument {
        &self.modified
    }
    fn motive_code(&self) -> &str {
        &self.motive
    }
    fn amount(&self) -> Option<Decimal> {
        self.total_without_taxes()?.checked_add(self.tax_total()?)
    }
}

impl CreditNote {
    /// Line taxes grouped by tax and percentage code; `None` on overflow.
    pub fn tax_totals(&self) -> Option<Vec<TaxLine>> {
        model::group_taxes(&self.items)
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("credit_note", CREDIT_RULES, self, ctx)
    }
}

impl DebitNote {
    /// Sum of the reasons' values; `None` on overflow.
    pub fn total_without_taxes(&self) -> Option<Decimal> {
        model::checked_sum(self.reasons.iter().map(|r| r.value.as_ref()))
    }

    pub fn tax_total(&self) -> Option<Decimal> {
        model::checked_sum(self.taxes.iter().map(|t| t.value.as_ref()))
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("debit_note", DEBIT_RULES, self, ctx)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub(crate) const CREDIT_RULES: &[Rule<CreditNote>] = &[
    Rule::new("header_present", Stage::Presence, header_present::<CreditNote>),
    Rule::new("reference_present", Stage::Presence, reference_present::<CreditNote>),
    Rule::new("credit_present", Stage::Presence, credit_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound::<CreditNote>),
    Rule::new("emission_date", Stage::Temporal, emission_date::<CreditNote>),
    Rule::when("note_window", Stage::Temporal, has_dates::<CreditNote>, note_window::<CreditNote>),
    Rule::when("items_counted", Stage::Cardinality, has_known_motive::<CreditNote>, credit_items_counted),
    Rule::new("modifiable", Stage::BusinessRules, modifiable::<CreditNote>),
    Rule::new("amount_cap", Stage::BusinessRules, amount_cap::<CreditNote>),
    Rule::new("credit_taxes", Stage::BusinessRules, credit_taxes),
    Rule::new("reference_format", Stage::Format, reference_format::<CreditNote>),
    Rule::new("credit_format", Stage::Format, credit_format),
];

pub(crate) const DEBIT_RULES: &[Rule<DebitNote>] = &[
    Rule::new("header_present", Stage::Presence, header_present::<DebitNote>),
    Rule::new("reference_present", Stage::Presence, reference_present::<DebitNote>),
    Rule::new("debit_present", Stage::Presence, debit_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound::<DebitNote>),
    Rule::new("emission_date", Stage::Temporal, emission_date::<DebitNote>),
    Rule::when("note_window", Stage::Temporal, has_dates::<DebitNote>, note_window::<DebitNote>),
    Rule::new("reasons_counted", Stage::Cardinality, reasons_counted),
    Rule::new("modifiable", Stage::BusinessRules, modifiable::<DebitNote>),
    Rule::new("amount_cap", Stage::BusinessRules, amount_cap::<DebitNote>),
    Rule::new("debit_taxes", Stage::BusinessRules, debit_taxes),
    Rule::new("reference_format", Stage::Format, reference_format::<DebitNote>),
    Rule::new("debit_format", Stage::Format, debit_format),
];

fn has_dates<N: Note>(doc: &N) -> bool {
    doc.header().emission_date.is_some() && doc.modified().issue_date.is_some()
}

fn has_known_motive<N: Note>(doc: &N) -> bool {
    doc.motive().is_some()
}

fn header_present<N: Note>(doc: &N, _: &RuleContext, v: &mut Violations) {
    rules::check_header_presence(v, doc.header());
}

fn reference_present<N: Note>(doc: &N, ctx: &RuleContext, v: &mut Violations) {
    rules::check_counterparty_presence(v, "buyer", doc.buyer());
    let modified = doc.modified();
    rules::require_text(v, "modified.document_code", &modified.document_code);
    rules::require(v, "modified.issue_date", modified.issue_date);
    rules::require_text(
        v,
        "modified.authorization",
        modified.authorization.as_deref().unwrap_or_default(),
    );
    if N::capped(ctx) {
        rules::require(v, "modified.amount", modified.amount);
    }
    if rules::require_text(v, "motive", doc.motive_code()) && doc.motive().is_none() {
        v.structural(
            "UNKNOWN_CODE",
            "motive",
            format!("unknown {} motive {:?}", N::KIND, doc.motive_code()),
        );
    }
}

fn identifiers_sound<N: Note>(doc: &N, _: &RuleContext, v: &mut Violations) {
    rules::check_issuer_identifier(v, doc.header());
    rules::check_counterparty_identifier(v, "buyer", doc.buyer());
    if let Some(authorization) = doc.modified().authorization.as_deref() {
        if !authorization.trim().is_empty() {
            check_authorization(v, "modified.authorization", authorization.trim());
        }
    }
}

/// Verify an original's authorization. Keys of types this crate issues are
/// fully parsed; others are checked for width, digits and embedded date.
fn check_authorization(v: &mut Violations, path: &str, value: &str) {
    let len = value.chars().count();
    if len != ACCESS_KEY_LEN {
        v.access_key(path, &AccessKeyError::WrongLength(len));
        return;
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        v.access_key(path, &AccessKeyError::NonDigit);
        return;
    }
    if DocumentType::from_code(&value[8..10]).is_ok() {
        if let Err(e) = AccessKey::parse(value) {
            v.access_key(path, &e);
        }
    } else if NaiveDate::parse_from_str(&value[..8], KEY_DATE_FORMAT).is_err() {
        v.access_key(path, &AccessKeyError::InvalidDate(value[..8].to_string()));
    }
}

fn emission_date<N: Note>(doc: &N, _: &RuleContext, v: &mut Violations) {
    rules::check_emission_date(v, doc.header());
}

fn note_window<N: Note>(doc: &N, ctx: &RuleContext, v: &mut Violations) {
    let (Some(emission), Some(original)) = (doc.header().emission_date, doc.modified().issue_date)
    else {
        return;
    };
    if original > emission {
        v.range(
            "NOTE_BEFORE_ORIGINAL",
            "header.emission_date",
            format!("{} dated {emission} precedes the original ({original})", N::KIND),
        );
        return;
    }
    let age = days_between(original, emission);
    if age > ctx.policy.note_max_age_days {
        v.range(
            "NOTE_WINDOW_EXCEEDED",
            "modified.issue_date",
            format!(
                "original is {age} days old, limit is {}",
                ctx.policy.note_max_age_days
            ),
        );
    }
}

fn modifiable<N: Note>(doc: &N, _: &RuleContext, v: &mut Violations) {
    let modified = doc.modified();
    if modified.document_code.trim().is_empty() {
        return;
    }
    let allowed = catalog::modifiable_document(&modified.document_code)
        .is_some_and(|d| d.allows(N::KIND));
    if !allowed {
        v.business(
            "DOCUMENT_NOT_MODIFIABLE",
            "modified.document_code",
            format!(
                "document type {} cannot be modified by a {}",
                modified.document_code,
                N::KIND
            ),
        );
    }
    if let Some(authorization) = modified.authorization.as_deref().map(str::trim) {
        if authorization.len() == ACCESS_KEY_LEN
            && authorization.is_ascii()
            && &authorization[8..10] != modified.document_code.as_str()
        {
            v.business(
                "AUTHORIZATION_TYPE_MISMATCH",
                "modified.authorization",
                format!(
                    "authorization is for document type {}, reference declares {}",
                    &authorization[8..10],
                    modified.document_code
                ),
            );
        }
    }
}

fn amount_cap<N: Note>(doc: &N, ctx: &RuleContext, v: &mut Violations) {
    if !N::capped(ctx) {
        return;
    }
    if let (Some(amount), Some(original)) = (doc.amount(), doc.modified().amount) {
        if amount > original {
            v.business("AMOUNT_EXCEEDS_ORIGINAL", N::AMOUNT_PATH, "amount exceeds original");
        }
    }
}

fn reference_format<N: Note>(doc: &N, _: &RuleContext, v: &mut Violations) {
    let modified = doc.modified();
    rules::check_voucher_number(v, "modified.number", &modified.number);
    rules::check_cents(v, "modified.amount", modified.amount);
}

// -- Credit-note specifics ----------------------------------------------------

fn credit_present(doc: &CreditNote, _: &RuleContext, v: &mut Violations) {
    rules::require(v, "total_without_taxes", doc.total_without_taxes);
    rules::require(v, "amount", doc.amount);
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_presence(v, &format!("items[{i}]"), item);
    }
}

fn credit_items_counted(doc: &CreditNote, _: &RuleContext, v: &mut Violations) {
    let requires_detail = doc.motive().map_or(true, |m| m.requires_detail);
    if requires_detail && doc.items.is_empty() {
        v.range(
            "ITEMS_REQUIRED",
            "items",
            format!("motive {} requires at least one item", doc.motive),
        );
    }
}

fn credit_taxes(doc: &CreditNote, _: &RuleContext, v: &mut Violations) {
    rules::check_overflow(v, "items", doc.tax_totals());
    rules::check_non_negative(v, "amount", doc.amount);
    rules::check_non_negative(v, "total_without_taxes", doc.total_without_taxes);
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_amounts(v, &format!("items[{i}]"), item);
    }
}

fn credit_format(doc: &CreditNote, _: &RuleContext, v: &mut Violations) {
    rules::check_cents(v, "total_without_taxes", doc.total_without_taxes);
    rules::check_cents(v, "amount", doc.amount);
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_cents(v, &format!("items[{i}]"), item);
    }
}

// -- Debit-note specifics -----------------------------------------------------

fn debit_present(doc: &DebitNote, _: &RuleContext, v: &mut Violations) {
    for (i, reason) in doc.reasons.iter().enumerate() {
        rules::require_text(v, &format!("reasons[{i}].reason"), &reason.reason);
        rules::require(v, &format!("reasons[{i}].value"), reason.value);
    }
}

fn reasons_counted(doc: &DebitNote, _: &RuleContext, v: &mut Violations) {
    if doc.reasons.is_empty() {
        v.range("REASONS_REQUIRED", "reasons", "at least one reason is required");
    }
}

fn debit_taxes(doc: &DebitNote, _: &RuleContext, v: &mut Violations) {
    for (i, reason) in doc.reasons.iter().enumerate() {
        if let Some(value) = reason.value {
            if value <= Decimal::ZERO {
                v.range(
                    "BASE_NOT_POSITIVE",
                    format!("reasons[{i}].value"),
                    format!("reason value must be positive, got {value}"),
                );
            }
        }
    }
    rules::check_tax_lines(v, "taxes", &doc.taxes);
    rules::check_payments(v, "payments", &doc.payments);
    let base = rules::check_overflow(v, "reasons", doc.total_without_taxes());
    let taxes = rules::check_overflow(v, "taxes", doc.tax_total());
    if let (Some(base), Some(taxes)) = (base, taxes) {
        rules::check_overflow(v, "taxes", base.checked_add(taxes));
    }
}

fn debit_format(doc: &DebitNote, _: &RuleContext, v: &mut Violations) {
    for (i, reason) in doc.reasons.iter().enumerate() {
        rules::check_cents(v, &format!("reasons[{i}].value"), reason.value);
    }
    for (i, tax) in doc.taxes.iter().enumerate() {
        rules::check_cents(v, &format!("taxes[{i}].base"), tax.base);
        rules::check_cents(v, &format!("taxes[{i}].value"), tax.value);
    }
    for (i, payment) in doc.payments.iter().enumerate() {
        rules::check_cents(v, &format!("payments[{i}].total"), payment.total);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Fields both notes print between the emission date and the totals.
fn note_info<N: Note>(name: &'static str, doc: &N, emission_date: NaiveDate) -> Node {
    let issuer = &doc.header().issuer;
    let buyer = doc.buyer();
    let modified = doc.modified();
    let mut info = Node::new(name);
    info.push_leaf("fechaEmision", body_date(emission_date));
    info.push_leaf("dirEstablecimiento", issuer.branch_address());
    info.push_leaf("tipoIdentificacionComprador", serialize::id_type_code(buyer));
    info.push_leaf("razonSocialComprador", buyer.legal_name.trim());
    info.push_leaf("identificacionComprador", serialize::identification(buyer));
    info.push_opt("contribuyenteEspecial", issuer.special_taxpayer.as_deref());
    info.push_leaf("obligadoContabilidad", serialize::yes_no(issuer.keeps_accounts));
    info.push_leaf("codDocModificado", &modified.document_code);
    info.push_leaf("numDocModificado", &modified.number);
    info.push_leaf(
        "fechaEmisionDocSustento",
        modified.issue_date.map(body_date).unwrap_or_default(),
    );
    info
}

impl CreditNote {
    pub(crate) fn render_body(&self, emission_date: NaiveDate, root: &mut Node) {
        let mut info = note_info("infoNotaCredito", self, emission_date);
        info.push_leaf(
            "totalSinImpuestos",
            format_amount(self.total_without_taxes.unwrap_or_default()),
        );
        info.push_leaf("valorModificacion", format_amount(self.amount.unwrap_or_default()));
        info.push_leaf("moneda", serialize::CURRENCY);
        info.push(serialize::tax_totals_node(&self.tax_totals().unwrap_or_default()));
        let reason = match self.reason.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => reason,
            _ => self.motive().map_or("", |m| m.description),
        };
        info.push_leaf("motivo", reason);
        root.push(info);

        let mut items = Node::new("detalles");
        for item in &self.items {
            items.push(serialize::line_item_node(item, serialize::NOTE_ITEM_CODES));
        }
        root.push(items);
    }
}

impl DebitNote {
    pub(crate) fn render_body(&self, emission_date: NaiveDate, root: &mut Node) {
        let mut info = note_info("infoNotaDebito", self, emission_date);
        info.push_leaf(
            "totalSinImpuestos",
            format_amount(self.total_without_taxes().unwrap_or_default()),
        );
        let mut taxes = Node::new("impuestos");
        for tax in &self.taxes {
            taxes.push(
                Node::new("impuesto")
                    .child(Node::leaf("codigo", &tax.code))
                    .child(Node::leaf("codigoPorcentaje", &tax.percentage_code))
                    .child(Node::leaf("tarifa", format_rate(tax.rate.unwrap_or_default())))
                    .child(Node::leaf("baseImponible", format_amount(tax.base.unwrap_or_default())))
                    .child(Node::leaf("valor", format_amount(tax.value.unwrap_or_default()))),
            );
        }
        info.push(taxes);
        info.push_leaf("valorTotal", format_amount(self.amount().unwrap_or_default()));
        if !self.payments.is_empty() {
            info.push(serialize::payments_node(&self.payments));
        }
        root.push(info);

        let mut reasons = Node::new("motivos");
        for reason in &self.reasons {
            reasons.push(
                Node::new("motivo")
                    .child(Node::leaf("razon", reason.reason.trim()))
                    .child(Node::leaf("valor", format_amount(reason.value.unwrap_or_default()))),
            );
        }
        root.push(reasons);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{context, credit_note, debit_note};
    use crate::violation::ViolationKind;
    use rust_decimal_macros::dec;

    #[test]
    fn rules_are_staged() {
        assert!(rules::is_staged(CREDIT_RULES));
        assert!(rules::is_staged(DEBIT_RULES));
    }

    #[test]
    fn fixtures_are_valid() {
        let result = credit_note().validate(&context());
        assert!(result.is_valid(), "{:?}", result.violations());
        let result = debit_note().validate(&context());
        assert!(result.is_valid(), "{:?}", result.violations());
    }

    #[test]
    fn credit_above_original_is_business_violation() {
        let mut doc = credit_note();
        doc.modified.amount = Some(dec!(100));
        doc.amount = Some(dec!(150));
        let result = doc.validate(&context());
        let violations = result.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "AMOUNT_EXCEEDS_ORIGINAL");
        assert_eq!(violations[0].kind, ViolationKind::BusinessRule);
        assert_eq!(violations[0].message, "amount exceeds original");
        assert_eq!(violations[0].path, "amount");
    }

    #[test]
    fn credit_equal_to_original_is_allowed() {
        let mut doc = credit_note();
        doc.amount = doc.modified.amount;
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn debit_cap_follows_policy() {
        let mut doc = debit_note();
        doc.reasons[0].value = Some(dec!(95));
        doc.taxes[0].base = Some(dec!(95));
        doc.taxes[0].value = Some(dec!(14.25));
        let result = doc.validate(&context());
        assert!(result.has_code("AMOUNT_EXCEEDS_ORIGINAL"));
        assert_eq!(result.violations()[0].path, "reasons");

        let mut ctx = context();
        ctx.policy.cap_debit_note_amount = false;
        doc.modified.amount = None;
        assert!(doc.validate(&ctx).is_valid());
    }

    #[test]
    fn note_age_window() {
        let mut doc = credit_note();
        doc.modified.issue_date = NaiveDate::from_ymd_opt(2025, 7, 18);
        assert!(doc.validate(&context()).has_code("NOTE_WINDOW_EXCEEDED"));

        doc.modified.issue_date = NaiveDate::from_ymd_opt(2025, 7, 19);
        assert!(!doc.validate(&context()).has_code("NOTE_WINDOW_EXCEEDED"));

        doc.modified.issue_date = NaiveDate::from_ymd_opt(2026, 1, 16);
        let result = doc.validate(&context());
        assert!(result.has_code("NOTE_BEFORE_ORIGINAL"));
        assert!(!result.has_code("NOTE_WINDOW_EXCEEDED"));
    }

    #[test]
    fn notes_on_notes_are_rejected() {
        let mut doc = credit_note();
        doc.modified.document_code = "04".into();
        let result = doc.validate(&context());
        assert!(result.has_code("DOCUMENT_NOT_MODIFIABLE"));
        assert!(result.has_code("AUTHORIZATION_TYPE_MISMATCH"));
    }

    #[test]
    fn authorization_checksum_is_verified() {
        let mut doc = credit_note();
        doc.modified.authorization =
            Some("0501202601179001691900110010010000001231234567814".into());
        let result = doc.validate(&context());
        let v = &result.violations()[0];
        assert_eq!(v.code, "ACCESS_KEY_CHECKSUM");
        assert_eq!(v.kind, ViolationKind::Checksum);
        assert_eq!(v.path, "modified.authorization");
    }

    #[test]
    fn authorization_shape_is_verified() {
        let mut doc = credit_note();
        doc.modified.authorization = Some("12345".into());
        let result = doc.validate(&context());
        assert!(result.has_code("ACCESS_KEY_MALFORMED"));
        assert!(!result.has_code("AUTHORIZATION_TYPE_MISMATCH"));
    }

    #[test]
    fn settlement_authorization_is_structural_only() {
        let mut doc = credit_note();
        doc.modified.document_code = "03".into();
        doc.modified.authorization =
            Some("0501202603179001691900110010010000001231234567810".into());
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn annulment_needs_no_items() {
        let mut doc = credit_note();
        doc.items.clear();
        assert!(doc.validate(&context()).has_code("ITEMS_REQUIRED"));
        doc.motive = "3".into();
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn unknown_motive() {
        let mut doc = debit_note();
        doc.motive = "12".into();
        let result = doc.validate(&context());
        assert_eq!(result.violations()[0].code, "UNKNOWN_CODE");
        assert_eq!(result.violations()[0].path, "motive");
    }

    #[test]
    fn debit_amount_is_reasons_plus_taxes() {
        let doc = debit_note();
        assert_eq!(doc.total_without_taxes(), Some(dec!(10)));
        assert_eq!(doc.amount(), Some(dec!(11.50)));
    }

    #[test]
    fn debit_without_reasons() {
        let mut doc = debit_note();
        doc.reasons.clear();
        assert!(doc.validate(&context()).has_code("REASONS_REQUIRED"));
    }

    #[test]
    fn credit_tax_totals_are_grouped() {
        let mut doc = credit_note();
        let item = doc.items[0].clone();
        doc.items.push(item);
        let totals = doc.tax_totals().unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].base, Some(dec!(100)));
        assert_eq!(totals[0].value, Some(dec!(15.00)));
    }

    #[test]
    fn debit_reasons_beyond_decimal_range() {
        let mut doc = debit_note();
        doc.reasons = vec![
            DebitReason {
                reason: "Intereses".into(),
                value: Some(Decimal::MAX),
            },
            DebitReason {
                reason: "Gastos de cobranza".into(),
                value: Some(Decimal::MAX),
            },
        ];
        assert_eq!(doc.amount(), None);
        let result = doc.validate(&context());
        let v = result
            .violations()
            .iter()
            .find(|v| v.code == "AMOUNT_OVERFLOW")
            .unwrap();
        assert_eq!(v.kind, ViolationKind::Range);
        assert_eq!(v.path, "reasons");
        assert!(!result.has_code("AMOUNT_EXCEEDS_ORIGINAL"));
    }

    #[test]
    fn debit_reasons_plus_taxes_overflow() {
        let mut doc = debit_note();
        doc.reasons[0].value = Some(Decimal::MAX);
        doc.taxes[0].value = Some(Decimal::MAX);
        let result = doc.validate(&context());
        let paths: Vec<_> = result
            .violations()
            .iter()
            .filter(|v| v.code == "AMOUNT_OVERFLOW")
            .map(|v| v.path.as_str())
            .collect();
        assert_eq!(paths, ["taxes"]);
    }

    #[test]
    fn credit_line_taxes_overflow() {
        let mut doc = credit_note();
        let mut item = doc.items[0].clone();
        item.taxes[0].value = Some(Decimal::MAX);
        doc.items = vec![item.clone(), item];
        assert!(doc.tax_totals().is_none());
        assert!(doc.validate(&context()).has_code("AMOUNT_OVERFLOW"));
    }

    #[test]
    fn note_emission_year_must_fit_the_key() {
        let mut doc = credit_note();
        doc.header.emission_date = NaiveDate::from_ymd_opt(10_000, 1, 15);
        assert!(doc.validate(&context()).has_code("EMISSION_DATE_OUT_OF_RANGE"));
    }
}
