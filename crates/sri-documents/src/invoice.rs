//! # Invoice (`codDoc 01`)
//!
//! Sale of goods or services. Totals are declared by the caller and checked
//! against the lines: the grand total must equal the lines' taxable total
//! plus taxes plus tip, and the payments must add up to the grand total.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::money::{format_amount, round_cents};
use sri_core::temporal::body_date;

use crate::model::{self, AdditionalField, Counterparty, Header, LineItem, Payment, TaxLine};
use crate::rules::{self, Rule, RuleContext, Stage};
use crate::serialize::{self, Node};
use crate::violation::{ValidationResult, Violations};

/// An invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    pub header: Header,
    pub buyer: Counterparty,
    pub items: Vec<LineItem>,
    pub payments: Vec<Payment>,
    pub tip: Option<Decimal>,
    /// Grand total, taxes and tip included.
    pub total: Option<Decimal>,
    pub additional: Vec<AdditionalField>,
}

impl Invoice {
    /// Sum of the lines' totals before tax. `None` on overflow, as for
    /// every derived amount below.
    pub fn total_without_taxes(&self) -> Option<Decimal> {
        model::checked_sum(self.items.iter().map(|i| i.total_without_tax.as_ref()))
    }

    pub fn total_discount(&self) -> Option<Decimal> {
        model::checked_sum(self.items.iter().map(|i| i.discount.as_ref()))
    }

    pub fn tax_totals(&self) -> Option<Vec<TaxLine>> {
        model::group_taxes(&self.items)
    }

    /// Lines plus taxes plus tip.
    pub fn computed_total(&self) -> Option<Decimal> {
        let taxes =
            model::checked_sum(self.items.iter().flat_map(|i| &i.taxes).map(|t| t.value.as_ref()))?;
        self.total_without_taxes()?
            .checked_add(taxes)?
            .checked_add(self.tip.unwrap_or_default())
    }

    /// Sum of the payments.
    pub fn paid(&self) -> Option<Decimal> {
        model::checked_sum(self.payments.iter().map(|p| p.total.as_ref()))
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("invoice", RULES, self, ctx)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub(crate) const RULES: &[Rule<Invoice>] = &[
    Rule::new("header_present", Stage::Presence, header_present),
    Rule::new("body_present", Stage::Presence, body_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound),
    Rule::new("emission_date", Stage::Temporal, emission_date),
    Rule::new("lines_counted", Stage::Cardinality, lines_counted),
    Rule::new("line_amounts", Stage::BusinessRules, line_amounts),
    Rule::new("amounts_bounded", Stage::BusinessRules, amounts_bounded),
    Rule::when("totals_agree", Stage::BusinessRules, has_total, totals_agree),
    Rule::new("formats", Stage::Format, formats),
];

fn has_total(doc: &Invoice) -> bool {
    doc.total.is_some()
}

fn header_present(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    rules::check_header_presence(v, &doc.header);
}

fn body_present(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    rules::check_counterparty_presence(v, "buyer", &doc.buyer);
    rules::require(v, "total", doc.total);
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_presence(v, &format!("items[{i}]"), item);
    }
}

fn identifiers_sound(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    rules::check_issuer_identifier(v, &doc.header);
    rules::check_counterparty_identifier(v, "buyer", &doc.buyer);
}

fn emission_date(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    rules::check_emission_date(v, &doc.header);
}

fn lines_counted(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    if doc.items.is_empty() {
        v.range("ITEMS_REQUIRED", "items", "at least one line is required");
    }
    if doc.payments.is_empty() {
        v.range("PAYMENTS_REQUIRED", "payments", "at least one payment is required");
    }
}

fn line_amounts(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_amounts(v, &format!("items[{i}]"), item);
    }
    rules::check_payments(v, "payments", &doc.payments);
    rules::check_non_negative(v, "tip", doc.tip);
    rules::check_non_negative(v, "total", doc.total);
}

fn amounts_bounded(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    rules::check_overflow(v, "items", doc.computed_total());
    rules::check_overflow(v, "items", doc.total_discount());
    rules::check_overflow(v, "items", doc.tax_totals());
    rules::check_overflow(v, "payments", doc.paid());
}

fn totals_agree(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    let Some(total) = doc.total else {
        return;
    };
    let Some(computed) = doc.computed_total().map(round_cents) else {
        return;
    };
    if computed != round_cents(total) {
        v.business(
            "TOTAL_MISMATCH",
            "total",
            format!("total {total} differs from lines, taxes and tip ({computed})"),
        );
    }
    if doc.payments.is_empty() {
        return;
    }
    let Some(paid) = doc.paid() else {
        return;
    };
    if round_cents(paid) != round_cents(total) {
        v.business(
            "PAYMENTS_TOTAL_MISMATCH",
            "payments",
            format!("payments add up to {paid}, total is {total}"),
        );
    }
}

fn formats(doc: &Invoice, _: &RuleContext, v: &mut Violations) {
    for (i, item) in doc.items.iter().enumerate() {
        rules::check_item_cents(v, &format!("items[{i}]"), item);
    }
    for (i, payment) in doc.payments.iter().enumerate() {
        rules::check_cents(v, &format!("payments[{i}].total"), payment.total);
    }
    rules::check_cents(v, "tip", doc.tip);
    rules::check_cents(v, "total", doc.total);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl Invoice {
    pub(crate) fn render_body(&self, emission_date: NaiveDate, root: &mut Node) {
        let mut info = Node::new("infoFactura");
        info.push_leaf("fechaEmision", body_date(emission_date));
        serialize::push_issuer_info(&mut info, &self.header.issuer);
        info.push_leaf("tipoIdentificacionComprador", serialize::id_type_code(&self.buyer));
        info.push_leaf("razonSocialComprador", self.buyer.legal_name.trim());
        info.push_leaf("identificacionComprador", serialize::identification(&self.buyer));
        info.push_opt("direccionComprador", self.buyer.address.as_deref());
        info.push_leaf(
            "totalSinImpuestos",
            format_amount(self.total_without_taxes().unwrap_or_default()),
        );
        info.push_leaf("totalDescuento", format_amount(self.total_discount().unwrap_or_default()));
        info.push(serialize::tax_totals_node(&self.tax_totals().unwrap_or_default()));
        info.push_leaf("propina", format_amount(self.tip.unwrap_or_default()));
        info.push_leaf("importeTotal", format_amount(self.total.unwrap_or_default()));
        info.push_leaf("moneda", serialize::CURRENCY);
        info.push(serialize::payments_node(&self.payments));
        root.push(info);

        let mut items = Node::new("detalles");
        for item in &self.items {
            items.push(serialize::line_item_node(item, serialize::INVOICE_ITEM_CODES));
        }
        root.push(items);
    }
}
