//! # Withholding Certificate (`codDoc 07`)
//!
//! Certifies tax retained from payments to a subject, itemised per support
//! document. The fiscal period is the month of the certificate's emission
//! date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::money::{format_amount, format_rate, round_cents};
use sri_core::temporal::body_date;
use sri_core::FiscalPeriod;

use crate::catalog::{self, WithheldTax};
use crate::model::{self, AdditionalField, Counterparty, Header, Payment, TaxLine};
use crate::rules::{self, Rule, RuleContext, Stage};
use crate::serialize::{self, Node};
use crate::violation::{ValidationResult, Violations};

/// A withholding certificate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Withholding {
    pub header: Header,
    /// The taxpayer whose payment was withheld from.
    pub subject: Counterparty,
    pub related_party: bool,
    pub supports: Vec<SupportDocument>,
    pub additional: Vec<AdditionalField>,
}

/// The document a withholding is applied against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportDocument {
    /// Tax-support code (`codSustento`).
    pub support_code: String,
    /// Type of the support document, e.g. `01` for an invoice.
    pub document_code: String,
    /// `EEE-PPP-SSSSSSSSS`.
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    pub registration_date: Option<NaiveDate>,
    pub authorization: Option<String>,
    /// `01` local, `02` abroad. Local when absent.
    pub payment_location: Option<String>,
    pub total_without_taxes: Option<Decimal>,
    pub total: Option<Decimal>,
    pub taxes: Vec<TaxLine>,
    pub withholdings: Vec<WithholdingLine>,
    pub payments: Vec<Payment>,
}

/// One retained tax.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithholdingLine {
    /// `1` income, `2` VAT, `6` ISD.
    pub tax: String,
    pub code: String,
    pub base: Option<Decimal>,
    /// Percentage, 0 to 100.
    pub rate: Option<Decimal>,
    pub withheld: Option<Decimal>,
}

impl WithholdingLine {
    /// `base × rate / 100`, rounded to cents. `None` when an operand is
    /// absent or the product overflows.
    pub fn expected_withheld(&self) -> Option<Decimal> {
        let product = self.base?.checked_mul(self.rate?)?;
        Some(round_cents(product / Decimal::ONE_HUNDRED))
    }
}

impl Withholding {
    pub fn fiscal_period(&self) -> Option<FiscalPeriod> {
        self.header.emission_date.map(FiscalPeriod::of)
    }

    /// Sum of every withheld amount; `None` on overflow.
    pub fn total_withheld(&self) -> Option<Decimal> {
        model::checked_sum(
            self.supports
                .iter()
                .flat_map(|s| &s.withholdings)
                .map(|w| w.withheld.as_ref()),
        )
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("withholding", RULES, self, ctx)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub(crate) const RULES: &[Rule<Withholding>] = &[
    Rule::new("header_present", Stage::Presence, header_present),
    Rule::new("subject_present", Stage::Presence, subject_present),
    Rule::new("supports_present", Stage::Presence, supports_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound),
    Rule::new("emission_date", Stage::Temporal, emission_date),
    Rule::when("support_dates", Stage::Temporal, has_emission_date, support_dates),
    Rule::new("supports_counted", Stage::Cardinality, supports_counted),
    Rule::new("withholding_codes", Stage::BusinessRules, withholding_codes),
    Rule::new("withholding_amounts", Stage::BusinessRules, withholding_amounts),
    Rule::new("support_taxes", Stage::BusinessRules, support_taxes),
    Rule::new("formats", Stage::Format, formats),
];

fn has_emission_date(doc: &Withholding) -> bool {
    doc.header.emission_date.is_some()
}

fn header_present(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    rules::check_header_presence(v, &doc.header);
}

fn subject_present(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    rules::check_counterparty_presence(v, "subject", &doc.subject);
}

fn supports_present(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    for (i, support) in doc.supports.iter().enumerate() {
        let at = format!("supports[{i}]");
        rules::require_text(v, &format!("{at}.support_code"), &support.support_code);
        rules::require_text(v, &format!("{at}.document_code"), &support.document_code);
        rules::require(v, &format!("{at}.issue_date"), support.issue_date);
        rules::require(v, &format!("{at}.total_without_taxes"), support.total_without_taxes);
        rules::require(v, &format!("{at}.total"), support.total);
        for (j, line) in support.withholdings.iter().enumerate() {
            let at = format!("{at}.withholdings[{j}]");
            rules::require_text(v, &format!("{at}.tax"), &line.tax);
            rules::require_text(v, &format!("{at}.code"), &line.code);
            rules::require(v, &format!("{at}.base"), line.base);
            rules::require(v, &format!("{at}.rate"), line.rate);
            rules::require(v, &format!("{at}.withheld"), line.withheld);
        }
    }
}

fn identifiers_sound(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    rules::check_issuer_identifier(v, &doc.header);
    rules::check_counterparty_identifier(v, "subject", &doc.subject);
}

fn emission_date(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    rules::check_emission_date(v, &doc.header);
}

fn support_dates(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    let Some(emission) = doc.header.emission_date else {
        return;
    };
    for (i, support) in doc.supports.iter().enumerate() {
        if let Some(issued) = support.issue_date {
            if issued > emission {
                v.range(
                    "SUPPORT_DATE_AFTER_EMISSION",
                    format!("supports[{i}].issue_date"),
                    format!("support document dated {issued} is after the certificate ({emission})"),
                );
            }
        }
    }
}

fn supports_counted(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    if doc.supports.is_empty() {
        v.range("SUPPORTS_REQUIRED", "supports", "at least one support document is required");
    }
    for (i, support) in doc.supports.iter().enumerate() {
        if support.withholdings.is_empty() {
            v.range(
                "WITHHOLDINGS_REQUIRED",
                format!("supports[{i}].withholdings"),
                "each support document needs at least one withholding line",
            );
        }
    }
}

fn withholding_codes(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    for (i, support) in doc.supports.iter().enumerate() {
        for (j, line) in support.withholdings.iter().enumerate() {
            let at = format!("supports[{i}].withholdings[{j}]");
            if line.tax.is_empty() || line.code.is_empty() {
                continue;
            }
            let Some(tax) = WithheldTax::from_code(&line.tax) else {
                v.structural(
                    "UNKNOWN_CODE",
                    format!("{at}.tax"),
                    format!("unknown withheld tax {:?}", line.tax),
                );
                continue;
            };
            if catalog::withholding_code(tax, &line.code).is_some() {
                continue;
            }
            match catalog::tax_of_withholding_code(&line.code) {
                Some(actual) => v.business(
                    "WITHHOLDING_CODE_TAX_MISMATCH",
                    format!("{at}.code"),
                    format!(
                        "code {} belongs to tax {}, line declares {}",
                        line.code,
                        actual.code(),
                        tax.code()
                    ),
                ),
                None => v.structural(
                    "UNKNOWN_CODE",
                    format!("{at}.code"),
                    format!("unknown withholding code {:?}", line.code),
                ),
            }
        }
    }
}

fn withholding_amounts(doc: &Withholding, ctx: &RuleContext, v: &mut Violations) {
    for (i, support) in doc.supports.iter().enumerate() {
        for (j, line) in support.withholdings.iter().enumerate() {
            let at = format!("supports[{i}].withholdings[{j}]");
            if let Some(base) = line.base {
                if base <= Decimal::ZERO {
                    v.range(
                        "BASE_NOT_POSITIVE",
                        format!("{at}.base"),
                        format!("taxable base must be positive, got {base}"),
                    );
                }
            }
            if let Some(rate) = line.rate {
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                    v.range(
                        "RATE_OUT_OF_RANGE",
                        format!("{at}.rate"),
                        format!("rate must be between 0 and 100, got {rate}"),
                    );
                }
            }
            rules::check_non_negative(v, &format!("{at}.withheld"), line.withheld);
            if !ctx.policy.recompute_withholding {
                continue;
            }
            let (Some(withheld), true) = (line.withheld, line.base.is_some() && line.rate.is_some())
            else {
                continue;
            };
            let Some(expected) = rules::check_overflow(v, &format!("{at}.base"), line.expected_withheld())
            else {
                continue;
            };
            let Some(difference) =
                rules::check_overflow(v, &format!("{at}.withheld"), expected.checked_sub(withheld))
            else {
                continue;
            };
            if difference.abs() > ctx.policy.withholding_tolerance {
                v.business(
                    "WITHHELD_AMOUNT_MISMATCH",
                    format!("{at}.withheld"),
                    format!("withheld {withheld} differs from base × rate = {expected}"),
                );
            }
        }
    }
    rules::check_overflow(v, "supports", doc.total_withheld());
}

fn support_taxes(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    for (i, support) in doc.supports.iter().enumerate() {
        let at = format!("supports[{i}]");
        rules::check_tax_lines(v, &format!("{at}.taxes"), &support.taxes);
        rules::check_payments(v, &format!("{at}.payments"), &support.payments);
        rules::check_non_negative(v, &format!("{at}.total"), support.total);
    }
}

fn formats(doc: &Withholding, _: &RuleContext, v: &mut Violations) {
    for (i, support) in doc.supports.iter().enumerate() {
        let at = format!("supports[{i}]");
        rules::check_voucher_number(v, &format!("{at}.number"), &support.number);
        rules::check_cents(v, &format!("{at}.total_without_taxes"), support.total_without_taxes);
        rules::check_cents(v, &format!("{at}.total"), support.total);
        for (j, tax) in support.taxes.iter().enumerate() {
            rules::check_cents(v, &format!("{at}.taxes[{j}].base"), tax.base);
            rules::check_cents(v, &format!("{at}.taxes[{j}].value"), tax.value);
        }
        for (j, line) in support.withholdings.iter().enumerate() {
            rules::check_cents(v, &format!("{at}.withholdings[{j}].base"), line.base);
            rules::check_cents(v, &format!("{at}.withholdings[{j}].withheld"), line.withheld);
        }
        for (j, payment) in support.payments.iter().enumerate() {
            rules::check_cents(v, &format!("{at}.payments[{j}].total"), payment.total);
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl Withholding {
    pub(crate) fn render_body(&self, emission_date: NaiveDate, root: &mut Node) {
        let mut info = Node::new("infoCompRetencion");
        info.push_leaf("fechaEmision", body_date(emission_date));
        serialize::push_issuer_info(&mut info, &self.header.issuer);
        info.push_leaf("tipoIdentificacionSujetoRetenido", serialize::id_type_code(&self.subject));
        info.push_leaf("parteRel", serialize::yes_no(self.related_party));
        info.push_leaf("razonSocialSujetoRetenido", self.subject.legal_name.trim());
        info.push_leaf("identificacionSujetoRetenido", serialize::identification(&self.subject));
        info.push_leaf("periodoFiscal", FiscalPeriod::of(emission_date).to_wire());
        root.push(info);

        let mut supports = Node::new("docsSustento");
        for support in &self.supports {
            supports.push(render_support(support));
        }
        root.push(supports);
    }
}

fn render_support(support: &SupportDocument) -> Node {
    let mut node = Node::new("docSustento");
    node.push_leaf("codSustento", &support.support_code);
    node.push_leaf("codDocSustento", &support.document_code);
    node.push_leaf("numDocSustento", support.number.replace('-', ""));
    node.push_leaf(
        "fechaEmisionDocSustento",
        support.issue_date.map(body_date).unwrap_or_default(),
    );
    node.push_opt("fechaRegistroContable", support.registration_date.map(body_date));
    node.push_opt("numAutDocSustento", support.authorization.as_deref());
    node.push_leaf(
        "pagoLocExt",
        support.payment_location.as_deref().unwrap_or("01"),
    );
    node.push_leaf(
        "totalSinImpuestos",
        format_amount(support.total_without_taxes.unwrap_or_default()),
    );
    node.push_leaf("importeTotal", format_amount(support.total.unwrap_or_default()));

    let mut taxes = Node::new("impuestosDocSustento");
    for tax in &support.taxes {
        taxes.push(
            Node::new("impuestoDocSustento")
                .child(Node::leaf("codImpuestoDocSustento", &tax.code))
                .child(Node::leaf("codigoPorcentaje", &tax.percentage_code))
                .child(Node::leaf("baseImponible", format_amount(tax.base.unwrap_or_default())))
                .child(Node::leaf("tarifa", format_rate(tax.rate.unwrap_or_default())))
                .child(Node::leaf("valorImpuesto", format_amount(tax.value.unwrap_or_default()))),
        );
    }
    node.push(taxes);

    let mut lines = Node::new("retenciones");
    for line in &support.withholdings {
        lines.push(
            Node::new("retencion")
                .child(Node::leaf("codigo", &line.tax))
                .child(Node::leaf("codigoRetencion", &line.code))
                .child(Node::leaf("baseImponible", format_amount(line.base.unwrap_or_default())))
                .child(Node::leaf("porcentajeRetener", format_rate(line.rate.unwrap_or_default())))
                .child(Node::leaf("valorRetenido", format_amount(line.withheld.unwrap_or_default()))),
        );
    }
    node.push(lines);

    if !support.payments.is_empty() {
        node.push(serialize::payments_node(&support.payments));
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{context, withholding};
    use crate::violation::ViolationKind;
    use rust_decimal_macros::dec;

    #[test]
    fn rules_are_staged() {
        assert!(rules::is_staged(RULES));
    }

    #[test]
    fn fixture_is_valid() {
        let result = withholding().validate(&context());
        assert!(result.is_valid(), "{:?}", result.violations());
    }

    #[test]
    fn fiscal_period_follows_emission_date() {
        let doc = withholding();
        assert_eq!(doc.fiscal_period().unwrap().to_wire(), "01/2026");
        assert_eq!(doc.total_withheld(), Some(dec!(14.50)));
    }

    #[test]
    fn support_after_emission_is_range_violation() {
        let mut doc = withholding();
        doc.supports[0].issue_date = NaiveDate::from_ymd_opt(2026, 1, 20);
        let result = doc.validate(&context());
        let v = &result.violations()[0];
        assert_eq!(v.code, "SUPPORT_DATE_AFTER_EMISSION");
        assert_eq!(v.kind, ViolationKind::Range);
        assert_eq!(v.path, "supports[0].issue_date");
    }

    #[test]
    fn support_without_lines_is_rejected() {
        let mut doc = withholding();
        doc.supports[0].withholdings.clear();
        assert!(doc.validate(&context()).has_code("WITHHOLDINGS_REQUIRED"));

        doc.supports.clear();
        let result = doc.validate(&context());
        assert!(result.has_code("SUPPORTS_REQUIRED"));
        assert_eq!(result.violations().len(), 1);
    }

    #[test]
    fn code_must_match_tax() {
        let mut doc = withholding();
        doc.supports[0].withholdings[0].code = "725".into();
        let result = doc.validate(&context());
        assert!(result.has_code("WITHHOLDING_CODE_TAX_MISMATCH"));

        doc.supports[0].withholdings[0].code = "999".into();
        let result = doc.validate(&context());
        assert!(result.has_code("UNKNOWN_CODE"));
        assert!(!result.has_code("WITHHOLDING_CODE_TAX_MISMATCH"));
    }

    #[test]
    fn line_bounds() {
        let mut doc = withholding();
        doc.supports[0].withholdings[0].base = Some(dec!(0));
        doc.supports[0].withholdings[1].rate = Some(dec!(101));
        let result = doc.validate(&context());
        let codes: Vec<_> = result.violations().iter().map(|v| v.code).collect();
        assert_eq!(codes, ["BASE_NOT_POSITIVE", "RATE_OUT_OF_RANGE"]);
    }

    #[test]
    fn withheld_amount_is_presence_only_by_default() {
        let mut doc = withholding();
        doc.supports[0].withholdings[0].withheld = Some(dec!(9.00));
        assert!(doc.validate(&context()).is_valid());

        let mut ctx = context();
        ctx.policy.recompute_withholding = true;
        let result = doc.validate(&ctx);
        assert!(result.has_code("WITHHELD_AMOUNT_MISMATCH"));

        doc.supports[0].withholdings[0].withheld = Some(dec!(10.01));
        assert!(doc.validate(&ctx).is_valid());
    }

    #[test]
    fn missing_line_fields_are_structural() {
        let mut doc = withholding();
        doc.supports[0].withholdings[0].rate = None;
        let result = doc.validate(&context());
        let v = &result.violations()[0];
        assert_eq!(v.code, "MISSING_FIELD");
        assert_eq!(v.path, "supports[0].withholdings[0].rate");
        assert_eq!(result.violations().len(), 1);
    }

    #[test]
    fn malformed_support_number() {
        let mut doc = withholding();
        doc.supports[0].number = "1-1-1".into();
        assert!(doc.validate(&context()).has_code("VOUCHER_NUMBER_FORMAT"));
    }

    #[test]
    fn subject_checksum_failure() {
        let mut doc = withholding();
        doc.subject.identification = "1710034066001".into();
        let result = doc.validate(&context());
        assert_eq!(result.of_kind(ViolationKind::Checksum).count(), 1);
    }

    #[test]
    fn recomputation_overflow_is_reported() {
        let mut doc = withholding();
        doc.supports[0].withholdings[0].base = Some(Decimal::MAX);
        assert_eq!(doc.supports[0].withholdings[0].expected_withheld(), None);
        assert!(doc.validate(&context()).is_valid());

        let mut ctx = context();
        ctx.policy.recompute_withholding = true;
        let result = doc.validate(&ctx);
        let v = &result.violations()[0];
        assert_eq!(v.code, "AMOUNT_OVERFLOW");
        assert_eq!(v.kind, ViolationKind::Range);
        assert_eq!(v.path, "supports[0].withholdings[0].base");
    }

    #[test]
    fn withheld_totals_overflow() {
        let mut doc = withholding();
        for line in &mut doc.supports[0].withholdings {
            line.withheld = Some(Decimal::MAX);
        }
        assert_eq!(doc.total_withheld(), None);
        let result = doc.validate(&context());
        assert!(result
            .violations()
            .iter()
            .any(|v| v.code == "AMOUNT_OVERFLOW" && v.path == "supports"));
    }
}
