//! # Monthly Transactional Summary
//!
//! The periodic aggregate of a taxpayer's purchases, sales, sales per
//! establishment and voided voucher ranges for one calendar month. It has
//! no access key: it is filed as `{ruc}AT{YYYY}{MM}` and renders under an
//! `iva` root.
//!
//! ## Identification Codes
//!
//! Purchase suppliers use the summary's own table (`01` RUC, `02` cédula,
//! `03` passport). Sale clients use the counterparty codes of the
//! per-transaction documents (`04`..`08`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::money::{format_amount, format_rate};
use sri_core::temporal::body_date;
use sri_core::{check_identification, validate_entity, FiscalPeriod, IdentificationType};

use crate::catalog::{self, WithheldTax};
use crate::model;
use crate::rules::{self, Rule, RuleContext, Stage};
use crate::serialize::{self, Node};
use crate::violation::{ValidationResult, Violations};

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2100;

/// The declaring taxpayer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Informant {
    pub ruc: String,
    pub legal_name: String,
}

/// A monthly transactional summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionalSummary {
    pub informant: Informant,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Establishments registered under the RUC; one when absent.
    pub establishment_count: Option<u32>,
    pub purchases: Vec<Purchase>,
    pub sales: Vec<Sale>,
    pub establishment_sales: Vec<EstablishmentSale>,
    pub voided: Vec<VoidedRange>,
}

/// A purchase voucher received in the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Purchase {
    /// Tax-support code.
    pub support_code: String,
    /// `01` RUC, `02` cédula, `03` passport.
    pub supplier_id_type: String,
    pub supplier_id: String,
    pub voucher_type: String,
    pub related_party: bool,
    pub registration_date: Option<NaiveDate>,
    pub establishment: String,
    pub emission_point: String,
    pub sequential: Option<u64>,
    pub emission_date: Option<NaiveDate>,
    pub authorization: String,
    pub base_non_vat: Option<Decimal>,
    pub base_zero: Option<Decimal>,
    pub base_taxed: Option<Decimal>,
    pub base_exempt: Option<Decimal>,
    pub ice: Option<Decimal>,
    pub vat: Option<Decimal>,
    /// VAT withheld on goods.
    pub vat_withheld_goods: Option<Decimal>,
    /// VAT withheld on services.
    pub vat_withheld_services: Option<Decimal>,
    pub payment_methods: Vec<String>,
    pub income_withholdings: Vec<IncomeWithholding>,
}

/// Income-tax withholding applied to a purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeWithholding {
    pub code: String,
    pub base: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub withheld: Option<Decimal>,
}

/// Sales to one client, by voucher type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sale {
    /// Counterparty identification code; inferred when absent.
    pub client_id_type: Option<String>,
    pub client_id: String,
    pub related_party: bool,
    pub voucher_type: String,
    /// `true` for electronic vouchers (`E`), `false` for printed (`F`).
    pub electronic: bool,
    pub voucher_count: Option<u32>,
    pub base_non_vat: Option<Decimal>,
    pub base_zero: Option<Decimal>,
    pub base_taxed: Option<Decimal>,
    pub vat: Option<Decimal>,
    pub ice: Option<Decimal>,
    pub vat_withheld: Option<Decimal>,
    pub income_withheld: Option<Decimal>,
    pub payment_methods: Vec<String>,
}

/// Sales total of one establishment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstablishmentSale {
    pub establishment: String,
    pub total: Option<Decimal>,
    pub vat_compensated: Option<Decimal>,
}

/// A range of voided vouchers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidedRange {
    pub voucher_type: String,
    pub establishment: String,
    pub emission_point: String,
    pub first: Option<u64>,
    pub last: Option<u64>,
    pub authorization: String,
}

/// Aggregate figures filed alongside the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AtsTotals {
    pub purchases: usize,
    pub sales: usize,
    pub voided: usize,
    pub purchases_amount: Decimal,
    pub sales_amount: Decimal,
    pub purchases_vat: Decimal,
    pub sales_vat: Decimal,
    /// Withheld by the informant on its purchases.
    pub withholdings_made: Decimal,
    /// Withheld from the informant on its sales.
    pub withholdings_received: Decimal,
}

impl Purchase {
    /// Bases, ICE and VAT; `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        model::checked_sum(
            [
                &self.base_non_vat,
                &self.base_zero,
                &self.base_taxed,
                &self.base_exempt,
                &self.ice,
                &self.vat,
            ]
            .into_iter()
            .map(Option::as_ref),
        )
    }

    pub fn withheld(&self) -> Option<Decimal> {
        let income = model::checked_sum(self.income_withholdings.iter().map(|w| w.withheld.as_ref()))?;
        model::checked_sum(
            [&self.vat_withheld_goods, &self.vat_withheld_services, &Some(income)]
                .into_iter()
                .map(Option::as_ref),
        )
    }
}

impl Sale {
    pub fn resolved_id_type(&self) -> Result<IdentificationType, &str> {
        match self.client_id_type.as_deref() {
            Some(code) => IdentificationType::from_code(code).ok_or(code),
            None => Ok(IdentificationType::infer(&self.client_id)),
        }
    }

    /// Taxable bases of the sale.
    pub fn bases(&self) -> Option<Decimal> {
        model::checked_sum([&self.base_non_vat, &self.base_zero, &self.base_taxed].into_iter().map(Option::as_ref))
    }

    /// Taxed base plus VAT.
    pub fn amount(&self) -> Option<Decimal> {
        model::checked_sum([&self.base_taxed, &self.vat].into_iter().map(Option::as_ref))
    }

    pub fn withheld(&self) -> Option<Decimal> {
        model::checked_sum([&self.vat_withheld, &self.income_withheld].into_iter().map(Option::as_ref))
    }
}

impl TransactionalSummary {
    pub fn period(&self) -> Option<FiscalPeriod> {
        Some(FiscalPeriod {
            year: self.year?,
            month: self.month?,
        })
    }

    /// `{ruc}AT{YYYY}{MM}`.
    pub fn file_name(&self) -> String {
        let period = FiscalPeriod {
            year: self.year.unwrap_or_default(),
            month: self.month.unwrap_or_default(),
        };
        format!("{}AT{}", self.informant.ruc.trim(), period.file_suffix())
    }

    /// Period aggregates; `None` when any of them overflows.
    pub fn totals(&self) -> Option<AtsTotals> {
        Some(AtsTotals {
            purchases: self.purchases.len(),
            sales: self.sales.len(),
            voided: self.voided.len(),
            purchases_amount: model::try_sum(self.purchases.iter().map(Purchase::total))?,
            sales_amount: model::try_sum(self.sales.iter().map(Sale::amount))?,
            purchases_vat: model::checked_sum(self.purchases.iter().map(|p| p.vat.as_ref()))?,
            sales_vat: model::checked_sum(self.sales.iter().map(|s| s.vat.as_ref()))?,
            withholdings_made: model::try_sum(self.purchases.iter().map(Purchase::withheld))?,
            withholdings_received: model::try_sum(self.sales.iter().map(Sale::withheld))?,
        })
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("transactional_summary", RULES, self, ctx)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub(crate) const RULES: &[Rule<TransactionalSummary>] = &[
    Rule::new("informant_present", Stage::Presence, informant_present),
    Rule::new("purchases_present", Stage::Presence, purchases_present),
    Rule::new("sales_present", Stage::Presence, sales_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound),
    Rule::when("period_bounds", Stage::Temporal, has_period, period_bounds),
    Rule::when("registration_dates", Stage::Temporal, has_period, registration_dates),
    Rule::new("transactions_counted", Stage::Cardinality, transactions_counted),
    Rule::new("codes_and_amounts", Stage::BusinessRules, codes_and_amounts),
    Rule::new("voided_ranges", Stage::BusinessRules, voided_ranges),
    Rule::new("amounts_bounded", Stage::BusinessRules, amounts_bounded),
    Rule::new("formats", Stage::Format, formats),
];

fn has_period(doc: &TransactionalSummary) -> bool {
    doc.period().is_some()
}

fn informant_present(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    rules::require_text(v, "informant.ruc", &doc.informant.ruc);
    rules::require_min_len(v, "informant.legal_name", &doc.informant.legal_name, 3);
    rules::require(v, "year", doc.year);
    rules::require(v, "month", doc.month);
}

fn purchases_present(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    for (i, p) in doc.purchases.iter().enumerate() {
        let at = format!("purchases[{i}]");
        rules::require_text(v, &format!("{at}.support_code"), &p.support_code);
        if rules::require_text(v, &format!("{at}.supplier_id_type"), &p.supplier_id_type)
            && catalog::supplier_id_type(&p.supplier_id_type).is_none()
        {
            v.structural(
                "UNKNOWN_ID_TYPE",
                format!("{at}.supplier_id_type"),
                format!("unknown supplier identification type {:?}", p.supplier_id_type),
            );
        }
        rules::require_text(v, &format!("{at}.supplier_id"), &p.supplier_id);
        rules::require_text(v, &format!("{at}.voucher_type"), &p.voucher_type);
        rules::require(v, &format!("{at}.registration_date"), p.registration_date);
        rules::require_three_digit(v, &format!("{at}.establishment"), &p.establishment);
        rules::require_three_digit(v, &format!("{at}.emission_point"), &p.emission_point);
        rules::require_sequential(v, &format!("{at}.sequential"), p.sequential);
        rules::require(v, &format!("{at}.emission_date"), p.emission_date);
        rules::require_text(v, &format!("{at}.authorization"), &p.authorization);
    }
}

fn sales_present(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    for (i, s) in doc.sales.iter().enumerate() {
        let at = format!("sales[{i}]");
        match s.resolved_id_type() {
            Ok(IdentificationType::FinalConsumer) => {}
            Ok(_) => {
                rules::require_text(v, &format!("{at}.client_id"), &s.client_id);
            }
            Err(code) => v.structural(
                "UNKNOWN_ID_TYPE",
                format!("{at}.client_id_type"),
                format!("unknown identification type {code:?}"),
            ),
        }
        rules::require_text(v, &format!("{at}.voucher_type"), &s.voucher_type);
    }
    for (i, e) in doc.establishment_sales.iter().enumerate() {
        rules::require_three_digit(v, &format!("establishment_sales[{i}].establishment"), &e.establishment);
    }
    for (i, r) in doc.voided.iter().enumerate() {
        let at = format!("voided[{i}]");
        rules::require_text(v, &format!("{at}.voucher_type"), &r.voucher_type);
        rules::require_three_digit(v, &format!("{at}.establishment"), &r.establishment);
        rules::require_three_digit(v, &format!("{at}.emission_point"), &r.emission_point);
        rules::require_sequential(v, &format!("{at}.first"), r.first);
        rules::require_sequential(v, &format!("{at}.last"), r.last);
        rules::require_text(v, &format!("{at}.authorization"), &r.authorization);
    }
}

fn identifiers_sound(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    if !doc.informant.ruc.trim().is_empty() {
        if let Some(defect) = validate_entity(doc.informant.ruc.trim()).reason {
            v.identifier("informant.ruc", &defect);
        }
    }
    for (i, p) in doc.purchases.iter().enumerate() {
        let (Some(id_type), false) = (
            catalog::supplier_id_type(&p.supplier_id_type),
            p.supplier_id.trim().is_empty(),
        ) else {
            continue;
        };
        if let Err(defect) = check_identification(id_type, p.supplier_id.trim()) {
            v.identifier(format!("purchases[{i}].supplier_id"), &defect);
        }
    }
    for (i, s) in doc.sales.iter().enumerate() {
        let Ok(id_type) = s.resolved_id_type() else {
            continue;
        };
        let id = match s.client_id.trim() {
            "" if id_type == IdentificationType::FinalConsumer => sri_core::FINAL_CONSUMER_ID,
            "" => continue,
            id => id,
        };
        if let Err(defect) = check_identification(id_type, id) {
            v.identifier(format!("sales[{i}].client_id"), &defect);
        }
    }
}

fn period_bounds(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    if let Some(year) = doc.year.filter(|y| !(MIN_YEAR..=MAX_YEAR).contains(y)) {
        v.range(
            "PERIOD_OUT_OF_RANGE",
            "year",
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"),
        );
    }
    if let Some(month) = doc.month.filter(|m| !(1..=12).contains(m)) {
        v.range(
            "PERIOD_OUT_OF_RANGE",
            "month",
            format!("month must be between 1 and 12, got {month}"),
        );
    }
}

fn registration_dates(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    let Some(period) = doc.period().filter(FiscalPeriod::is_valid) else {
        return;
    };
    for (i, p) in doc.purchases.iter().enumerate() {
        let Some(registered) = p.registration_date else {
            continue;
        };
        if !period.contains(registered) {
            v.range(
                "REGISTRATION_OUTSIDE_PERIOD",
                format!("purchases[{i}].registration_date"),
                format!("registered {registered}, outside the declared period {period}"),
            );
        }
        if p.emission_date.is_some_and(|emitted| registered < emitted) {
            v.range(
                "REGISTRATION_BEFORE_EMISSION",
                format!("purchases[{i}].registration_date"),
                "a purchase cannot be registered before it was issued",
            );
        }
    }
}

fn transactions_counted(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    if doc.purchases.is_empty() && doc.sales.is_empty() {
        v.range(
            "TRANSACTIONS_REQUIRED",
            "purchases",
            "the summary must include at least one purchase or sale",
        );
    }
    for (i, s) in doc.sales.iter().enumerate() {
        if s.voucher_count == Some(0) {
            v.range(
                "VOUCHER_COUNT",
                format!("sales[{i}].voucher_count"),
                "a sale must cover at least one voucher",
            );
        }
    }
}

fn codes_and_amounts(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    for (i, p) in doc.purchases.iter().enumerate() {
        let at = format!("purchases[{i}]");
        for (path, amount) in purchase_amounts(p) {
            rules::check_non_negative(v, &format!("{at}.{path}"), amount);
        }
        check_methods(v, &at, &p.payment_methods);
        for (j, w) in p.income_withholdings.iter().enumerate() {
            let wat = format!("{at}.income_withholdings[{j}]");
            if rules::require_text(v, &format!("{wat}.code"), &w.code)
                && catalog::withholding_code(WithheldTax::Income, w.code.trim()).is_none()
            {
                v.structural(
                    "UNKNOWN_CODE",
                    format!("{wat}.code"),
                    format!("unknown income withholding code {:?}", w.code),
                );
            }
            rules::require(v, &format!("{wat}.base"), w.base);
            rules::require(v, &format!("{wat}.rate"), w.rate);
            rules::require(v, &format!("{wat}.withheld"), w.withheld);
            rules::check_non_negative(v, &format!("{wat}.base"), w.base);
            rules::check_non_negative(v, &format!("{wat}.withheld"), w.withheld);
        }
    }
    for (i, s) in doc.sales.iter().enumerate() {
        let at = format!("sales[{i}]");
        for (path, amount) in sale_amounts(s) {
            rules::check_non_negative(v, &format!("{at}.{path}"), amount);
        }
        check_methods(v, &at, &s.payment_methods);
    }
    for (i, e) in doc.establishment_sales.iter().enumerate() {
        rules::check_non_negative(v, &format!("establishment_sales[{i}].total"), e.total);
        rules::check_non_negative(
            v,
            &format!("establishment_sales[{i}].vat_compensated"),
            e.vat_compensated,
        );
    }
}

fn check_methods(v: &mut Violations, at: &str, methods: &[String]) {
    for (j, method) in methods.iter().enumerate() {
        if catalog::payment_method(method.trim()).is_none() {
            v.structural(
                "UNKNOWN_CODE",
                format!("{at}.payment_methods[{j}]"),
                format!("unknown payment method {method:?}"),
            );
        }
    }
}

fn voided_ranges(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    for (i, r) in doc.voided.iter().enumerate() {
        if let (Some(first), Some(last)) = (r.first, r.last) {
            if first > last {
                v.range(
                    "VOIDED_RANGE_INVERTED",
                    format!("voided[{i}].last"),
                    format!("range ends at {last}, before its start {first}"),
                );
            }
        }
    }
}

fn amounts_bounded(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    let before = v.len();
    for (i, p) in doc.purchases.iter().enumerate() {
        rules::check_overflow(v, &format!("purchases[{i}]"), p.total());
        rules::check_overflow(v, &format!("purchases[{i}].withheld"), p.withheld());
    }
    for (i, s) in doc.sales.iter().enumerate() {
        rules::check_overflow(v, &format!("sales[{i}]"), s.bases());
        rules::check_overflow(v, &format!("sales[{i}]"), s.amount());
        rules::check_overflow(v, &format!("sales[{i}].withheld"), s.withheld());
    }
    if v.len() == before {
        rules::check_overflow(v, "totals", doc.totals());
    }
}

fn formats(doc: &TransactionalSummary, _: &RuleContext, v: &mut Violations) {
    for (i, p) in doc.purchases.iter().enumerate() {
        for (path, amount) in purchase_amounts(p) {
            rules::check_cents(v, &format!("purchases[{i}].{path}"), amount);
        }
        for (j, w) in p.income_withholdings.iter().enumerate() {
            rules::check_cents(v, &format!("purchases[{i}].income_withholdings[{j}].withheld"), w.withheld);
        }
    }
    for (i, s) in doc.sales.iter().enumerate() {
        for (path, amount) in sale_amounts(s) {
            rules::check_cents(v, &format!("sales[{i}].{path}"), amount);
        }
    }
}

fn purchase_amounts(p: &Purchase) -> [(&'static str, Option<Decimal>); 8] {
    [
        ("base_non_vat", p.base_non_vat),
        ("base_zero", p.base_zero),
        ("base_taxed", p.base_taxed),
        ("base_exempt", p.base_exempt),
        ("ice", p.ice),
        ("vat", p.vat),
        ("vat_withheld_goods", p.vat_withheld_goods),
        ("vat_withheld_services", p.vat_withheld_services),
    ]
}

fn sale_amounts(s: &Sale) -> [(&'static str, Option<Decimal>); 7] {
    [
        ("base_non_vat", s.base_non_vat),
        ("base_zero", s.base_zero),
        ("base_taxed", s.base_taxed),
        ("vat", s.vat),
        ("ice", s.ice),
        ("vat_withheld", s.vat_withheld),
        ("income_withheld", s.income_withheld),
    ]
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn amount(value: Option<Decimal>) -> String {
    format_amount(value.unwrap_or_default())
}

impl TransactionalSummary {
    pub(crate) fn render_tree(&self) -> Node {
        let period = FiscalPeriod {
            year: self.year.unwrap_or_default(),
            month: self.month.unwrap_or_default(),
        };
        let mut root = Node::new("iva");
        root.push_leaf("TipoIDInformante", "R");
        root.push_leaf("IdInformante", self.informant.ruc.trim());
        root.push_leaf("razonSocial", self.informant.legal_name.trim());
        root.push_leaf("Anio", format!("{:04}", period.year));
        root.push_leaf("Mes", period.month_padded());
        root.push_leaf(
            "numEstabRuc",
            format!("{:03}", self.establishment_count.unwrap_or(1)),
        );
        root.push_leaf(
            "totalVentas",
            format_amount(model::try_sum(self.sales.iter().map(Sale::bases)).unwrap_or_default()),
        );
        root.push_leaf("codigoOperativo", "IVA");

        if !self.purchases.is_empty() {
            let mut purchases = Node::new("compras");
            for p in &self.purchases {
                purchases.push(render_purchase(p));
            }
            root.push(purchases);
        }
        if !self.sales.is_empty() {
            let mut sales = Node::new("ventas");
            for s in &self.sales {
                sales.push(render_sale(s));
            }
            root.push(sales);
        }
        if !self.establishment_sales.is_empty() {
            let mut by_establishment = Node::new("ventasEstablecimiento");
            for e in &self.establishment_sales {
                by_establishment.push(
                    Node::new("ventaEst")
                        .child(Node::leaf("codEstab", e.establishment.trim()))
                        .child(Node::leaf("ventasEstab", amount(e.total)))
                        .child(Node::leaf("ivaComp", amount(e.vat_compensated))),
                );
            }
            root.push(by_establishment);
        }
        if !self.voided.is_empty() {
            let mut voided = Node::new("anulados");
            for r in &self.voided {
                voided.push(
                    Node::new("detalleAnulados")
                        .child(Node::leaf("tipoComprobante", r.voucher_type.trim()))
                        .child(Node::leaf("establecimiento", r.establishment.trim()))
                        .child(Node::leaf("puntoEmision", r.emission_point.trim()))
                        .child(Node::leaf("secuencialInicio", r.first.unwrap_or_default().to_string()))
                        .child(Node::leaf("secuencialFin", r.last.unwrap_or_default().to_string()))
                        .child(Node::leaf("autorizacion", r.authorization.trim())),
                );
            }
            root.push(voided);
        }
        root
    }
}

fn render_purchase(p: &Purchase) -> Node {
    let mut node = Node::new("detalleCompras");
    node.push_leaf("codSustento", p.support_code.trim());
    node.push_leaf("tpIdProv", p.supplier_id_type.trim());
    node.push_leaf("idProv", p.supplier_id.trim());
    node.push_leaf("tipoComprobante", p.voucher_type.trim());
    node.push_leaf("parteRel", serialize::yes_no(p.related_party));
    node.push_leaf("fechaRegistro", p.registration_date.map(body_date).unwrap_or_default());
    node.push_leaf("establecimiento", p.establishment.trim());
    node.push_leaf("puntoEmision", p.emission_point.trim());
    node.push_leaf("secuencial", format!("{:09}", p.sequential.unwrap_or_default()));
    node.push_leaf("fechaEmision", p.emission_date.map(body_date).unwrap_or_default());
    node.push_leaf("autorizacion", p.authorization.trim());
    node.push_leaf("baseNoGraIva", amount(p.base_non_vat));
    node.push_leaf("baseImponible", amount(p.base_zero));
    node.push_leaf("baseImpGrav", amount(p.base_taxed));
    node.push_leaf("baseImpExe", amount(p.base_exempt));
    node.push_leaf("montoIce", amount(p.ice));
    node.push_leaf("montoIva", amount(p.vat));
    node.push_opt("valorRetBienes", p.vat_withheld_goods.map(format_amount));
    node.push_opt("valorRetServicios", p.vat_withheld_services.map(format_amount));
    if !p.payment_methods.is_empty() {
        node.push(methods_node(&p.payment_methods));
    }
    if !p.income_withholdings.is_empty() {
        let mut air = Node::new("air");
        for w in &p.income_withholdings {
            air.push(
                Node::new("detalleAir")
                    .child(Node::leaf("codRetAir", w.code.trim()))
                    .child(Node::leaf("baseImpAir", amount(w.base)))
                    .child(Node::leaf("porcentajeAir", format_rate(w.rate.unwrap_or_default())))
                    .child(Node::leaf("valRetAir", amount(w.withheld))),
            );
        }
        node.push(air);
    }
    node
}

fn render_sale(s: &Sale) -> Node {
    let id_type = s.resolved_id_type().map_or("", |t| t.code());
    let client = match s.client_id.trim() {
        "" => sri_core::FINAL_CONSUMER_ID,
        id => id,
    };
    let mut node = Node::new("detalleVentas");
    node.push_leaf("tpIdCliente", id_type);
    node.push_leaf("idCliente", client);
    node.push_leaf("parteRelVtas", serialize::yes_no(s.related_party));
    node.push_leaf("tipoComprobante", s.voucher_type.trim());
    node.push_leaf("tipoEmision", if s.electronic { "E" } else { "F" });
    node.push_leaf("numeroComprobantes", s.voucher_count.unwrap_or(1).to_string());
    node.push_leaf("baseNoGraIva", amount(s.base_non_vat));
    node.push_leaf("baseImponible", amount(s.base_zero));
    node.push_leaf("baseImpGrav", amount(s.base_taxed));
    node.push_leaf("montoIva", amount(s.vat));
    node.push_leaf("montoIce", amount(s.ice));
    node.push_leaf("valorRetIva", amount(s.vat_withheld));
    node.push_leaf("valorRetRenta", amount(s.income_withheld));
    if !s.payment_methods.is_empty() {
        node.push(methods_node(&s.payment_methods));
    }
    node
}

fn methods_node(methods: &[String]) -> Node {
    let mut node = Node::new("formasDePago");
    for method in methods {
        node.push_leaf("formaPago", method.trim());
    }
    node
}
