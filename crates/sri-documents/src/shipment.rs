//! # Shipment Guide (`codDoc 06`)
//!
//! Authorizes the physical movement of goods. The transport motive decides
//! which supporting data is mandatory; see
//! [`TransportMotive`](crate::catalog::TransportMotive).
//!
//! A recipient may override the guide's motive. A document reference given
//! at guide level applies to every recipient without one of its own.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::money::format_quantity;
use sri_core::temporal::body_date;

use crate::catalog::{self, TransportMotive};
use crate::model::{AdditionalField, Counterparty, DocumentReference, Header};
use crate::rules::{self, Rule, RuleContext, Stage};
use crate::serialize::{self, Node};
use crate::violation::{ValidationResult, Violations};

/// A shipment guide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentGuide {
    pub header: Header,
    pub origin_address: String,
    pub carrier: Counterparty,
    /// Vehicle plate, `ABC-1234` or `ABC123`.
    pub plate: String,
    pub transport_start: Option<NaiveDate>,
    pub transport_end: Option<NaiveDate>,
    /// Transport motive code, `01` to `10`.
    pub motive: String,
    pub route: Option<String>,
    /// Free-text justification, mandatory for motive `10`.
    pub observation: Option<String>,
    pub reference_document: Option<DocumentReference>,
    pub recipients: Vec<Recipient>,
    pub additional: Vec<AdditionalField>,
}

/// A destination of the goods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipient {
    pub party: Counterparty,
    /// Overrides the guide's motive for this recipient.
    pub motive: Option<String>,
    /// Single customs document, for imports and exports.
    pub customs_document: Option<String>,
    pub destination_establishment: Option<String>,
    pub route: Option<String>,
    pub reference_document: Option<DocumentReference>,
    pub items: Vec<ShipmentItem>,
}

/// Goods carried to one recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentItem {
    pub internal_code: String,
    pub additional_code: Option<String>,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub details: Vec<AdditionalField>,
}

impl ShipmentGuide {
    pub fn motive(&self) -> Option<&'static TransportMotive> {
        catalog::transport_motive(&self.motive)
    }

    /// Motive in force for one recipient.
    pub fn recipient_motive(&self, recipient: &Recipient) -> Option<&'static TransportMotive> {
        match recipient.motive.as_deref() {
            Some(code) if !code.trim().is_empty() => catalog::transport_motive(code),
            _ => self.motive(),
        }
    }

    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        rules::evaluate("shipment_guide", RULES, self, ctx)
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub(crate) const RULES: &[Rule<ShipmentGuide>] = &[
    Rule::new("header_present", Stage::Presence, header_present),
    Rule::new("transport_present", Stage::Presence, transport_present),
    Rule::new("recipients_present", Stage::Presence, recipients_present),
    Rule::new("identifiers_sound", Stage::Identifiers, identifiers_sound),
    Rule::new("emission_date", Stage::Temporal, emission_date),
    Rule::when("transport_window", Stage::Temporal, has_transport_start, transport_window),
    Rule::new("recipients_counted", Stage::Cardinality, recipients_counted),
    Rule::when("motive_requirements", Stage::BusinessRules, has_known_motive, motive_requirements),
    Rule::new("item_quantities", Stage::BusinessRules, item_quantities),
    Rule::new("formats", Stage::Format, formats),
];

fn has_transport_start(doc: &ShipmentGuide) -> bool {
    doc.transport_start.is_some()
}

fn has_known_motive(doc: &ShipmentGuide) -> bool {
    doc.motive().is_some()
}

fn header_present(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    rules::check_header_presence(v, &doc.header);
}

fn transport_present(doc: &ShipmentGuide, ctx: &RuleContext, v: &mut Violations) {
    rules::require_min_len(v, "origin_address", &doc.origin_address, ctx.policy.address_min_len);
    rules::check_counterparty_presence(v, "carrier", &doc.carrier);
    if !doc.carrier.legal_name.trim().is_empty() {
        rules::require_min_len(v, "carrier.legal_name", &doc.carrier.legal_name, 3);
    }
    rules::require_text(v, "plate", &doc.plate);
    rules::require(v, "transport_start", doc.transport_start);
    rules::require(v, "transport_end", doc.transport_end);
    if rules::require_text(v, "motive", &doc.motive) && doc.motive().is_none() {
        v.structural(
            "UNKNOWN_CODE",
            "motive",
            format!("unknown transport motive {:?}", doc.motive),
        );
    }
}

fn recipients_present(doc: &ShipmentGuide, ctx: &RuleContext, v: &mut Violations) {
    for (i, recipient) in doc.recipients.iter().enumerate() {
        let at = format!("recipients[{i}]");
        rules::check_counterparty_presence(v, &format!("{at}.party"), &recipient.party);
        rules::require_min_len(
            v,
            &format!("{at}.party.address"),
            recipient.party.address.as_deref().unwrap_or_default(),
            ctx.policy.address_min_len,
        );
        if let Some(code) = recipient.motive.as_deref().filter(|c| !c.trim().is_empty()) {
            if catalog::transport_motive(code).is_none() {
                v.structural(
                    "UNKNOWN_CODE",
                    format!("{at}.motive"),
                    format!("unknown transport motive {code:?}"),
                );
            }
        }
        for (j, item) in recipient.items.iter().enumerate() {
            let at = format!("{at}.items[{j}]");
            rules::require_min_len(v, &format!("{at}.description"), &item.description, 3);
            rules::require(v, &format!("{at}.quantity"), item.quantity);
        }
    }
}

fn identifiers_sound(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    rules::check_issuer_identifier(v, &doc.header);
    rules::check_counterparty_identifier(v, "carrier", &doc.carrier);
    for (i, recipient) in doc.recipients.iter().enumerate() {
        rules::check_counterparty_identifier(v, &format!("recipients[{i}].party"), &recipient.party);
    }
}

fn emission_date(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    rules::check_emission_date(v, &doc.header);
}

fn transport_window(doc: &ShipmentGuide, ctx: &RuleContext, v: &mut Violations) {
    let Some(start) = doc.transport_start else {
        return;
    };
    let policy = &ctx.policy;
    if let Some(emission) = doc.header.emission_date {
        let latest = rules::add_days(emission, policy.shipment_max_lead_days);
        if start < emission || start > latest {
            v.range(
                "TRANSPORT_START_WINDOW",
                "transport_start",
                format!(
                    "transport must start between {emission} and {latest}, got {start}"
                ),
            );
        }
    }
    let horizon = rules::add_days(ctx.today, policy.shipment_max_future_days);
    if start > horizon {
        v.range(
            "TRANSPORT_TOO_FAR_AHEAD",
            "transport_start",
            format!("transport start {start} is after {horizon}"),
        );
    }
    if let Some(end) = doc.transport_end {
        if end < start {
            v.range(
                "TRANSPORT_END_BEFORE_START",
                "transport_end",
                format!("transport ends {end}, before it starts {start}"),
            );
        }
    }
}

fn recipients_counted(doc: &ShipmentGuide, ctx: &RuleContext, v: &mut Violations) {
    let policy = &ctx.policy;
    if doc.recipients.is_empty() {
        v.range("RECIPIENTS_REQUIRED", "recipients", "at least one recipient is required");
    } else if doc.recipients.len() > policy.shipment_max_recipients {
        v.range(
            "TOO_MANY_RECIPIENTS",
            "recipients",
            format!(
                "at most {} recipients, got {}",
                policy.shipment_max_recipients,
                doc.recipients.len()
            ),
        );
    }
    for (i, recipient) in doc.recipients.iter().enumerate() {
        let at = format!("recipients[{i}].items");
        if recipient.items.is_empty() {
            v.range("ITEMS_REQUIRED", at, "each recipient needs at least one item");
        } else if recipient.items.len() > policy.shipment_max_items_per_recipient {
            v.range(
                "TOO_MANY_ITEMS",
                at,
                format!(
                    "at most {} items per recipient, got {}",
                    policy.shipment_max_items_per_recipient,
                    recipient.items.len()
                ),
            );
        }
    }
}

fn motive_requirements(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    let Some(motive) = doc.motive() else {
        return;
    };

    let every_recipient = |f: fn(&Recipient) -> bool| {
        !doc.recipients.is_empty() && doc.recipients.iter().all(f)
    };

    if motive.requires_reference
        && doc.reference_document.is_none()
        && !every_recipient(|r| r.reference_document.is_some())
    {
        v.business(
            "MOTIVE_REQUIRES_REFERENCE",
            "reference_document",
            format!("motive {} requires a reference document", motive.code),
        );
    }
    if motive.requires_route
        && blank(doc.route.as_deref())
        && !every_recipient(|r| !blank(r.route.as_deref()))
    {
        v.business(
            "MOTIVE_REQUIRES_ROUTE",
            "route",
            format!("motive {} requires a route", motive.code),
        );
    }

    let mut needs_observation = motive.requires_observation;
    for (i, recipient) in doc.recipients.iter().enumerate() {
        let Some(own) = doc.recipient_motive(recipient) else {
            continue;
        };
        let at = format!("recipients[{i}]");
        if own.requires_customs && blank(recipient.customs_document.as_deref()) {
            v.business(
                "MOTIVE_REQUIRES_CUSTOMS_DOCUMENT",
                format!("{at}.customs_document"),
                format!("motive {} requires a customs document", own.code),
            );
        }
        if own.code == motive.code {
            continue;
        }
        if own.requires_reference
            && recipient.reference_document.is_none()
            && doc.reference_document.is_none()
        {
            v.business(
                "MOTIVE_REQUIRES_REFERENCE",
                format!("{at}.reference_document"),
                format!("motive {} requires a reference document", own.code),
            );
        }
        if own.requires_route && blank(recipient.route.as_deref()) && blank(doc.route.as_deref()) {
            v.business(
                "MOTIVE_REQUIRES_ROUTE",
                format!("{at}.route"),
                format!("motive {} requires a route", own.code),
            );
        }
        needs_observation |= own.requires_observation;
    }
    if needs_observation && blank(doc.observation.as_deref()) {
        v.business(
            "MOTIVE_REQUIRES_OBSERVATION",
            "observation",
            "motive 10 requires an observation",
        );
    }
}

fn item_quantities(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    for (i, recipient) in doc.recipients.iter().enumerate() {
        for (j, item) in recipient.items.iter().enumerate() {
            if let Some(quantity) = item.quantity {
                if quantity < Decimal::ONE {
                    v.range(
                        "QUANTITY_TOO_SMALL",
                        format!("recipients[{i}].items[{j}].quantity"),
                        format!("quantity must be at least 1, got {quantity}"),
                    );
                }
            }
        }
    }
}

fn formats(doc: &ShipmentGuide, _: &RuleContext, v: &mut Violations) {
    if !doc.plate.trim().is_empty() && !is_plate(&doc.plate) {
        v.structural(
            "PLATE_FORMAT",
            "plate",
            format!("plate must look like ABC-1234, got {:?}", doc.plate),
        );
    }
    if let Some(reference) = &doc.reference_document {
        check_reference(v, "reference_document", reference);
    }
    for (i, recipient) in doc.recipients.iter().enumerate() {
        let at = format!("recipients[{i}]");
        if let Some(reference) = &recipient.reference_document {
            check_reference(v, &format!("{at}.reference_document"), reference);
        }
        if let Some(code) = recipient.destination_establishment.as_deref() {
            rules::require_three_digit(v, &format!("{at}.destination_establishment"), code);
        }
    }
}

fn check_reference(v: &mut Violations, path: &str, reference: &DocumentReference) {
    rules::require_text(v, &format!("{path}.document_code"), &reference.document_code);
    rules::check_voucher_number(v, &format!("{path}.number"), &reference.number);
}

/// Three letters, an optional dash, three or four digits.
fn is_plate(plate: &str) -> bool {
    let plate = plate.trim();
    let bytes = plate.as_bytes();
    if bytes.len() < 6 || !bytes[..3].iter().all(u8::is_ascii_alphabetic) {
        return false;
    }
    let digits = match bytes[3] {
        b'-' => &bytes[4..],
        _ => &bytes[3..],
    };
    (3..=4).contains(&digits.len()) && digits.iter().all(u8::is_ascii_digit)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl ShipmentGuide {
    pub(crate) fn render_body(&self, root: &mut Node) {
        let issuer = &self.header.issuer;
        let mut info = Node::new("infoGuiaRemision");
        info.push_leaf("dirEstablecimiento", issuer.branch_address());
        info.push_leaf("dirPartida", self.origin_address.trim());
        info.push_leaf("razonSocialTransportista", self.carrier.legal_name.trim());
        info.push_leaf("tipoIdentificacionTransportista", serialize::id_type_code(&self.carrier));
        info.push_leaf("rucTransportista", serialize::identification(&self.carrier));
        info.push_leaf("obligadoContabilidad", serialize::yes_no(issuer.keeps_accounts));
        info.push_opt("contribuyenteEspecial", issuer.special_taxpayer.as_deref());
        info.push_leaf(
            "fechaIniTransporte",
            self.transport_start.map(body_date).unwrap_or_default(),
        );
        info.push_leaf(
            "fechaFinTransporte",
            self.transport_end.map(body_date).unwrap_or_default(),
        );
        info.push_leaf("placa", self.plate.trim().to_ascii_uppercase());
        root.push(info);

        let mut recipients = Node::new("destinatarios");
        for recipient in &self.recipients {
            recipients.push(self.render_recipient(recipient));
        }
        root.push(recipients);
    }

    fn render_recipient(&self, recipient: &Recipient) -> Node {
        let party = &recipient.party;
        let mut node = Node::new("destinatario");
        node.push_leaf("identificacionDestinatario", serialize::identification(party));
        node.push_leaf("razonSocialDestinatario", party.legal_name.trim());
        node.push_leaf("dirDestinatario", party.address.as_deref().unwrap_or_default().trim());
        node.push_leaf(
            "motivoTraslado",
            recipient
                .motive
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(self.motive.as_str()),
        );
        node.push_opt("docAduaneroUnico", recipient.customs_document.as_deref());
        node.push_opt("codEstabDestino", recipient.destination_establishment.as_deref());
        node.push_opt("ruta", recipient.route.as_deref().or(self.route.as_deref()));
        if let Some(reference) = recipient
            .reference_document
            .as_ref()
            .or(self.reference_document.as_ref())
        {
            node.push_leaf("codDocSustento", &reference.document_code);
            node.push_leaf("numDocSustento", &reference.number);
            node.push_opt("numAutDocSustento", reference.authorization.as_deref());
            node.push_opt("fechaEmisionDocSustento", reference.issue_date.map(body_date));
        }

        let mut items = Node::new("detalles");
        for item in &recipient.items {
            let code: String = if item.internal_code.trim().is_empty() {
                item.description.trim().chars().take(25).collect()
            } else {
                item.internal_code.clone()
            };
            let mut detail = Node::new("detalle");
            detail.push_leaf("codigoInterno", code);
            detail.push_opt("codigoAdicional", item.additional_code.as_deref());
            detail.push_leaf("descripcion", item.description.trim());
            detail.push_leaf("cantidad", format_quantity(item.quantity.unwrap_or_default()));
            if !item.details.is_empty() {
                detail.push(serialize::item_details_node(&item.details));
            }
            items.push(detail);
        }
        node.push(items);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{context, shipment_guide};
    use crate::violation::ViolationKind;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn rules_are_staged() {
        assert!(rules::is_staged(RULES));
    }

    #[test]
    fn fixture_is_valid() {
        let result = shipment_guide().validate(&context());
        assert!(result.is_valid(), "{:?}", result.violations());
    }

    #[test]
    fn return_without_reference_is_one_business_violation() {
        let mut doc = shipment_guide();
        doc.motive = "03".into();
        doc.plate = "??".into();
        let result = doc.validate(&context());
        let business: Vec<_> = result.of_kind(ViolationKind::BusinessRule).collect();
        assert_eq!(business.len(), 1);
        assert_eq!(business[0].code, "MOTIVE_REQUIRES_REFERENCE");
        assert_eq!(business[0].path, "reference_document");
        assert!(result.has_code("PLATE_FORMAT"));
    }

    #[test]
    fn return_satisfied_by_every_recipient_reference() {
        let mut doc = shipment_guide();
        doc.motive = "03".into();
        doc.recipients[0].reference_document = Some(DocumentReference {
            document_code: "01".into(),
            number: "001-001-000000042".into(),
            authorization: None,
            issue_date: date(2026, 1, 2),
        });
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn transport_start_window() {
        let mut doc = shipment_guide();
        doc.transport_start = date(2026, 1, 14);
        assert!(doc.validate(&context()).has_code("TRANSPORT_START_WINDOW"));

        doc.transport_start = date(2026, 1, 20);
        doc.transport_end = date(2026, 1, 21);
        assert!(doc.validate(&context()).is_valid());

        doc.transport_start = date(2026, 1, 21);
        assert!(doc.validate(&context()).has_code("TRANSPORT_START_WINDOW"));
    }

    #[test]
    fn transport_start_too_far_ahead() {
        let mut doc = shipment_guide();
        doc.header.emission_date = date(2026, 3, 1);
        doc.transport_start = date(2026, 3, 1);
        doc.transport_end = date(2026, 3, 2);
        let result = doc.validate(&context());
        let codes: Vec<_> = result.violations().iter().map(|v| v.code).collect();
        assert_eq!(codes, ["TRANSPORT_TOO_FAR_AHEAD"]);
    }

    #[test]
    fn transport_end_before_start() {
        let mut doc = shipment_guide();
        doc.transport_end = date(2026, 1, 14);
        assert!(doc.validate(&context()).has_code("TRANSPORT_END_BEFORE_START"));
    }

    #[test]
    fn recipient_and_item_caps() {
        let mut doc = shipment_guide();
        let recipient = doc.recipients[0].clone();
        doc.recipients = vec![recipient; 11];
        assert!(doc.validate(&context()).has_code("TOO_MANY_RECIPIENTS"));

        let mut doc = shipment_guide();
        let item = doc.recipients[0].items[0].clone();
        doc.recipients[0].items = vec![item; 101];
        let result = doc.validate(&context());
        assert_eq!(result.violations()[0].code, "TOO_MANY_ITEMS");
        assert_eq!(result.violations()[0].path, "recipients[0].items");

        doc.recipients.clear();
        assert!(doc.validate(&context()).has_code("RECIPIENTS_REQUIRED"));
    }

    #[test]
    fn customs_required_per_recipient() {
        let mut doc = shipment_guide();
        doc.recipients[0].motive = Some("09".into());
        let result = doc.validate(&context());
        let v = &result.violations()[0];
        assert_eq!(v.code, "MOTIVE_REQUIRES_CUSTOMS_DOCUMENT");
        assert_eq!(v.path, "recipients[0].customs_document");

        doc.recipients[0].customs_document = Some("028-2026-10-00012345".into());
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn itinerant_and_other_motives() {
        let mut doc = shipment_guide();
        doc.motive = "06".into();
        assert!(doc.validate(&context()).has_code("MOTIVE_REQUIRES_ROUTE"));
        doc.route = Some("Quito - Ambato - Riobamba".into());
        assert!(doc.validate(&context()).is_valid());

        doc.motive = "10".into();
        assert!(doc.validate(&context()).has_code("MOTIVE_REQUIRES_OBSERVATION"));
        doc.observation = Some("Muestras para feria".into());
        assert!(doc.validate(&context()).is_valid());
    }

    #[test]
    fn carrier_and_item_details() {
        let mut doc = shipment_guide();
        doc.carrier.legal_name = "AB".into();
        doc.origin_address = "Quito".into();
        doc.recipients[0].items[0].quantity = Some(dec!(0.5));
        let result = doc.validate(&context());
        let codes: Vec<_> = result.violations().iter().map(|v| (v.code, v.path.as_str())).collect();
        assert_eq!(
            codes,
            [
                ("TEXT_TOO_SHORT", "origin_address"),
                ("TEXT_TOO_SHORT", "carrier.legal_name"),
                ("QUANTITY_TOO_SMALL", "recipients[0].items[0].quantity"),
            ]
        );
    }

    #[test]
    fn unknown_motive_skips_motive_rules() {
        let mut doc = shipment_guide();
        doc.motive = "42".into();
        let result = doc.validate(&context());
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].code, "UNKNOWN_CODE");
    }

    #[test]
    fn plate_shapes() {
        assert!(is_plate("PBA-1234"));
        assert!(is_plate("pba123"));
        assert!(is_plate("GYE-123"));
        assert!(!is_plate("PB-1234"));
        assert!(!is_plate("PBA-12345"));
        assert!(!is_plate("PBA_123"));
    }

    #[test]
    fn extreme_day_windows_saturate() {
        let doc = shipment_guide();
        let mut ctx = context();
        ctx.policy.shipment_max_future_days = 1_000_000_000_000;
        ctx.policy.shipment_max_lead_days = i64::MAX;
        let result = doc.validate(&ctx);
        assert!(result.is_valid(), "{:?}", result.violations());

        ctx.policy.shipment_max_future_days = i64::MIN;
        assert!(doc.validate(&ctx).has_code("TRANSPORT_TOO_FAR_AHEAD"));
    }

    #[test]
    fn emission_at_the_calendar_edge() {
        let mut doc = shipment_guide();
        doc.header.emission_date = Some(NaiveDate::MAX);
        doc.transport_start = Some(NaiveDate::MAX);
        doc.transport_end = Some(NaiveDate::MAX);
        let result = doc.validate(&context());
        let codes: Vec<_> = result.of_kind(ViolationKind::Range).map(|v| v.code).collect();
        assert_eq!(codes, ["EMISSION_DATE_OUT_OF_RANGE", "TRANSPORT_TOO_FAR_AHEAD"]);
    }
}
