//! # Document Serializer
//!
//! Maps a [`ValidatedDocument`] to a [`Node`] tree in the authority's field
//! order: the tax block (`infoTributaria`), the type's info block, the
//! repeating line or party blocks, then the optional additional-information
//! block. The tree is a plain hierarchy, not a markup syntax; an external
//! writer turns it into the wire format.
//!
//! ## Formatting
//!
//! Money renders with exactly two fractional digits, unit prices with six,
//! rates and quantities as plain numbers (see [`sri_core::money`]). Dates
//! inside bodies are `DD/MM/YYYY`. Catalog codes pass through as the
//! validator accepted them; the serializer does not re-check membership.
//!
//! ## Completeness
//!
//! After rendering, every mandatory path of the root is looked up. A gap is a
//! [`RenderError::Incomplete`], so a tree is never handed out partially.

use serde::Serialize;

use sri_core::money::{format_amount, format_quantity, format_rate, format_unit_price};
use sri_core::{AccessKey, DocumentType, FINAL_CONSUMER_ID};

use crate::document::{Document, ValidatedDocument};
use crate::error::RenderError;
use crate::model::{AdditionalField, Counterparty, Header, Issuer, LineItem, Payment, TaxLine};
use crate::summary::AtsTotals;

/// Currency printed in invoices and credit notes.
pub const CURRENCY: &str = "DOLAR";

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// An element of the rendered document: a leaf with a value, or a branch
/// with ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Node {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(&'static str, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn leaf(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn push_leaf(&mut self, name: &'static str, value: impl Into<String>) {
        self.children.push(Self::leaf(name, value));
    }

    /// Push a leaf only when the value is present and not blank.
    pub fn push_opt<V: Into<String>>(&mut self, name: &'static str, value: Option<V>) {
        if let Some(value) = value {
            let value = value.into();
            if !value.trim().is_empty() {
                self.push_leaf(name, value.trim());
            }
        }
    }

    /// First direct child named `name`.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a slash-separated path of first matches: `infoFactura/importeTotal`.
    pub fn find_path(&self, path: &str) -> Option<&Node> {
        path.split('/').try_fold(self, |node, name| node.find(name))
    }

    /// Value of the leaf at `path`.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.find_path(path)?.value.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Visit this node and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A rendered document and the name it is filed under: the access key for
/// per-transaction documents, `{ruc}AT{YYYY}{MM}` for the monthly summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub name: String,
    pub root: Node,
    /// Aggregate figures of a monthly summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<AtsTotals>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a validated document.
///
/// Keyed documents need the access key generated for them; the monthly
/// summary takes none.
///
/// # Errors
///
/// [`RenderError`] when the key is missing or belongs to another document,
/// or when a mandatory field would be absent from the output.
pub fn render(doc: &ValidatedDocument, key: Option<&AccessKey>) -> Result<Rendered, RenderError> {
    let document = doc.document();
    let Some(document_type) = document.document_type() else {
        if key.is_some() {
            return Err(RenderError::UnexpectedAccessKey);
        }
        let Document::TransactionalSummary(summary) = document else {
            return Err(RenderError::Unresolved);
        };
        let rendered = Rendered {
            name: summary.file_name(),
            root: summary.render_tree(),
            totals: summary.totals(),
        };
        check_complete(&rendered.root)?;
        tracing::debug!(name = %rendered.name, "summary rendered");
        return Ok(rendered);
    };

    let key = key.ok_or(RenderError::MissingAccessKey { document_type })?;
    let header = document.header().ok_or(RenderError::Unresolved)?;
    check_key_matches(key, document_type, header)?;
    let resolved = header.resolve().ok_or(RenderError::Unresolved)?;

    let mut root = Node::new(document_type.root_name())
        .attr("id", "comprobante")
        .attr("version", document_type.schema_version());
    root.push(tax_info(header, key, document_type));

    let date = resolved.emission_date;
    let additional = match document {
        Document::Invoice(d) => {
            d.render_body(date, &mut root);
            &d.additional
        }
        Document::Withholding(d) => {
            d.render_body(date, &mut root);
            &d.additional
        }
        Document::ShipmentGuide(d) => {
            d.render_body(&mut root);
            &d.additional
        }
        Document::CreditNote(d) => {
            d.render_body(date, &mut root);
            &d.additional
        }
        Document::DebitNote(d) => {
            d.render_body(date, &mut root);
            &d.additional
        }
        Document::TransactionalSummary(_) => return Err(RenderError::Unresolved),
    };
    if let Some(info) = additional_info(additional) {
        root.push(info);
    }

    check_complete(&root)?;
    tracing::debug!(%document_type, "document rendered");
    Ok(Rendered {
        name: key.as_str().to_string(),
        root,
        totals: None,
    })
}

fn check_key_matches(
    key: &AccessKey,
    document_type: DocumentType,
    header: &Header,
) -> Result<(), RenderError> {
    let mismatch = |field| Err(RenderError::KeyMismatch { field });
    if key.document_type() != Some(document_type) {
        return mismatch("document_type");
    }
    if key.issuer() != header.issuer.ruc.trim() {
        return mismatch("issuer");
    }
    if key.environment() != Some(header.environment) {
        return mismatch("environment");
    }
    if key.establishment() != header.establishment || key.emission_point() != header.emission_point {
        return mismatch("series");
    }
    if header.emission_date != key.emission_date() {
        return mismatch("emission_date");
    }
    let sequential = header.sequential.map(|s| format!("{s:09}"));
    if sequential.as_deref() != Some(key.sequential()) {
        return mismatch("sequential");
    }
    Ok(())
}

fn tax_info(header: &Header, key: &AccessKey, document_type: DocumentType) -> Node {
    let issuer = &header.issuer;
    let mut info = Node::new("infoTributaria");
    info.push_leaf("ambiente", header.environment.code());
    info.push_leaf("tipoEmision", header.emission_type.code());
    info.push_leaf("razonSocial", issuer.legal_name.trim());
    info.push_opt("nombreComercial", issuer.trade_name.as_deref());
    info.push_leaf("ruc", issuer.ruc.trim());
    info.push_leaf("claveAcceso", key.as_str());
    info.push_leaf("codDoc", document_type.code());
    info.push_leaf("estab", key.establishment());
    info.push_leaf("ptoEmi", key.emission_point());
    info.push_leaf("secuencial", key.sequential());
    info.push_leaf("dirMatriz", issuer.main_address.trim());
    info
}

fn additional_info(fields: &[AdditionalField]) -> Option<Node> {
    let fields: Vec<_> = fields
        .iter()
        .filter(|f| !f.name.trim().is_empty() && !f.value.trim().is_empty())
        .collect();
    if fields.is_empty() {
        return None;
    }
    let mut info = Node::new("infoAdicional");
    for field in fields {
        info.push(Node::leaf("campoAdicional", field.value.trim()).attr("nombre", field.name.trim()));
    }
    Some(info)
}

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

const TAX_INFO_REQUIRED: &[&str] = &[
    "infoTributaria/ambiente",
    "infoTributaria/tipoEmision",
    "infoTributaria/razonSocial",
    "infoTributaria/ruc",
    "infoTributaria/claveAcceso",
    "infoTributaria/codDoc",
    "infoTributaria/estab",
    "infoTributaria/ptoEmi",
    "infoTributaria/secuencial",
    "infoTributaria/dirMatriz",
];

/// Mandatory paths below the root, per root element.
pub fn required_paths(root: &str) -> &'static [&'static str] {
    match root {
        "factura" => &[
            "infoFactura/fechaEmision",
            "infoFactura/obligadoContabilidad",
            "infoFactura/tipoIdentificacionComprador",
            "infoFactura/razonSocialComprador",
            "infoFactura/identificacionComprador",
            "infoFactura/totalSinImpuestos",
            "infoFactura/totalDescuento",
            "infoFactura/totalConImpuestos",
            "infoFactura/importeTotal",
            "infoFactura/pagos/pago/formaPago",
            "detalles/detalle/descripcion",
        ],
        "comprobanteRetencion" => &[
            "infoCompRetencion/fechaEmision",
            "infoCompRetencion/tipoIdentificacionSujetoRetenido",
            "infoCompRetencion/razonSocialSujetoRetenido",
            "infoCompRetencion/identificacionSujetoRetenido",
            "infoCompRetencion/periodoFiscal",
            "docsSustento/docSustento/codSustento",
            "docsSustento/docSustento/numDocSustento",
            "docsSustento/docSustento/fechaEmisionDocSustento",
            "docsSustento/docSustento/importeTotal",
            "docsSustento/docSustento/retenciones/retencion/valorRetenido",
        ],
        "guiaRemision" => &[
            "infoGuiaRemision/dirPartida",
            "infoGuiaRemision/razonSocialTransportista",
            "infoGuiaRemision/tipoIdentificacionTransportista",
            "infoGuiaRemision/rucTransportista",
            "infoGuiaRemision/fechaIniTransporte",
            "infoGuiaRemision/fechaFinTransporte",
            "infoGuiaRemision/placa",
            "destinatarios/destinatario/identificacionDestinatario",
            "destinatarios/destinatario/dirDestinatario",
            "destinatarios/destinatario/motivoTraslado",
            "destinatarios/destinatario/detalles/detalle/cantidad",
        ],
        "notaCredito" => &[
            "infoNotaCredito/fechaEmision",
            "infoNotaCredito/tipoIdentificacionComprador",
            "infoNotaCredito/razonSocialComprador",
            "infoNotaCredito/identificacionComprador",
            "infoNotaCredito/codDocModificado",
            "infoNotaCredito/numDocModificado",
            "infoNotaCredito/fechaEmisionDocSustento",
            "infoNotaCredito/totalSinImpuestos",
            "infoNotaCredito/valorModificacion",
            "infoNotaCredito/motivo",
        ],
        "notaDebito" => &[
            "infoNotaDebito/fechaEmision",
            "infoNotaDebito/tipoIdentificacionComprador",
            "infoNotaDebito/razonSocialComprador",
            "infoNotaDebito/identificacionComprador",
            "infoNotaDebito/codDocModificado",
            "infoNotaDebito/numDocModificado",
            "infoNotaDebito/fechaEmisionDocSustento",
            "infoNotaDebito/totalSinImpuestos",
            "infoNotaDebito/valorTotal",
            "motivos/motivo/razon",
        ],
        "iva" => &[
            "TipoIDInformante",
            "IdInformante",
            "razonSocial",
            "Anio",
            "Mes",
            "numEstabRuc",
            "totalVentas",
            "codigoOperativo",
        ],
        _ => &[],
    }
}

fn check_complete(root: &Node) -> Result<(), RenderError> {
    let keyed = root.name != "iva";
    let common: &[&'static str] = if keyed { TAX_INFO_REQUIRED } else { &[] };
    for &path in common.iter().chain(required_paths(root.name)) {
        let present = root
            .find_path(path)
            .is_some_and(|node| node.value.as_deref().map_or(true, |v| !v.trim().is_empty()));
        if !present {
            return Err(RenderError::Incomplete {
                root: root.name,
                path,
            });
        }
    }
    Ok(())
}

/// Element names that carry money and must render with two decimals.
pub const MONEY_FIELDS: &[&str] = &[
    "totalSinImpuestos",
    "totalDescuento",
    "descuento",
    "precioTotalSinImpuesto",
    "baseImponible",
    "valor",
    "propina",
    "importeTotal",
    "total",
    "valorModificacion",
    "valorTotal",
    "totalImpuestos",
    "valorImpuesto",
    "valorRetenido",
    "totalVentas",
    "baseNoGraIva",
    "baseImpGrav",
    "baseImpExe",
    "montoIva",
    "valorRetIva",
    "valorRetRenta",
    "ventasEstab",
    "ivaComp",
    "montoIce",
    "valorRetBienes",
    "valorRetServicios",
    "baseImpAir",
    "valRetAir",
];

// ---------------------------------------------------------------------------
// Shared blocks
// ---------------------------------------------------------------------------

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "SI"
    } else {
        "NO"
    }
}

/// Identification-type code of a validated counterparty.
pub(crate) fn id_type_code(party: &Counterparty) -> &'static str {
    party.resolved_id_type().map_or("", |t| t.code())
}

/// Counterparty identifier, the final-consumer placeholder when blank.
pub(crate) fn identification(party: &Counterparty) -> String {
    let id = party.identification.trim();
    if id.is_empty() {
        FINAL_CONSUMER_ID.to_string()
    } else {
        id.to_string()
    }
}

/// Establishment address, special-taxpayer number and accounting flag.
pub(crate) fn push_issuer_info(node: &mut Node, issuer: &Issuer) {
    node.push_leaf("dirEstablecimiento", issuer.branch_address().trim());
    node.push_opt("contribuyenteEspecial", issuer.special_taxpayer.as_deref());
    node.push_leaf("obligadoContabilidad", yes_no(issuer.keeps_accounts));
}

pub(crate) fn payments_node(payments: &[Payment]) -> Node {
    let mut node = Node::new("pagos");
    for payment in payments {
        let mut pago = Node::new("pago");
        pago.push_leaf("formaPago", payment.method.trim());
        pago.push_leaf("total", format_amount(payment.total.unwrap_or_default()));
        pago.push_opt("plazo", payment.term.map(|t| t.to_string()));
        pago.push_opt("unidadTiempo", payment.time_unit.as_deref());
        node.push(pago);
    }
    node
}

/// Grouped tax totals of an invoice or credit note.
pub(crate) fn tax_totals_node(totals: &[TaxLine]) -> Node {
    let mut node = Node::new("totalConImpuestos");
    for tax in totals {
        node.push(
            Node::new("totalImpuesto")
                .child(Node::leaf("codigo", tax.code.trim()))
                .child(Node::leaf("codigoPorcentaje", tax.percentage_code.trim()))
                .child(Node::leaf("baseImponible", format_amount(tax.base.unwrap_or_default())))
                .child(Node::leaf("valor", format_amount(tax.value.unwrap_or_default()))),
        );
    }
    node
}

pub(crate) fn item_details_node(details: &[AdditionalField]) -> Node {
    let mut node = Node::new("detallesAdicionales");
    for detail in details {
        node.push(
            Node::new("detAdicional")
                .attr("nombre", detail.name.trim())
                .attr("valor", detail.value.trim()),
        );
    }
    node
}

/// Element names of a line's main and auxiliary codes.
pub(crate) type ItemCodes = (&'static str, &'static str);

pub(crate) const INVOICE_ITEM_CODES: ItemCodes = ("codigoPrincipal", "codigoAuxiliar");
pub(crate) const NOTE_ITEM_CODES: ItemCodes = ("codigoInterno", "codigoAdicional");

pub(crate) fn line_item_node(item: &LineItem, codes: ItemCodes) -> Node {
    let mut node = Node::new("detalle");
    node.push_leaf(codes.0, item.main_code.trim());
    node.push_opt(codes.1, item.aux_code.as_deref());
    node.push_leaf("descripcion", item.description.trim());
    node.push_leaf("cantidad", format_quantity(item.quantity.unwrap_or_default()));
    node.push_leaf("precioUnitario", format_unit_price(item.unit_price.unwrap_or_default()));
    node.push_leaf("descuento", format_amount(item.discount.unwrap_or_default()));
    node.push_leaf(
        "precioTotalSinImpuesto",
        format_amount(item.total_without_tax.unwrap_or_default()),
    );
    if !item.details.is_empty() {
        node.push(item_details_node(&item.details));
    }
    let mut taxes = Node::new("impuestos");
    for tax in &item.taxes {
        taxes.push(
            Node::new("impuesto")
                .child(Node::leaf("codigo", tax.code.trim()))
                .child(Node::leaf("codigoPorcentaje", tax.percentage_code.trim()))
                .child(Node::leaf("tarifa", format_rate(tax.rate.unwrap_or_default())))
                .child(Node::leaf("baseImponible", format_amount(tax.base.unwrap_or_default())))
                .child(Node::leaf("valor", format_amount(tax.value.unwrap_or_default()))),
        );
    }
    node.push(taxes);
    node
}
