//! # Reference Catalogs
//!
//! Code tables published by the tax authority. Validators check membership
//! here; the serializer passes codes through unchanged.

use rust_decimal::Decimal;
use serde::Serialize;
use sri_core::IdentificationType;

// ---------------------------------------------------------------------------
// Transport motives (shipment guides)
// ---------------------------------------------------------------------------

/// A motive-of-transport code and the extra data it makes mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransportMotive {
    pub code: &'static str,
    pub description: &'static str,
    /// A reference to the originating document must be given.
    pub requires_reference: bool,
    /// A route description must be given.
    pub requires_route: bool,
    /// Every recipient must carry a customs document number.
    pub requires_customs: bool,
    /// A free-text observation must justify the movement.
    pub requires_observation: bool,
    pub affects_inventory: bool,
}

const fn motive(code: &'static str, description: &'static str, affects_inventory: bool) -> TransportMotive {
    TransportMotive {
        code,
        description,
        requires_reference: false,
        requires_route: false,
        requires_customs: false,
        requires_observation: false,
        affects_inventory,
    }
}

pub const TRANSPORT_MOTIVES: &[TransportMotive] = &[
    motive("01", "Venta", true),
    motive("02", "Compra", true),
    TransportMotive {
        requires_reference: true,
        ..motive("03", "Devolución", true)
    },
    motive("04", "Consignación", false),
    motive("05", "Traslado entre establecimientos de la misma empresa", true),
    TransportMotive {
        requires_route: true,
        ..motive("06", "Traslado por emisor itinerante de comprobantes de venta", false)
    },
    motive("07", "Traslado para transformación", true),
    TransportMotive {
        requires_customs: true,
        ..motive("08", "Importación", true)
    },
    TransportMotive {
        requires_customs: true,
        ..motive("09", "Exportación", true)
    },
    TransportMotive {
        requires_observation: true,
        ..motive("10", "Otros", false)
    },
];

pub fn transport_motive(code: &str) -> Option<&'static TransportMotive> {
    TRANSPORT_MOTIVES.iter().find(|m| m.code == code)
}

// ---------------------------------------------------------------------------
// Credit and debit notes
// ---------------------------------------------------------------------------

/// Which kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Credit,
    Debit,
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => f.write_str("credit note"),
            Self::Debit => f.write_str("debit note"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteMotive {
    pub code: &'static str,
    pub description: &'static str,
    /// Line items are mandatory for this motive.
    pub requires_detail: bool,
}

pub const CREDIT_NOTE_MOTIVES: &[NoteMotive] = &[
    NoteMotive { code: "1", description: "Devolución de mercadería", requires_detail: true },
    NoteMotive { code: "2", description: "Descuento otorgado", requires_detail: true },
    NoteMotive { code: "3", description: "Anulación de factura", requires_detail: false },
    NoteMotive { code: "4", description: "Rebaja o devolución parcial", requires_detail: true },
    NoteMotive { code: "5", description: "Error en precio", requires_detail: true },
    NoteMotive { code: "6", description: "Error en cantidad", requires_detail: true },
    NoteMotive { code: "7", description: "Productos defectuosos", requires_detail: true },
    NoteMotive { code: "8", description: "Bonificación", requires_detail: true },
    NoteMotive { code: "9", description: "Otros", requires_detail: true },
];

pub const DEBIT_NOTE_MOTIVES: &[NoteMotive] = &[
    NoteMotive { code: "1", description: "Intereses por mora", requires_detail: true },
    NoteMotive { code: "2", description: "Gastos de cobranza", requires_detail: true },
    NoteMotive { code: "3", description: "Error en factura (precio menor)", requires_detail: true },
    NoteMotive { code: "4", description: "Error en cantidad (menor)", requires_detail: true },
    NoteMotive { code: "5", description: "Gastos de transporte no incluidos", requires_detail: true },
    NoteMotive { code: "6", description: "Gastos adicionales", requires_detail: true },
    NoteMotive { code: "7", description: "Recargo por servicios adicionales", requires_detail: true },
    NoteMotive { code: "8", description: "Ajuste de precio por tipo de cambio", requires_detail: true },
    NoteMotive { code: "9", description: "Otros", requires_detail: true },
];

pub fn note_motive(kind: NoteKind, code: &str) -> Option<&'static NoteMotive> {
    let table = match kind {
        NoteKind::Credit => CREDIT_NOTE_MOTIVES,
        NoteKind::Debit => DEBIT_NOTE_MOTIVES,
    };
    table.iter().find(|m| m.code == code)
}

/// A document type a note may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModifiableDocument {
    pub code: &'static str,
    pub description: &'static str,
    pub allows_credit: bool,
    pub allows_debit: bool,
}

impl ModifiableDocument {
    pub fn allows(&self, kind: NoteKind) -> bool {
        match kind {
            NoteKind::Credit => self.allows_credit,
            NoteKind::Debit => self.allows_debit,
        }
    }
}

/// Notes can modify invoices, purchase settlements and reimbursement
/// vouchers; never other notes.
pub const MODIFIABLE_DOCUMENTS: &[ModifiableDocument] = &[
    ModifiableDocument { code: "01", description: "Factura", allows_credit: true, allows_debit: true },
    ModifiableDocument {
        code: "03",
        description: "Liquidación de compra de bienes y prestación de servicios",
        allows_credit: true,
        allows_debit: true,
    },
    ModifiableDocument { code: "04", description: "Nota de crédito", allows_credit: false, allows_debit: false },
    ModifiableDocument { code: "05", description: "Nota de débito", allows_credit: false, allows_debit: false },
    ModifiableDocument {
        code: "41",
        description: "Comprobante de venta emitido por reembolso",
        allows_credit: true,
        allows_debit: true,
    },
];

pub fn modifiable_document(code: &str) -> Option<&'static ModifiableDocument> {
    MODIFIABLE_DOCUMENTS.iter().find(|d| d.code == code)
}

// ---------------------------------------------------------------------------
// Withholding
// ---------------------------------------------------------------------------

/// Tax a withholding line retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WithheldTax {
    /// Code `1`.
    Income,
    /// Code `2`.
    Vat,
    /// Code `6`, currency outflow tax.
    Isd,
}

impl WithheldTax {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Income => "1",
            Self::Vat => "2",
            Self::Isd => "6",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Income),
            "2" => Some(Self::Vat),
            "6" => Some(Self::Isd),
            _ => None,
        }
    }

    fn table(&self) -> &'static [WithholdingCode] {
        match self {
            Self::Income => INCOME_WITHHOLDING_CODES,
            Self::Vat => VAT_WITHHOLDING_CODES,
            Self::Isd => ISD_WITHHOLDING_CODES,
        }
    }
}

/// A withholding code and its standard percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithholdingCode {
    pub code: &'static str,
    pub percent: u32,
}

impl WithholdingCode {
    pub fn rate(&self) -> Decimal {
        Decimal::from(self.percent)
    }
}

const fn wc(code: &'static str, percent: u32) -> WithholdingCode {
    WithholdingCode { code, percent }
}

pub const INCOME_WITHHOLDING_CODES: &[WithholdingCode] = &[
    wc("303", 10),
    wc("304", 8),
    wc("307", 2),
    wc("308", 10),
    wc("309", 1),
    wc("310", 1),
    wc("311", 1),
    wc("312", 1),
    wc("319", 2),
    wc("320", 8),
    wc("322", 1),
    wc("323", 8),
    wc("325", 1),
    wc("327", 2),
    wc("328", 2),
    wc("331", 15),
    wc("332", 2),
    wc("340", 1),
    wc("341", 8),
    wc("342", 8),
    wc("343", 8),
    wc("344", 8),
    wc("345", 25),
    wc("346", 0),
    wc("348", 0),
    wc("350", 0),
    wc("351", 0),
    wc("403", 1),
];

/// VAT withholding: goods 721..729, services 731..739, professional fees
/// 741..749, leasing 751..753. The percentage applies to the VAT amount.
pub const VAT_WITHHOLDING_CODES: &[WithholdingCode] = &[
    wc("721", 10),
    wc("722", 20),
    wc("723", 30),
    wc("725", 50),
    wc("727", 70),
    wc("729", 100),
    wc("731", 10),
    wc("732", 20),
    wc("733", 30),
    wc("735", 50),
    wc("737", 70),
    wc("739", 100),
    wc("741", 10),
    wc("742", 20),
    wc("743", 30),
    wc("745", 50),
    wc("747", 70),
    wc("749", 100),
    wc("751", 10),
    wc("752", 20),
    wc("753", 30),
];

pub const ISD_WITHHOLDING_CODES: &[WithholdingCode] = &[wc("4580", 5)];

pub fn withholding_code(tax: WithheldTax, code: &str) -> Option<&'static WithholdingCode> {
    tax.table().iter().find(|c| c.code == code)
}

/// The tax whose table lists `code`, if any.
pub fn tax_of_withholding_code(code: &str) -> Option<WithheldTax> {
    [WithheldTax::Income, WithheldTax::Vat, WithheldTax::Isd]
        .into_iter()
        .find(|t| withholding_code(*t, code).is_some())
}

// ---------------------------------------------------------------------------
// Taxes on lines and totals
// ---------------------------------------------------------------------------

pub const TAX_VAT: &str = "2";
pub const TAX_ICE: &str = "3";
pub const TAX_IRBPNR: &str = "5";

pub fn is_tax_code(code: &str) -> bool {
    matches!(code, TAX_VAT | TAX_ICE | TAX_IRBPNR)
}

/// VAT percentage code and its fixed rate, when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VatRate {
    pub code: &'static str,
    pub percent: Option<u32>,
}

pub const VAT_RATES: &[VatRate] = &[
    VatRate { code: "0", percent: Some(0) },
    VatRate { code: "2", percent: Some(12) },
    VatRate { code: "3", percent: Some(14) },
    VatRate { code: "4", percent: Some(15) },
    VatRate { code: "5", percent: Some(5) },
    VatRate { code: "6", percent: Some(0) },
    VatRate { code: "7", percent: Some(0) },
    VatRate { code: "8", percent: None },
    VatRate { code: "10", percent: Some(13) },
];

pub fn vat_rate(code: &str) -> Option<&'static VatRate> {
    VAT_RATES.iter().find(|r| r.code == code)
}

// ---------------------------------------------------------------------------
// Payment methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub code: &'static str,
    pub description: &'static str,
}

pub const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod { code: "01", description: "Sin utilización del sistema financiero" },
    PaymentMethod { code: "15", description: "Compensación de deudas" },
    PaymentMethod { code: "16", description: "Tarjeta de débito" },
    PaymentMethod { code: "17", description: "Dinero electrónico" },
    PaymentMethod { code: "18", description: "Tarjeta prepago" },
    PaymentMethod { code: "19", description: "Tarjeta de crédito" },
    PaymentMethod { code: "20", description: "Otros con utilización del sistema financiero" },
    PaymentMethod { code: "21", description: "Endoso de títulos" },
];

pub fn payment_method(code: &str) -> Option<&'static PaymentMethod> {
    PAYMENT_METHODS.iter().find(|m| m.code == code)
}

// ---------------------------------------------------------------------------
// Transactional summary identification types
// ---------------------------------------------------------------------------

/// Supplier identification codes in the monthly summary's purchases, which
/// use their own numbering: `01` RUC, `02` cédula, `03` passport.
pub fn supplier_id_type(code: &str) -> Option<IdentificationType> {
    match code {
        "01" => Some(IdentificationType::Ruc),
        "02" => Some(IdentificationType::Cedula),
        "03" => Some(IdentificationType::Passport),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_motive_flags() {
        assert!(transport_motive("03").unwrap().requires_reference);
        assert!(transport_motive("06").unwrap().requires_route);
        assert!(transport_motive("08").unwrap().requires_customs);
        assert!(transport_motive("09").unwrap().requires_customs);
        assert!(transport_motive("10").unwrap().requires_observation);
        let venta = transport_motive("01").unwrap();
        assert!(!venta.requires_reference && !venta.requires_route);
        assert!(transport_motive("11").is_none());
        assert_eq!(TRANSPORT_MOTIVES.len(), 10);
    }

    #[test]
    fn annulment_does_not_require_detail() {
        assert!(!note_motive(NoteKind::Credit, "3").unwrap().requires_detail);
        assert!(note_motive(NoteKind::Credit, "1").unwrap().requires_detail);
        assert!(note_motive(NoteKind::Debit, "3").unwrap().requires_detail);
        assert!(note_motive(NoteKind::Debit, "10").is_none());
    }

    #[test]
    fn notes_on_notes_are_rejected() {
        assert!(modifiable_document("01").unwrap().allows(NoteKind::Credit));
        assert!(modifiable_document("41").unwrap().allows(NoteKind::Debit));
        assert!(!modifiable_document("04").unwrap().allows(NoteKind::Credit));
        assert!(!modifiable_document("05").unwrap().allows(NoteKind::Debit));
        assert!(modifiable_document("07").is_none());
    }

    #[test]
    fn withholding_codes_by_tax() {
        assert_eq!(withholding_code(WithheldTax::Income, "303").unwrap().percent, 10);
        assert_eq!(withholding_code(WithheldTax::Vat, "729").unwrap().percent, 100);
        assert_eq!(withholding_code(WithheldTax::Isd, "4580").unwrap().rate(), Decimal::from(5));
        assert!(withholding_code(WithheldTax::Income, "725").is_none());
        assert_eq!(tax_of_withholding_code("725"), Some(WithheldTax::Vat));
        assert_eq!(tax_of_withholding_code("999"), None);
        assert_eq!(WithheldTax::from_code("2"), Some(WithheldTax::Vat));
        assert_eq!(WithheldTax::from_code("3"), None);
    }

    #[test]
    fn payment_and_vat_tables() {
        assert!(payment_method("20").is_some());
        assert!(payment_method("02").is_none());
        assert_eq!(vat_rate("2").unwrap().percent, Some(12));
        assert_eq!(vat_rate("8").unwrap().percent, None);
        assert!(vat_rate("1").is_none());
        assert!(is_tax_code("2") && is_tax_code("3") && is_tax_code("5"));
        assert!(!is_tax_code("1"));
    }

    #[test]
    fn supplier_identification_codes() {
        assert_eq!(supplier_id_type("01"), Some(IdentificationType::Ruc));
        assert_eq!(supplier_id_type("03"), Some(IdentificationType::Passport));
        assert_eq!(supplier_id_type("04"), None);
    }
}
