//! Known-good documents shared by the unit tests. Every fixture validates
//! cleanly against [`context`]; tests mutate one field at a time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sri_core::{AccessKey, EmissionType, Environment, NumericFill};

use crate::document::Document;
use crate::invoice::Invoice;
use crate::model::{Counterparty, Header, Issuer, LineItem, Payment, TaxLine};
use crate::notes::{CreditNote, DebitNote, DebitReason, ModifiedDocument};
use crate::rules::RuleContext;
use crate::shipment::{Recipient, ShipmentGuide, ShipmentItem};
use crate::summary::{
    EstablishmentSale, IncomeWithholding, Informant, Purchase, Sale, TransactionalSummary,
    VoidedRange,
};
use crate::withholding::{SupportDocument, Withholding, WithholdingLine};

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

pub(crate) fn context() -> RuleContext {
    RuleContext::with_today(today())
}

pub(crate) fn header() -> Header {
    Header {
        environment: Environment::Test,
        emission_type: EmissionType::Normal,
        issuer: Issuer {
            ruc: "1790016919001".into(),
            legal_name: "ACME S.A.".into(),
            trade_name: None,
            main_address: "Av. Amazonas N34-45, Quito".into(),
            establishment_address: None,
            special_taxpayer: None,
            keeps_accounts: true,
        },
        establishment: "001".into(),
        emission_point: "001".into(),
        sequential: Some(1),
        emission_date: Some(today()),
    }
}

fn vat(percentage_code: &str, rate: Decimal, base: Decimal, value: Decimal) -> TaxLine {
    TaxLine {
        code: "2".into(),
        percentage_code: percentage_code.into(),
        rate: Some(rate),
        base: Some(base),
        value: Some(value),
    }
}

fn payment(method: &str, total: Decimal) -> Payment {
    Payment {
        method: method.into(),
        total: Some(total),
        term: None,
        time_unit: None,
    }
}

fn person() -> Counterparty {
    Counterparty {
        id_type: None,
        identification: "1710034065001".into(),
        legal_name: "Juan Pérez".into(),
        ..Counterparty::default()
    }
}

fn modified_invoice() -> ModifiedDocument {
    ModifiedDocument {
        document_code: "01".into(),
        number: "001-001-000000123".into(),
        issue_date: date(2026, 1, 5),
        authorization: Some("0501202601179001691900110010010000001231234567815".into()),
        amount: Some(dec!(100)),
    }
}

pub(crate) fn invoice() -> Invoice {
    Invoice {
        header: header(),
        buyer: Counterparty {
            id_type: None,
            identification: "0926687856".into(),
            legal_name: "María Salazar".into(),
            address: Some("Guayaquil, Urdesa Central".into()),
            email: None,
        },
        items: vec![
            LineItem {
                main_code: "P-001".into(),
                description: "Tornillos de acero".into(),
                quantity: Some(dec!(10)),
                unit_price: Some(dec!(8.50)),
                discount: Some(dec!(0)),
                total_without_tax: Some(dec!(85.00)),
                taxes: vec![vat("4", dec!(15), dec!(85.00), dec!(12.75))],
                ..LineItem::default()
            },
            LineItem {
                main_code: "S-002".into(),
                description: "Instalación".into(),
                quantity: Some(dec!(1)),
                unit_price: Some(dec!(15)),
                discount: Some(dec!(0)),
                total_without_tax: Some(dec!(15.00)),
                taxes: vec![vat("0", dec!(0), dec!(15.00), dec!(0))],
                ..LineItem::default()
            },
        ],
        payments: vec![payment("20", dec!(112.75))],
        tip: Some(dec!(0)),
        total: Some(dec!(112.75)),
        additional: Vec::new(),
    }
}

pub(crate) fn withholding() -> Withholding {
    Withholding {
        header: header(),
        subject: person(),
        related_party: false,
        supports: vec![SupportDocument {
            support_code: "01".into(),
            document_code: "01".into(),
            number: "001-002-000000456".into(),
            issue_date: date(2026, 1, 10),
            registration_date: None,
            authorization: None,
            payment_location: None,
            total_without_taxes: Some(dec!(100)),
            total: Some(dec!(115)),
            taxes: vec![vat("4", dec!(15), dec!(100), dec!(15))],
            withholdings: vec![
                WithholdingLine {
                    tax: "1".into(),
                    code: "303".into(),
                    base: Some(dec!(100)),
                    rate: Some(dec!(10)),
                    withheld: Some(dec!(10)),
                },
                WithholdingLine {
                    tax: "2".into(),
                    code: "723".into(),
                    base: Some(dec!(15)),
                    rate: Some(dec!(30)),
                    withheld: Some(dec!(4.50)),
                },
            ],
            payments: vec![payment("20", dec!(115))],
        }],
        additional: Vec::new(),
    }
}

pub(crate) fn shipment_guide() -> ShipmentGuide {
    ShipmentGuide {
        header: header(),
        origin_address: "Av. Amazonas N34-45, Quito".into(),
        carrier: Counterparty {
            id_type: None,
            identification: "0926687856".into(),
            legal_name: "Transportes Andinos".into(),
            ..Counterparty::default()
        },
        plate: "PBA-1234".into(),
        transport_start: date(2026, 1, 16),
        transport_end: date(2026, 1, 17),
        motive: "01".into(),
        route: None,
        observation: None,
        reference_document: None,
        recipients: vec![Recipient {
            party: Counterparty {
                id_type: None,
                identification: "1710034065001".into(),
                legal_name: "Comercial Sierra Cia. Ltda.".into(),
                address: Some("Av. 10 de Agosto y Colón, Quito".into()),
                email: None,
            },
            items: vec![ShipmentItem {
                internal_code: "P-001".into(),
                additional_code: None,
                description: "Tornillos de acero".into(),
                quantity: Some(dec!(10)),
                details: Vec::new(),
            }],
            ..Recipient::default()
        }],
        additional: Vec::new(),
    }
}

pub(crate) fn credit_note() -> CreditNote {
    CreditNote {
        header: header(),
        buyer: person(),
        modified: modified_invoice(),
        motive: "1".into(),
        reason: None,
        total_without_taxes: Some(dec!(50)),
        amount: Some(dec!(57.50)),
        items: vec![LineItem {
            main_code: "P-001".into(),
            description: "Tornillos de acero".into(),
            quantity: Some(dec!(1)),
            unit_price: Some(dec!(50)),
            discount: Some(dec!(0)),
            total_without_tax: Some(dec!(50)),
            taxes: vec![vat("4", dec!(15), dec!(50), dec!(7.50))],
            ..LineItem::default()
        }],
        additional: Vec::new(),
    }
}

pub(crate) fn debit_note() -> DebitNote {
    DebitNote {
        header: header(),
        buyer: person(),
        modified: modified_invoice(),
        motive: "1".into(),
        reasons: vec![DebitReason {
            reason: "Intereses por mora".into(),
            value: Some(dec!(10)),
        }],
        taxes: vec![vat("4", dec!(15), dec!(10), dec!(1.50))],
        payments: vec![payment("01", dec!(11.50))],
        additional: Vec::new(),
    }
}

pub(crate) fn summary() -> TransactionalSummary {
    TransactionalSummary {
        informant: Informant {
            ruc: "1790016919001".into(),
            legal_name: "ACME S.A.".into(),
        },
        year: Some(2026),
        month: Some(1),
        establishment_count: Some(1),
        purchases: vec![Purchase {
            support_code: "01".into(),
            supplier_id_type: "01".into(),
            supplier_id: "1760001550001".into(),
            voucher_type: "01".into(),
            related_party: false,
            registration_date: date(2026, 1, 20),
            establishment: "001".into(),
            emission_point: "002".into(),
            sequential: Some(456),
            emission_date: date(2026, 1, 18),
            authorization: "1234567890".into(),
            base_taxed: Some(dec!(100)),
            vat: Some(dec!(15)),
            vat_withheld_goods: Some(dec!(4.50)),
            payment_methods: vec!["20".into()],
            income_withholdings: vec![IncomeWithholding {
                code: "303".into(),
                base: Some(dec!(100)),
                rate: Some(dec!(10)),
                withheld: Some(dec!(10)),
            }],
            ..Purchase::default()
        }],
        sales: vec![Sale {
            client_id_type: Some("05".into()),
            client_id: "0926687856".into(),
            related_party: false,
            voucher_type: "18".into(),
            electronic: true,
            voucher_count: Some(3),
            base_zero: Some(dec!(15)),
            base_taxed: Some(dec!(200)),
            vat: Some(dec!(30)),
            income_withheld: Some(dec!(2.00)),
            payment_methods: vec!["01".into()],
            ..Sale::default()
        }],
        establishment_sales: vec![EstablishmentSale {
            establishment: "001".into(),
            total: Some(dec!(215)),
            vat_compensated: Some(dec!(0)),
        }],
        voided: vec![VoidedRange {
            voucher_type: "01".into(),
            establishment: "001".into(),
            emission_point: "001".into(),
            first: Some(10),
            last: Some(12),
            authorization: "1234567890".into(),
        }],
    }
}

/// A key for a keyed document, trying fills until the check digit is
/// representable.
pub(crate) fn key_for(doc: &Document) -> AccessKey {
    (1..100)
        .find_map(|n| {
            let input = doc.access_key_input(NumericFill::new(n).unwrap())?;
            AccessKey::generate(&input).ok()
        })
        .unwrap()
}
