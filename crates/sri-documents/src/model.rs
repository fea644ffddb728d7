//! # Shared Document Blocks
//!
//! Input blocks that several document types embed. Fields the authority
//! requires are still optional here (`Option`, or empty strings via
//! `#[serde(default)]`) so a missing field becomes a violation instead of a
//! deserialization error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sri_core::{
    AccessKeyInput, DocumentType, EmissionPoint, EmissionType, Environment, Establishment,
    IdentificationType, NumericFill, Ruc, Sequential,
};

/// The issuing taxpayer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issuer {
    pub ruc: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub main_address: String,
    pub establishment_address: Option<String>,
    /// Special-taxpayer resolution number, when designated.
    pub special_taxpayer: Option<String>,
    pub keeps_accounts: bool,
}

impl Issuer {
    /// Trade name, falling back to the legal name.
    pub fn display_name(&self) -> &str {
        self.trade_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.legal_name)
    }

    /// Establishment address, falling back to the main address.
    pub fn branch_address(&self) -> &str {
        self.establishment_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.main_address)
    }
}

/// Fields every keyed document carries: who issues it, from which
/// establishment and emission point, with which sequential, on which date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub environment: Environment,
    pub emission_type: EmissionType,
    pub issuer: Issuer,
    pub establishment: String,
    pub emission_point: String,
    pub sequential: Option<u64>,
    pub emission_date: Option<NaiveDate>,
}

impl Header {
    /// Typed view of the header, or `None` if any keyed field is absent or
    /// malformed.
    pub fn resolve(&self) -> Option<ResolvedHeader> {
        Some(ResolvedHeader {
            environment: self.environment,
            emission_type: self.emission_type,
            issuer: Ruc::new(self.issuer.ruc.as_str()).ok()?,
            establishment: Establishment::new(self.establishment.as_str()).ok()?,
            emission_point: EmissionPoint::new(self.emission_point.as_str()).ok()?,
            sequential: Sequential::new(self.sequential?).ok()?,
            emission_date: self.emission_date?,
        })
    }
}

/// A header whose keyed fields all passed their constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    pub environment: Environment,
    pub emission_type: EmissionType,
    pub issuer: Ruc,
    pub establishment: Establishment,
    pub emission_point: EmissionPoint,
    pub sequential: Sequential,
    pub emission_date: NaiveDate,
}

impl ResolvedHeader {
    /// Access-key input for this header.
    pub fn access_key_input(&self, document_type: DocumentType, fill: NumericFill) -> AccessKeyInput {
        AccessKeyInput {
            emission_date: self.emission_date,
            document_type,
            issuer: self.issuer.clone(),
            environment: self.environment,
            establishment: self.establishment.clone(),
            emission_point: self.emission_point.clone(),
            sequential: self.sequential,
            numeric_fill: fill,
            emission_type: self.emission_type,
        }
    }
}

/// Buyer, withholding subject, carrier or recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counterparty {
    /// Identification type code; inferred from the identifier's shape when
    /// absent.
    pub id_type: Option<String>,
    pub identification: String,
    pub legal_name: String,
    pub address: Option<String>,
    pub email: Option<String>,
}

impl Counterparty {
    /// Declared identification type, or the inferred one.
    ///
    /// # Errors
    ///
    /// Returns the declared code if it is not in the catalog.
    pub fn resolved_id_type(&self) -> Result<IdentificationType, &str> {
        match self.id_type.as_deref() {
            Some(code) => IdentificationType::from_code(code).ok_or(code),
            None => Ok(IdentificationType::infer(&self.identification)),
        }
    }
}

/// A tax applied to a line or a total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxLine {
    /// Tax code: `2` VAT, `3` ICE, `5` IRBPNR.
    pub code: String,
    pub percentage_code: String,
    pub rate: Option<Decimal>,
    pub base: Option<Decimal>,
    pub value: Option<Decimal>,
}

/// A product or service line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub main_code: String,
    pub aux_code: Option<String>,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub total_without_tax: Option<Decimal>,
    pub taxes: Vec<TaxLine>,
    pub details: Vec<AdditionalField>,
}

/// A payment instalment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    /// Payment-method code.
    pub method: String,
    pub total: Option<Decimal>,
    pub term: Option<u32>,
    pub time_unit: Option<String>,
}

/// Free-form name/value pair printed in the additional-information block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalField {
    pub name: String,
    pub value: String,
}

/// Reference to another document by type, number and authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentReference {
    pub document_code: String,
    /// `EEE-PPP-SSSSSSSSS`.
    pub number: String,
    pub authorization: Option<String>,
    pub issue_date: Option<NaiveDate>,
}

/// Sum of the present values; `None` when the sum leaves the decimal range.
pub(crate) fn checked_sum<'a>(values: impl Iterator<Item = Option<&'a Decimal>>) -> Option<Decimal> {
    values
        .flatten()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))
}

/// Sum of partial results, each of which may already have overflowed.
pub(crate) fn try_sum(values: impl IntoIterator<Item = Option<Decimal>>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value?))
}

/// Line taxes grouped by tax and percentage code, in code order. `None` when
/// a group's base or value overflows.
pub(crate) fn group_taxes(items: &[LineItem]) -> Option<Vec<TaxLine>> {
    let mut grouped: BTreeMap<(&str, &str), TaxLine> = BTreeMap::new();
    for tax in items.iter().flat_map(|item| &item.taxes) {
        let entry = grouped
            .entry((tax.code.as_str(), tax.percentage_code.as_str()))
            .or_insert_with(|| TaxLine {
                code: tax.code.clone(),
                percentage_code: tax.percentage_code.clone(),
                rate: tax.rate,
                base: Some(Decimal::ZERO),
                value: Some(Decimal::ZERO),
            });
        entry.base = Some(
            entry
                .base
                .unwrap_or_default()
                .checked_add(tax.base.unwrap_or_default())?,
        );
        entry.value = Some(
            entry
                .value
                .unwrap_or_default()
                .checked_add(tax.value.unwrap_or_default())?,
        );
    }
    Some(grouped.into_values().collect())
}
