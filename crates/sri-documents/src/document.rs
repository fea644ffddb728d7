//! # Document Union
//!
//! [`Document`] is the closed set of documents the engine handles. Every
//! operation dispatches with an exhaustive `match`, so a new document type
//! cannot be added without deciding how each operation treats it.
//!
//! [`ValidatedDocument`] can only be obtained through
//! [`Document::validated`]; the serializer accepts nothing else.

use serde::{Deserialize, Serialize};

use sri_core::{AccessKeyInput, DocumentType, NumericFill};

use crate::invoice::Invoice;
use crate::model::Header;
use crate::notes::{CreditNote, DebitNote};
use crate::rules::RuleContext;
use crate::shipment::ShipmentGuide;
use crate::summary::TransactionalSummary;
use crate::violation::{ValidationResult, Violation};
use crate::withholding::Withholding;

/// Any supported document, tagged by `"type"` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Document {
    Invoice(Invoice),
    Withholding(Withholding),
    ShipmentGuide(ShipmentGuide),
    CreditNote(CreditNote),
    DebitNote(DebitNote),
    TransactionalSummary(TransactionalSummary),
}

impl Document {
    /// Access-key document type; `None` for the monthly summary.
    pub fn document_type(&self) -> Option<DocumentType> {
        match self {
            Self::Invoice(_) => Some(DocumentType::Invoice),
            Self::Withholding(_) => Some(DocumentType::Withholding),
            Self::ShipmentGuide(_) => Some(DocumentType::ShipmentGuide),
            Self::CreditNote(_) => Some(DocumentType::CreditNote),
            Self::DebitNote(_) => Some(DocumentType::DebitNote),
            Self::TransactionalSummary(_) => None,
        }
    }

    /// Snake-case name, as used in the `"type"` tag and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invoice(_) => "invoice",
            Self::Withholding(_) => "withholding",
            Self::ShipmentGuide(_) => "shipment_guide",
            Self::CreditNote(_) => "credit_note",
            Self::DebitNote(_) => "debit_note",
            Self::TransactionalSummary(_) => "transactional_summary",
        }
    }

    /// Header of a keyed document.
    pub fn header(&self) -> Option<&Header> {
        match self {
            Self::Invoice(d) => Some(&d.header),
            Self::Withholding(d) => Some(&d.header),
            Self::ShipmentGuide(d) => Some(&d.header),
            Self::CreditNote(d) => Some(&d.header),
            Self::DebitNote(d) => Some(&d.header),
            Self::TransactionalSummary(_) => None,
        }
    }

    /// Run the document type's rule table.
    pub fn validate(&self, ctx: &RuleContext) -> ValidationResult {
        match self {
            Self::Invoice(d) => d.validate(ctx),
            Self::Withholding(d) => d.validate(ctx),
            Self::ShipmentGuide(d) => d.validate(ctx),
            Self::CreditNote(d) => d.validate(ctx),
            Self::DebitNote(d) => d.validate(ctx),
            Self::TransactionalSummary(d) => d.validate(ctx),
        }
    }

    /// Validate and wrap.
    ///
    /// # Errors
    ///
    /// Returns every violation when the document is invalid.
    pub fn validated(self, ctx: &RuleContext) -> Result<ValidatedDocument, Vec<Violation>> {
        self.validate(ctx).into_result()?;
        Ok(ValidatedDocument(self))
    }

    /// Access-key input for a keyed document whose header resolves.
    pub fn access_key_input(&self, fill: NumericFill) -> Option<AccessKeyInput> {
        let document_type = self.document_type()?;
        let resolved = self.header()?.resolve()?;
        Some(resolved.access_key_input(document_type, fill))
    }
}

/// A document that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedDocument(Document);

impl ValidatedDocument {
    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn into_inner(self) -> Document {
        self.0
    }
}
