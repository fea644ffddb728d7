//! # sri-documents: Document Validation and Serialization
//!
//! Builds on `sri-core` to validate and encode the six electronic tax
//! documents:
//!
//! - **Invoice** (`invoice.rs`)
//! - **Withholding certificate** (`withholding.rs`)
//! - **Shipment guide** (`shipment.rs`)
//! - **Credit and debit notes** (`notes.rs`)
//! - **Monthly transactional summary** (`summary.rs`), the periodic
//!   aggregate that carries no access key
//!
//! ## Validation Layers
//!
//! Each document type owns a static table of [`rules::Rule`]s, ordered by
//! [`rules::Stage`]:
//!
//! 1. **Presence**: mandatory fields present and well-formed.
//! 2. **Identifiers**: every embedded identifier passes its check digit.
//! 3. **Temporal**: date windows.
//! 4. **Cardinality**: minimum and maximum counts.
//! 5. **Business rules**: cross-field regulatory rules.
//! 6. **Format**: cents precision, code widths, voucher numbers.
//!
//! Violations accumulate. A rule is skipped only when its prerequisite
//! fields are absent.
//!
//! ## Serialization
//!
//! A validated document renders to a [`serialize::Node`] tree in the
//! authority's field order, ready for an external markup writer.
//!
//! ## Crate Policy
//!
//! - Depends only on `sri-core` internally.
//! - Validation failures are values ([`ValidationResult`]), never panics.
//! - No I/O.

pub mod catalog;
pub mod document;
pub mod error;
pub mod invoice;
pub mod model;
pub mod notes;
pub mod pipeline;
pub mod rules;
pub mod serialize;
pub mod shipment;
pub mod summary;
pub mod violation;
pub mod withholding;

#[cfg(test)]
mod fixtures;

pub use document::{Document, ValidatedDocument};
pub use error::{IssueError, RenderError};
pub use invoice::Invoice;
pub use notes::{CreditNote, DebitNote};
pub use pipeline::{issue, Issued};
pub use rules::{RuleContext, Stage};
pub use serialize::{render, Node, Rendered};
pub use shipment::ShipmentGuide;
pub use summary::TransactionalSummary;
pub use violation::{ValidationResult, Violation, ViolationKind};
pub use withholding::Withholding;
