//! # sri-core: Foundational Types for Electronic Tax Documents
//!
//! This crate is the leaf of the workspace. It holds the pieces of the
//! document engine that must be bit-exact with the tax authority's
//! consumption format and that every other crate builds on.
//!
//! ## Key Design Principles
//!
//! 1. **One check-digit engine.** Every checksum in the system (identifiers,
//!    access keys) flows through [`checkdigit::mod10`] or
//!    [`checkdigit::mod11`]. The modulo-11 remap table is an explicit
//!    parameter; each call site names the table it uses.
//!
//! 2. **Newtypes with validated constructors.** `Cedula`, `Ruc`,
//!    `Establishment`, `EmissionPoint`, `Sequential`, `NumericFill`,
//!    `AccessKey`: no bare strings once a value has been checked.
//!
//! 3. **No hidden entropy.** The 8-digit numeric fill of an access key is a
//!    caller-supplied input. Key generation is a pure function.
//!
//! 4. **Money is `Decimal`.** Amounts render with exactly two fractional
//!    digits through [`money::format_amount`], never through float
//!    formatting.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sri-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access_key;
pub mod checkdigit;
pub mod codes;
pub mod config;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use access_key::{AccessKey, AccessKeyInput, ACCESS_KEY_LEN};
pub use checkdigit::{mod10, mod11, Direction, Mod11Remap};
pub use codes::{
    voucher_number, DocumentType, EmissionPoint, EmissionType, Environment, Establishment,
    NumericFill, Sequential,
};
pub use config::ValidationPolicy;
pub use error::{AccessKeyError, CodeError, ConfigError, IdentifierDefect, SriError};
pub use identity::{
    check_identification, validate_entity, validate_individual, Cedula, EntityKind,
    IdentificationType, IdentifierCheck, Ruc, FINAL_CONSUMER_ID,
};
pub use temporal::FiscalPeriod;
