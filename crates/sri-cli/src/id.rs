//! # Identifier Check
//!
//! `sri id <value> [--type <code>]` checks a national identifier against the
//! rules of its declared identification type, or of the type inferred from
//! its shape.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sri_core::{
    check_identification, validate_entity, EntityKind, IdentificationType, IdentifierDefect,
};

use crate::print_json;

/// Arguments for the id subcommand.
#[derive(Args, Debug)]
pub struct IdArgs {
    /// Identifier to check.
    pub value: String,

    /// Identification type code (`04` RUC, `05` cédula, `06` passport,
    /// `07` final consumer, `08` foreign). Inferred when omitted.
    #[arg(long = "type")]
    pub id_type: Option<String>,
}

/// Outcome printed by `sri id`.
#[derive(Debug, Serialize)]
pub struct IdReport {
    pub identification: String,
    pub id_type: IdentificationType,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IdentifierDefect>,
}

/// Check `value` as `id_type`, inferring the type when absent.
pub fn check(value: &str, id_type: Option<&str>) -> Result<IdReport> {
    let value = value.trim();
    let id_type = match id_type {
        Some(code) => IdentificationType::from_code(code)
            .with_context(|| format!("unknown identification type {code:?}"))?,
        None => IdentificationType::infer(value),
    };
    let reason = check_identification(id_type, value).err();
    let kind = match id_type {
        IdentificationType::Ruc => validate_entity(value).kind,
        _ => None,
    };
    Ok(IdReport {
        identification: value.to_string(),
        id_type,
        valid: reason.is_none(),
        kind,
        reason,
    })
}

/// Execute the id subcommand.
pub fn run_id(args: &IdArgs) -> Result<u8> {
    let report = check(&args.value, args.id_type.as_deref())?;
    tracing::info!(id_type = %report.id_type, valid = report.valid, "identifier checked");
    print_json(&report)?;
    Ok(if report.valid { 0 } else { 1 })
}
