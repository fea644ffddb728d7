//! # Validate Subcommand
//!
//! `sri validate <document.json>` runs the document type's rule table and
//! prints every violation. Exit code `1` when the document is invalid.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use sri_documents::{Document, RuleContext, Violation};

use crate::{print_json, read_document, Settings};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON document payload; `-` for stdin.
    pub input: PathBuf,
}

/// Validation outcome printed by `sri validate`, and by `sri render` when
/// it refuses a document.
#[derive(Debug, Serialize)]
pub struct ValidationReport<'a> {
    pub document: &'static str,
    pub valid: bool,
    pub violations: &'a [Violation],
}

/// Validate a parsed document.
pub fn check(doc: &Document, ctx: &RuleContext) -> Vec<Violation> {
    let result = doc.validate(ctx);
    tracing::info!(
        document = doc.kind(),
        violations = result.violations().len(),
        "document validated"
    );
    result.violations().to_vec()
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, settings: &Settings) -> Result<u8> {
    let ctx = settings.rule_context()?;
    let doc = read_document(&args.input)?;
    let violations = check(&doc, &ctx);
    print_json(&ValidationReport {
        document: doc.kind(),
        valid: violations.is_empty(),
        violations: &violations,
    })?;
    Ok(if violations.is_empty() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RuleContext {
        RuleContext::with_today(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[test]
    fn sparse_payload_lists_violations() {
        let doc: Document = serde_json::from_str(r#"{"type": "withholding"}"#).unwrap();
        let violations = check(&doc, &ctx());
        assert!(!violations.is_empty());
        assert!(violations.iter().any(|v| v.code == "MISSING_FIELD"));
    }

    #[test]
    fn report_serializes_violations() {
        let doc: Document = serde_json::from_str(r#"{"type": "debit_note"}"#).unwrap();
        let violations = check(&doc, &ctx());
        let json = serde_json::to_value(ValidationReport {
            document: doc.kind(),
            valid: false,
            violations: &violations,
        })
        .unwrap();
        assert_eq!(json["document"], "debit_note");
        assert_eq!(json["valid"], false);
        assert_eq!(json["violations"][0]["kind"], "structural");
    }
}
