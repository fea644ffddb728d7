//! # Access-Key Subcommands
//!
//! - `sri key generate <input.json> [--fill NNNNNNNN]` builds a 49-digit key
//!   from its components. The fill comes from `--fill`, else from the
//!   payload's `numeric_fill`, else it is drawn at random; drawn fills are
//!   redrawn while the check digit is unrepresentable.
//! - `sri key verify <key>` checks width, digits, date, document type and
//!   check digit, and prints the decoded segments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use sri_core::{AccessKey, AccessKeyError, AccessKeyInput, DocumentType, Environment, NumericFill};

use crate::{parse_fill, print_json, read_input, with_fill};

/// Arguments for the key subcommand.
#[derive(Args, Debug)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

/// Available key subcommands.
#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Generate an access key from a JSON description of its components.
    Generate {
        /// JSON file with emission_date, document_type, issuer, environment,
        /// establishment, emission_point and sequential; `-` for stdin.
        input: PathBuf,

        /// Eight-digit numeric fill. Drawn at random when omitted.
        #[arg(long)]
        fill: Option<String>,
    },

    /// Verify an access key and print its segments.
    Verify {
        /// The 49-digit key.
        key: String,
    },
}

/// A generated key and the fill that produced it.
#[derive(Debug, Serialize)]
pub struct KeyReport {
    pub access_key: AccessKey,
    pub numeric_fill: NumericFill,
}

/// Decoded segments of a verified key.
#[derive(Debug, Serialize)]
pub struct KeySegments {
    pub emission_date: Option<NaiveDate>,
    pub document_type: Option<DocumentType>,
    pub issuer: String,
    pub environment: Option<Environment>,
    pub establishment: String,
    pub emission_point: String,
    pub sequential: String,
    pub numeric_fill: String,
    pub emission_type: String,
    pub check_digit: u8,
}

impl From<&AccessKey> for KeySegments {
    fn from(key: &AccessKey) -> Self {
        Self {
            emission_date: key.emission_date(),
            document_type: key.document_type(),
            issuer: key.issuer().to_string(),
            environment: key.environment(),
            establishment: key.establishment().to_string(),
            emission_point: key.emission_point().to_string(),
            sequential: key.sequential().to_string(),
            numeric_fill: key.numeric_fill().to_string(),
            emission_type: key.emission_type().to_string(),
            check_digit: key.check_digit(),
        }
    }
}

/// Outcome printed by `sri key verify`.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub key: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<KeySegments>,
}

/// Execute the key subcommand.
pub fn run_key(args: &KeyArgs) -> Result<u8> {
    match &args.command {
        KeyCommand::Generate { input, fill } => {
            let fill = fill.as_deref().map(parse_fill).transpose()?;
            let raw = read_input(input)?;
            let report = generate(&raw, fill, &mut rand::thread_rng())?;
            print_json(&report)?;
            Ok(0)
        }
        KeyCommand::Verify { key } => {
            let report = verify(key);
            print_json(&report)?;
            Ok(if report.valid { 0 } else { 1 })
        }
    }
}

/// Generate a key from a JSON payload. `fill` overrides the payload's own
/// `numeric_fill`; with neither, fills are drawn from `rng`.
pub fn generate<R: Rng + ?Sized>(
    raw: &str,
    fill: Option<NumericFill>,
    rng: &mut R,
) -> Result<KeyReport> {
    let mut payload: Value = serde_json::from_str(raw).context("key input is not JSON")?;
    let object = payload
        .as_object_mut()
        .context("key input must be a JSON object")?;
    let own_fill = match object.remove("numeric_fill") {
        Some(Value::String(s)) => Some(parse_fill(&s)?),
        Some(Value::Null) | None => None,
        Some(other) => anyhow::bail!("numeric_fill must be an eight-digit string, got {other}"),
    };
    object.insert("numeric_fill".into(), Value::String("00000000".into()));
    let template: AccessKeyInput =
        serde_json::from_value(payload).context("key input has missing or malformed fields")?;

    let outcome = with_fill(
        fill.or(own_fill),
        rng,
        |e: &AccessKeyError| matches!(e, AccessKeyError::UnrepresentableCheckDigit { .. }),
        |fill| {
            let input = AccessKeyInput {
                numeric_fill: fill,
                ..template.clone()
            };
            AccessKey::generate(&input).map(|key| KeyReport {
                access_key: key,
                numeric_fill: fill,
            })
        },
    )?;
    let report = outcome.context("access key generation failed")?;
    tracing::info!(document_type = %template.document_type, "access key generated");
    Ok(report)
}

/// Verify a key and decode it.
pub fn verify(key: &str) -> VerifyReport {
    let key = key.trim();
    match AccessKey::parse(key) {
        Ok(parsed) => VerifyReport {
            key: key.to_string(),
            valid: true,
            reason: None,
            segments: Some(KeySegments::from(&parsed)),
        },
        Err(e) => VerifyReport {
            key: key.to_string(),
            valid: false,
            reason: Some(e.to_string()),
            segments: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const INPUT: &str = r#"{
        "emission_date": "2026-01-15",
        "document_type": "07",
        "issuer": "1790016919001",
        "environment": "test",
        "establishment": "001",
        "emission_point": "001",
        "sequential": 1
    }"#;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn explicit_fill_is_reproducible() {
        let fill = NumericFill::new(12_345_678).unwrap();
        let a = generate(INPUT, Some(fill), &mut rng()).unwrap();
        let b = generate(INPUT, Some(fill), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.access_key, b.access_key);
        assert_eq!(a.numeric_fill, fill);
        assert_eq!(a.access_key.numeric_fill(), "12345678");
        assert!(a.access_key.as_str().starts_with("1501202607"));
    }

    #[test]
    fn payload_fill_is_used_when_flag_absent() {
        let mut payload: Value = serde_json::from_str(INPUT).unwrap();
        payload["numeric_fill"] = Value::String("00000042".into());
        let report = generate(&payload.to_string(), None, &mut rng()).unwrap();
        assert_eq!(report.numeric_fill.value(), 42);
    }

    #[test]
    fn drawn_fill_is_reported() {
        let report = generate(INPUT, None, &mut rng()).unwrap();
        assert_eq!(report.access_key.numeric_fill(), report.numeric_fill.padded());
        assert!(verify(report.access_key.as_str()).valid);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(generate("[]", None, &mut rng()).is_err());
        assert!(generate(r#"{"document_type": "07"}"#, None, &mut rng()).is_err());
        let bad_fill = INPUT.replacen('{', r#"{"numeric_fill": 7,"#, 1);
        assert!(generate(&bad_fill, None, &mut rng()).is_err());
    }

    #[test]
    fn verify_decodes_segments() {
        let fill = NumericFill::new(12_345_678).unwrap();
        let key = generate(INPUT, Some(fill), &mut rng()).unwrap().access_key;
        let report = verify(key.as_str());
        assert!(report.valid);
        let segments = report.segments.unwrap();
        assert_eq!(segments.document_type, Some(DocumentType::Withholding));
        assert_eq!(segments.issuer, "1790016919001");
        assert_eq!(segments.sequential, "000000001");
        assert_eq!(segments.emission_date, NaiveDate::from_ymd_opt(2026, 1, 15));
    }

    #[test]
    fn verify_reports_checksum_failure() {
        let fill = NumericFill::new(12_345_678).unwrap();
        let key = generate(INPUT, Some(fill), &mut rng()).unwrap().access_key;
        let mut tampered = key.as_str().to_string();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        let report = verify(&tampered);
        assert!(!report.valid);
        assert!(report.reason.is_some());
        assert!(report.segments.is_none());
        assert!(!verify("123").valid);
    }
}
