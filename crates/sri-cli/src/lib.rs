//! # sri-cli: Command-Line Front End
//!
//! Thin handlers over `sri-core` and `sri-documents`:
//!
//! - `sri id`: identifier check with type inference
//! - `sri key generate` / `sri key verify`: 49-digit access keys
//! - `sri validate`: run a document's rule table
//! - `sri render`: validate, key and render a document
//!
//! ## Crate Policy
//!
//! - No business logic: every decision is made by the library crates.
//! - Machine-readable JSON on stdout, logs on stderr.
//! - The numeric fill is drawn here, never in the library, and is always
//!   printed next to the key it produced.
//! - Exit code `0` on success, `1` when the input is invalid or a command
//!   fails.

pub mod id;
pub mod key;
pub mod render;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use sri_core::{NumericFill, ValidationPolicy};
use sri_documents::{Document, RuleContext};

/// Fills tried before giving up on a document whose check digit keeps
/// coming out unrepresentable.
pub const MAX_FILL_ATTEMPTS: usize = 16;

/// Options shared by every subcommand that validates.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// YAML validation policy; defaults apply when absent.
    pub policy: Option<PathBuf>,
    /// Reference date for date windows; the local date when absent.
    pub today: Option<NaiveDate>,
}

impl Settings {
    /// Load the policy and fix the reference date.
    pub fn rule_context(&self) -> Result<RuleContext> {
        let policy = match &self.policy {
            Some(path) => ValidationPolicy::load(path)
                .with_context(|| format!("failed to load policy {}", path.display()))?,
            None => ValidationPolicy::default(),
        };
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        Ok(RuleContext::new(policy, today))
    }
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read and deserialize a JSON document payload.
pub fn read_document(path: &Path) -> Result<Document> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a document payload", path.display()))
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

/// Parse an eight-digit `--fill` argument.
pub fn parse_fill(raw: &str) -> Result<NumericFill> {
    NumericFill::parse(raw).with_context(|| format!("invalid numeric fill {raw:?}"))
}

/// Draw a uniformly random eight-digit fill.
pub fn draw_fill<R: Rng + ?Sized>(rng: &mut R) -> Result<NumericFill> {
    Ok(NumericFill::new(rng.gen_range(0..=NumericFill::MAX))?)
}

/// Run `attempt` with the given fill, or with freshly drawn fills until one
/// is accepted. `retry` decides whether an error calls for another fill.
pub fn with_fill<T, E, R>(
    fill: Option<NumericFill>,
    rng: &mut R,
    retry: impl Fn(&E) -> bool,
    mut attempt: impl FnMut(NumericFill) -> std::result::Result<T, E>,
) -> Result<std::result::Result<T, E>>
where
    R: Rng + ?Sized,
{
    if let Some(fill) = fill {
        return Ok(attempt(fill));
    }
    let mut last = None;
    for n in 0..MAX_FILL_ATTEMPTS {
        let fill = draw_fill(rng)?;
        match attempt(fill) {
            Err(e) if retry(&e) => {
                tracing::debug!(attempt = n + 1, "drawing another numeric fill");
                last = Some(e);
            }
            outcome => return Ok(outcome),
        }
    }
    match last {
        Some(e) => Ok(Err(e)),
        None => anyhow::bail!("no numeric fill attempted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fill_argument_is_eight_digits() {
        assert_eq!(parse_fill("00000042").unwrap().value(), 42);
        assert!(parse_fill("42").is_err());
        assert!(parse_fill("1234567a").is_err());
    }

    #[test]
    fn drawn_fills_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(draw_fill(&mut rng).unwrap().value() <= NumericFill::MAX);
        }
    }

    #[test]
    fn explicit_fill_is_used_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut calls = 0;
        let outcome = with_fill(
            Some(NumericFill::new(5).unwrap()),
            &mut rng,
            |_: &()| true,
            |fill| {
                calls += 1;
                Ok::<u32, ()>(fill.value())
            },
        )
        .unwrap();
        assert_eq!(outcome, Ok(5));
        assert_eq!(calls, 1);
    }

    #[test]
    fn drawn_fills_retry_until_accepted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut calls = 0;
        let outcome = with_fill(None, &mut rng, |e: &&str| *e == "again", |_| {
            calls += 1;
            if calls < 3 {
                Err("again")
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(outcome, Ok(3));
    }

    #[test]
    fn retries_are_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut calls = 0;
        let outcome = with_fill(None, &mut rng, |_: &&str| true, |_| {
            calls += 1;
            Err::<(), &str>("again")
        })
        .unwrap();
        assert_eq!(outcome, Err("again"));
        assert_eq!(calls, MAX_FILL_ATTEMPTS);
    }

    #[test]
    fn default_settings_use_default_policy() {
        let settings = Settings {
            policy: None,
            today: NaiveDate::from_ymd_opt(2026, 1, 15),
        };
        let ctx = settings.rule_context().unwrap();
        assert_eq!(ctx.policy, ValidationPolicy::default());
        assert_eq!(ctx.today, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn missing_policy_file_is_reported() {
        let settings = Settings {
            policy: Some(PathBuf::from("/nonexistent/policy.yaml")),
            today: None,
        };
        let err = settings.rule_context().unwrap_err();
        assert!(format!("{err:#}").contains("failed to load policy"));
    }
}
