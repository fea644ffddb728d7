//! # Render Subcommand
//!
//! `sri render <document.json> [--fill NNNNNNNN]` validates the document,
//! generates its access key and prints the rendered tree together with the
//! key and the numeric fill. Without `--fill` a fill is drawn at random and
//! redrawn while the check digit is unrepresentable.
//!
//! A refused document prints the same report as `sri validate` and exits
//! with `1`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::Rng;

use sri_core::NumericFill;
use sri_documents::{issue, Document, IssueError, Issued, RuleContext};

use crate::validate::ValidationReport;
use crate::{parse_fill, print_json, read_document, with_fill, Settings};

/// Arguments for the render subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON document payload; `-` for stdin.
    pub input: PathBuf,

    /// Eight-digit numeric fill for the access key. Drawn at random when
    /// omitted; ignored for the transactional summary.
    #[arg(long)]
    pub fill: Option<String>,
}

/// Issue `doc`, drawing fills from `rng` when none is given.
pub fn render_document<R: Rng + ?Sized>(
    doc: &Document,
    fill: Option<NumericFill>,
    ctx: &RuleContext,
    rng: &mut R,
) -> Result<Result<Issued, IssueError>> {
    with_fill(fill, rng, IssueError::wants_new_fill, |fill| {
        issue(doc.clone(), Some(fill), ctx)
    })
}

/// Execute the render subcommand.
pub fn run_render(args: &RenderArgs, settings: &Settings) -> Result<u8> {
    let fill = args.fill.as_deref().map(parse_fill).transpose()?;
    let ctx = settings.rule_context()?;
    let doc = read_document(&args.input)?;

    match render_document(&doc, fill, &ctx, &mut rand::thread_rng())? {
        Ok(issued) => {
            tracing::info!(document = doc.kind(), name = %issued.rendered.name, "document rendered");
            print_json(&issued)?;
            Ok(0)
        }
        Err(IssueError::Invalid(violations)) => {
            print_json(&ValidationReport {
                document: doc.kind(),
                valid: false,
                violations: &violations,
            })?;
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("failed to render {}", doc.kind())),
    }
}
