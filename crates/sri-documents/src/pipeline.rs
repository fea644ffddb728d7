//! # Issuance Pipeline
//!
//! `validate → access key → render` for one document. The numeric fill is
//! an input and comes back in [`Issued`], so the same key can be rebuilt
//! later from the document and the fill alone.

use serde::Serialize;

use sri_core::{AccessKey, NumericFill};

use crate::document::Document;
use crate::error::{IssueError, RenderError};
use crate::rules::RuleContext;
use crate::serialize::{render, Rendered};

/// Outcome of issuing a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issued {
    /// Generated key; `None` for the monthly summary.
    pub access_key: Option<AccessKey>,
    /// Fill the key was generated with.
    pub numeric_fill: Option<NumericFill>,
    pub rendered: Rendered,
}

/// Validate, key and render `document`.
///
/// The fill is ignored for the monthly summary.
///
/// # Errors
///
/// - [`IssueError::Invalid`] with every violation when validation fails.
/// - [`IssueError::MissingNumericFill`] for a keyed document without a fill.
/// - [`IssueError::AccessKey`] when the fill yields an unrepresentable
///   check digit ([`IssueError::wants_new_fill`]).
/// - [`IssueError::Render`] when rendering fails.
pub fn issue(
    document: Document,
    fill: Option<NumericFill>,
    ctx: &RuleContext,
) -> Result<Issued, IssueError> {
    let kind = document.kind();
    let validated = document.validated(ctx).map_err(|violations| {
        tracing::debug!(document = kind, violations = violations.len(), "issue refused");
        IssueError::Invalid(violations)
    })?;

    let (access_key, numeric_fill) = match validated.document().document_type() {
        None => (None, None),
        Some(document_type) => {
            let fill = fill.ok_or(IssueError::MissingNumericFill { document_type })?;
            let input = validated
                .document()
                .access_key_input(fill)
                .ok_or(RenderError::Unresolved)?;
            (Some(AccessKey::generate(&input)?), Some(fill))
        }
    };

    let rendered = render(&validated, access_key.as_ref())?;
    tracing::debug!(document = kind, name = %rendered.name, "document issued");
    Ok(Issued {
        access_key,
        numeric_fill,
        rendered,
    })
}
