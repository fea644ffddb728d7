//! # Error Types
//!
//! Rendering and issuance failures. Validation findings are not errors:
//! they travel as [`crate::ValidationResult`] and only become an
//! [`IssueError::Invalid`] when a caller asks to issue the document anyway.

use thiserror::Error;

use sri_core::{AccessKeyError, DocumentType};

use crate::violation::Violation;

/// Why a validated document could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A keyed document was rendered without its access key.
    #[error("{document_type} requires an access key to render")]
    MissingAccessKey {
        /// Type of the document being rendered.
        document_type: DocumentType,
    },

    /// The monthly summary carries no access key.
    #[error("the transactional summary takes no access key")]
    UnexpectedAccessKey,

    /// The access key was generated for a different document.
    #[error("access key {field} does not match the document")]
    KeyMismatch {
        /// Key segment that differs.
        field: &'static str,
    },

    /// The header does not resolve to typed values.
    #[error("document header does not resolve")]
    Unresolved,

    /// A mandatory field would be missing from the output.
    #[error("rendered {root} lacks mandatory field {path}")]
    Incomplete {
        /// Root element of the rendered tree.
        root: &'static str,
        /// Slash-separated path below the root.
        path: &'static str,
    },
}

/// Why a document could not be issued.
#[derive(Error, Debug)]
pub enum IssueError {
    /// The document has validation violations.
    #[error("document is invalid: {} violation(s)", .0.len())]
    Invalid(Vec<Violation>),

    /// A keyed document was issued without a numeric fill.
    #[error("{document_type} needs a numeric fill to generate its access key")]
    MissingNumericFill {
        /// Type of the document being issued.
        document_type: DocumentType,
    },

    /// Access-key generation failed; an unrepresentable check digit calls
    /// for another fill.
    #[error("access key: {0}")]
    AccessKey(#[from] AccessKeyError),

    /// Rendering failed.
    #[error("render: {0}")]
    Render(#[from] RenderError),
}

impl IssueError {
    /// Whether retrying with a different numeric fill may succeed.
    pub fn wants_new_fill(&self) -> bool {
        matches!(
            self,
            Self::AccessKey(AccessKeyError::UnrepresentableCheckDigit { .. })
        )
    }
}
