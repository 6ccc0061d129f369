//! Error types for the pdf2zip library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the invocation cannot proceed at all
//!   (unparseable payload, invalid configuration, archive assembly fault).
//!   Returned as `Err(ConvertError)` from the top-level entry points and
//!   mapped to a 4xx/5xx envelope by the response encoder.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (bad bytes,
//!   fetch error, conversion fault) but its siblings are fine. Stored inside
//!   [`crate::output::DocumentResult`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad document.
//!
//! [`EngineError`] is the rasterisation capability's own failure type; the
//! pipeline converts it into a `DocumentError` at the document-task boundary
//! so raw engine diagnostics never escape as machine-readable codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All fatal errors returned by the pdf2zip library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The request payload could not be understood at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The zip writer rejected an entry.
    #[error("failed to assemble archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Writing image bytes into the archive failed.
    #[error("failed to write archive entry '{entry}': {source}")]
    ArchiveWrite {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document in a batch.
///
/// Stored alongside [`crate::output::DocumentResult`] when a document fails.
/// The overall invocation continues regardless; the response encoder decides
/// the envelope status from the aggregate.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum DocumentError {
    /// The entry's bytes are not a PDF: undecodable base64, missing `%PDF`
    /// magic header, or a malformed batch entry.
    #[error("invalid input: {detail}")]
    InvalidInput { detail: String },

    /// URL fetch failed: unreachable host, non-2xx status, oversize body,
    /// or timeout.
    #[error("failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The rasterisation engine could not convert the document.
    #[error("conversion failed: {detail}")]
    Conversion {
        reason: ConversionReason,
        detail: String,
    },

    /// Rasterisation exceeded the per-document timeout.
    #[error("conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Unexpected fault inside the document task.
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl DocumentError {
    /// Stable machine-readable code reported in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::InvalidInput { .. } => "invalid_input",
            DocumentError::Fetch { .. } => "fetch_failed",
            DocumentError::Conversion { reason, .. } => reason.code(),
            DocumentError::Timeout { .. } => "timeout",
            DocumentError::Internal { .. } => "internal",
        }
    }

    /// True for failures caused by the caller's input rather than by
    /// processing. Drives the all-failed 400-vs-500 envelope decision.
    pub fn is_input_class(&self) -> bool {
        matches!(
            self,
            DocumentError::InvalidInput { .. } | DocumentError::Fetch { .. }
        )
    }
}

/// Why the engine rejected a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionReason {
    /// Header/trailer/xref damage; the document cannot be parsed.
    Corrupt,
    /// The document requires a password.
    Encrypted,
    /// The document parsed but uses constructs the engine cannot handle.
    Unsupported,
    /// A specific page failed to rasterise or encode.
    Render,
}

impl ConversionReason {
    pub fn code(&self) -> &'static str {
        match self {
            ConversionReason::Corrupt => "corrupt",
            ConversionReason::Encrypted => "encrypted",
            ConversionReason::Unsupported => "unsupported",
            ConversionReason::Render => "render_failed",
        }
    }
}

/// Failures reported by a [`crate::engine::ConvertEngine`] implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document cannot be parsed at all.
    #[error("document is corrupt: {detail}")]
    Corrupt { detail: String },

    /// The document requires a password that was not supplied.
    #[error("document is password-protected")]
    Encrypted,

    /// The document parsed but cannot be rendered by this engine.
    #[error("document uses unsupported features: {detail}")]
    Unsupported { detail: String },

    /// A single page failed to rasterise or encode.
    #[error("rasterisation failed on page {page}: {detail}")]
    Render { page: usize, detail: String },
}

impl From<EngineError> for DocumentError {
    fn from(e: EngineError) -> Self {
        let (reason, detail) = match e {
            EngineError::Corrupt { detail } => (ConversionReason::Corrupt, detail),
            EngineError::Encrypted => (
                ConversionReason::Encrypted,
                "document is password-protected".to_string(),
            ),
            EngineError::Unsupported { detail } => (ConversionReason::Unsupported, detail),
            EngineError::Render { page, detail } => {
                (ConversionReason::Render, format!("page {page}: {detail}"))
            }
        };
        DocumentError::Conversion { reason, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_display() {
        let e = DocumentError::Fetch {
            url: "https://example.com/a.pdf".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("example.com"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn conversion_codes_are_stable() {
        let corrupt = DocumentError::from(EngineError::Corrupt {
            detail: "bad xref".into(),
        });
        assert_eq!(corrupt.code(), "corrupt");

        let encrypted = DocumentError::from(EngineError::Encrypted);
        assert_eq!(encrypted.code(), "encrypted");

        let render = DocumentError::from(EngineError::Render {
            page: 3,
            detail: "oom".into(),
        });
        assert_eq!(render.code(), "render_failed");
        assert!(render.to_string().contains("page 3"));
    }

    #[test]
    fn input_class_split() {
        assert!(DocumentError::InvalidInput {
            detail: "x".into()
        }
        .is_input_class());
        assert!(DocumentError::Fetch {
            url: "u".into(),
            reason: "r".into()
        }
        .is_input_class());
        assert!(!DocumentError::Timeout { secs: 5 }.is_input_class());
        assert!(!DocumentError::Internal {
            detail: "x".into()
        }
        .is_input_class());
    }

    #[test]
    fn timeout_display() {
        let e = DocumentError::Timeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }
}
