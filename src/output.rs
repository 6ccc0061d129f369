//! Result types produced by the conversion pipeline.
//!
//! [`DocumentResult`] is the unit of partial-failure isolation: every source
//! document yields exactly one, in input order, regardless of what happened
//! to its siblings. [`BatchResult`] aggregates them together with the
//! assembled archive (absent when no document produced any image).

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// Where a document's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    /// Supplied inline as base64 in the request body.
    Inline,
    /// Fetched from a caller-supplied URL.
    Url,
}

/// One resolved input document, owned by the pipeline for the duration of a
/// single invocation.
///
/// `name` is unique within a batch — the input resolver disambiguates
/// collisions before any document reaches the coordinator.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
    pub origin: DocumentOrigin,
}

/// A single rasterised page.
///
/// `page_index` values are contiguous from 0 within one source document.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub source_name: String,
    pub page_index: usize,
    pub bytes: Vec<u8>,
}

/// Outcome class of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Converted successfully (possibly with zero pages).
    Ok,
    /// Resolution or conversion failed; see the attached error.
    Failed,
    /// Never dispatched because the invocation's time budget ran out.
    NotProcessed,
}

/// Which ceiling truncated a document's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLimit {
    /// The per-document page-count ceiling was hit.
    PageCount,
    /// The per-document image-byte ceiling was hit.
    ImageBytes,
}

/// The outcome for one source document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub name: String,
    pub status: DocumentStatus,
    /// Rendered pages in `page_index` order; empty when failed.
    pub images: Vec<PageImage>,
    pub error: Option<DocumentError>,
    /// Present when a resource ceiling truncated the output. The document
    /// still counts as `Ok`.
    pub truncation: Option<ResourceLimit>,
}

impl DocumentResult {
    pub fn ok(name: String, images: Vec<PageImage>, truncation: Option<ResourceLimit>) -> Self {
        Self {
            name,
            status: DocumentStatus::Ok,
            images,
            error: None,
            truncation,
        }
    }

    pub fn failed(name: String, error: DocumentError) -> Self {
        Self {
            name,
            status: DocumentStatus::Failed,
            images: Vec::new(),
            error: Some(error),
            truncation: None,
        }
    }

    pub fn not_processed(name: String) -> Self {
        Self {
            name,
            status: DocumentStatus::NotProcessed,
            images: Vec::new(),
            error: None,
            truncation: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.images.len()
    }
}

/// The aggregate outcome of one invocation.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// One entry per source document, in input order.
    pub results: Vec<DocumentResult>,
    /// The assembled ZIP, or `None` when no document produced any image.
    pub archive: Option<Vec<u8>>,
}

impl BatchResult {
    /// True iff at least one document converted with at least one page.
    pub fn has_content(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == DocumentStatus::Ok && !r.images.is_empty())
    }

    pub fn ok_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == DocumentStatus::Ok)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == DocumentStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, page_index: usize) -> PageImage {
        PageImage {
            source_name: name.to_string(),
            page_index,
            bytes: vec![0xFF, 0xD8],
        }
    }

    #[test]
    fn zero_page_ok_is_not_content() {
        let batch = BatchResult {
            results: vec![DocumentResult::ok("a".into(), vec![], None)],
            archive: None,
        };
        assert!(!batch.has_content());
        assert_eq!(batch.ok_count(), 1);
        assert_eq!(batch.failed_count(), 0);
    }

    #[test]
    fn one_page_is_content() {
        let batch = BatchResult {
            results: vec![
                DocumentResult::ok("a".into(), vec![image("a", 0)], None),
                DocumentResult::failed(
                    "b".into(),
                    DocumentError::InvalidInput {
                        detail: "missing %PDF header".into(),
                    },
                ),
            ],
            archive: Some(vec![]),
        };
        assert!(batch.has_content());
        assert_eq!(batch.failed_count(), 1);
    }
}
