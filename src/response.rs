//! Response encoding: wrap a [`BatchResult`] into the invocation envelope.
//!
//! The envelope mirrors what API-gateway-style hosts expect: `statusCode`,
//! `isBase64Encoded`, a base64 `body` holding the ZIP, and a per-document
//! `results` list so callers can react to partial failure programmatically
//! without touching the binary payload.
//!
//! Status-code policy: any successfully converted document makes the
//! invocation a 200, even when siblings failed. An entirely failed batch is a
//! 400 when every failure was caused by the caller's input (bad bytes, bad
//! URL) and a 500 otherwise.

use crate::error::ConvertError;
use crate::output::{BatchResult, DocumentResult, DocumentStatus, ResourceLimit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// The invocation response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub status_code: u16,
    /// True iff `body` is present; the body is always base64 when it is.
    pub is_base64_encoded: bool,
    /// Base64-encoded ZIP archive. Absent when no document produced images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Fatal invocation error, when the pipeline never produced results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One entry per source document, in input order.
    pub results: Vec<DocumentSummary>,
}

/// Per-document status reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub name: String,
    pub status: DocumentStatus,
    /// Machine-readable failure code (`corrupt`, `fetch_failed`, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub page_count: usize,
    /// Which ceiling truncated this document's output, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<ResourceLimit>,
}

/// Encode a completed batch into the response envelope.
pub fn encode_response(batch: &BatchResult) -> ConvertResponse {
    let body = batch.archive.as_deref().map(|a| STANDARD.encode(a));
    ConvertResponse {
        status_code: status_code_for(&batch.results),
        is_base64_encoded: body.is_some(),
        body,
        error: None,
        results: batch.results.iter().map(summarize).collect(),
    }
}

/// Encode a fatal invocation error into the response envelope.
pub fn error_response(error: &ConvertError) -> ConvertResponse {
    let status_code = match error {
        ConvertError::InvalidRequest(_) | ConvertError::InvalidConfig(_) => 400,
        _ => 500,
    };
    ConvertResponse {
        status_code,
        is_base64_encoded: false,
        body: None,
        error: Some(error.to_string()),
        results: Vec::new(),
    }
}

fn summarize(result: &DocumentResult) -> DocumentSummary {
    DocumentSummary {
        name: result.name.clone(),
        status: result.status,
        error: result.error.as_ref().map(|e| e.code().to_string()),
        detail: result.error.as_ref().map(|e| e.to_string()),
        page_count: result.page_count(),
        truncation: result.truncation,
    }
}

fn status_code_for(results: &[DocumentResult]) -> u16 {
    if results
        .iter()
        .any(|r| r.status == DocumentStatus::Ok)
    {
        return 200;
    }
    let all_caller_faults = !results.is_empty()
        && results
            .iter()
            .all(|r| r.error.as_ref().is_some_and(|e| e.is_input_class()));
    if all_caller_faults {
        400
    } else {
        500
    }
}
