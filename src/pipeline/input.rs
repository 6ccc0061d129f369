//! Input resolution: normalise the request payload into source documents.
//!
//! ## Why per-entry failures?
//!
//! A batch mixes independent documents, so a single bad entry (undecodable
//! base64, dead URL) must not abort its siblings. Each entry resolves to
//! either a [`SourceDocument`] or the [`DocumentError`] that will become its
//! result — only payload-level faults (unparseable JSON, no source field,
//! empty batch) abort the invocation before dispatch.
//!
//! ## Why validate the magic header here?
//!
//! Checking for `%PDF` before dispatch turns garbage bytes into a meaningful
//! `invalid_input` failure instead of an opaque engine error, and spares the
//! rasteriser a doomed `spawn_blocking` round trip.

use crate::config::{ConversionQuality, ConvertConfig};
use crate::error::{ConvertError, DocumentError};
use crate::output::{DocumentOrigin, SourceDocument};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Magic header every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The invocation payload.
///
/// Three shapes are accepted, mutually exclusive:
/// `{"pdf_url": …}`, `{"body": <base64>}`, or `{"documents": [ … ]}`.
/// `quality` and `dpi` optionally override the configured defaults for the
/// whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub documents: Option<Vec<DocumentSpec>>,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub dpi: Option<u32>,
}

/// One batch entry: a URL or inline bytes, with an optional logical name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// One resolver output slot: the document either resolved, or carries the
/// failure that will become its [`crate::output::DocumentResult`].
#[derive(Debug)]
pub struct ResolvedDocument {
    /// Disambiguated logical name, unique within the batch.
    pub name: String,
    pub source: Result<SourceDocument, DocumentError>,
}

/// Parse the raw invocation event into a [`ConvertRequest`].
pub fn parse_request(event: serde_json::Value) -> Result<ConvertRequest, ConvertError> {
    serde_json::from_value(event)
        .map_err(|e| ConvertError::InvalidRequest(format!("malformed payload: {e}")))
}

/// Validate per-request quality overrides against the configured defaults.
///
/// Overrides are validated once, not clamped: an out-of-range value is a
/// caller mistake and is reported as such.
pub fn quality_for(
    request: &ConvertRequest,
    config: &ConvertConfig,
) -> Result<ConversionQuality, ConvertError> {
    let jpeg_quality = match request.quality {
        None => config.jpeg_quality,
        Some(q) if (1..=100).contains(&q) => q,
        Some(q) => {
            return Err(ConvertError::InvalidRequest(format!(
                "quality must be 1–100, got {q}"
            )))
        }
    };
    let dpi = match request.dpi {
        None => config.dpi,
        Some(d) if (1..=600).contains(&d) => d,
        Some(d) => {
            return Err(ConvertError::InvalidRequest(format!(
                "dpi must be 1–600, got {d}"
            )))
        }
    };
    Ok(ConversionQuality {
        jpeg_quality,
        dpi,
        max_rendered_pixels: config.max_rendered_pixels,
        page_limit: config.max_pages_per_document,
    })
}

/// Resolve the request into an ordered, non-empty sequence of documents.
///
/// URL entries are fetched with bounded concurrency; output order is input
/// order regardless of fetch completion order.
pub async fn resolve_request(
    request: &ConvertRequest,
    config: &ConvertConfig,
) -> Result<Vec<ResolvedDocument>, ConvertError> {
    let specs = document_specs(request)?;
    let names = assign_names(&specs);
    info!("resolving {} document(s)", specs.len());

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
        .build()
        .map_err(|e| ConvertError::Internal(format!("failed to build HTTP client: {e}")))?;

    let resolved = stream::iter(specs.into_iter().zip(names).map(|(spec, name)| {
        let client = client.clone();
        async move {
            let source = resolve_entry(&client, &name, &spec, config).await;
            ResolvedDocument { name, source }
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    Ok(resolved)
}

/// Normalise the three payload shapes into a list of entries.
fn document_specs(request: &ConvertRequest) -> Result<Vec<DocumentSpec>, ConvertError> {
    match (&request.documents, &request.pdf_url, &request.body) {
        (Some(docs), None, None) => {
            if docs.is_empty() {
                Err(ConvertError::InvalidRequest(
                    "'documents' must not be empty".into(),
                ))
            } else {
                Ok(docs.clone())
            }
        }
        (None, Some(url), None) => Ok(vec![DocumentSpec {
            pdf_url: Some(url.clone()),
            ..Default::default()
        }]),
        (None, None, Some(body)) => Ok(vec![DocumentSpec {
            body: Some(body.clone()),
            ..Default::default()
        }]),
        (None, None, None) => Err(ConvertError::InvalidRequest(
            "expected 'pdf_url', 'body', or 'documents'".into(),
        )),
        _ => Err(ConvertError::InvalidRequest(
            "'pdf_url', 'body', and 'documents' are mutually exclusive".into(),
        )),
    }
}

/// Assign a unique logical name to every entry.
///
/// Unnamed entries get `doc_N` (1-based batch position). Collisions are
/// disambiguated by suffixing the batch position, so later stages never need
/// to re-validate uniqueness.
fn assign_names(specs: &[DocumentSpec]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let base = spec
                .name
                .as_deref()
                .and_then(sanitize_name)
                .unwrap_or_else(|| format!("doc_{}", idx + 1));
            let mut candidate = base.clone();
            let mut bump = idx + 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{bump}");
                bump += 1;
            }
            candidate
        })
        .collect()
}

/// Make a caller-supplied name safe for use as an archive entry prefix.
///
/// Returns `None` when nothing usable remains, so the caller falls back to
/// an auto-generated name.
fn sanitize_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| matches!(c, '.' | '-' | '_')) {
        None
    } else {
        Some(cleaned)
    }
}

async fn resolve_entry(
    client: &reqwest::Client,
    name: &str,
    spec: &DocumentSpec,
    config: &ConvertConfig,
) -> Result<SourceDocument, DocumentError> {
    let (bytes, origin) = match (&spec.pdf_url, &spec.body) {
        (Some(url), None) => (fetch_pdf(client, url, config).await?, DocumentOrigin::Url),
        (None, Some(body)) => (decode_inline(body)?, DocumentOrigin::Inline),
        (Some(_), Some(_)) => {
            return Err(DocumentError::InvalidInput {
                detail: "entry has both 'pdf_url' and 'body'".into(),
            })
        }
        (None, None) => {
            return Err(DocumentError::InvalidInput {
                detail: "entry has neither 'pdf_url' nor 'body'".into(),
            })
        }
    };

    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(DocumentError::InvalidInput {
            detail: "missing %PDF header".into(),
        });
    }

    debug!("resolved '{name}': {} bytes", bytes.len());
    Ok(SourceDocument {
        name: name.to_string(),
        bytes,
        origin,
    })
}

/// Decode an inline base64 body, tolerating embedded whitespace.
fn decode_inline(body: &str) -> Result<Vec<u8>, DocumentError> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| DocumentError::InvalidInput {
            detail: format!("invalid base64: {e}"),
        })
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Fetch a PDF from a URL with the configured timeout and size ceiling.
///
/// The ceiling is enforced against both the `Content-Length` header and the
/// streamed body, so a server that lies about its length stays bounded.
async fn fetch_pdf(
    client: &reqwest::Client,
    url: &str,
    config: &ConvertConfig,
) -> Result<Vec<u8>, DocumentError> {
    if !is_url(url) {
        return Err(DocumentError::InvalidInput {
            detail: format!("not an HTTP(S) URL: '{url}'"),
        });
    }

    info!("fetching PDF from {url}");
    let fetch_err = |reason: String| DocumentError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            fetch_err(format!("timed out after {}s", config.fetch_timeout_secs))
        } else {
            fetch_err(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(fetch_err(format!("HTTP {}", response.status())));
    }

    if let Some(len) = response.content_length() {
        if len > config.max_fetch_bytes {
            return Err(fetch_err(format!(
                "content length {len} exceeds the {} byte limit",
                config.max_fetch_bytes
            )));
        }
    }

    let mut bytes: Vec<u8> = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                fetch_err(format!("timed out after {}s", config.fetch_timeout_secs))
            } else {
                fetch_err(e.to_string())
            }
        })?;
        if bytes.len() as u64 + chunk.len() as u64 > config.max_fetch_bytes {
            return Err(fetch_err(format!(
                "download exceeds the {} byte limit",
                config.max_fetch_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    debug!("downloaded {} bytes from {url}", bytes.len());
    Ok(bytes)
}
