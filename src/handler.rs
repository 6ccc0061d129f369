//! Top-level entry points: one invocation, request to response.
//!
//! [`handle`] is the boundary the hosting transport calls: it never fails,
//! mapping fatal errors to a 4xx/5xx envelope instead. [`convert_batch`] is
//! the library-level path for callers that already hold resolved document
//! bytes and want the [`BatchResult`] rather than the wire envelope.

use crate::config::{ConversionQuality, ConvertConfig};
use crate::engine::ConvertEngine;
use crate::error::ConvertError;
use crate::output::{BatchResult, SourceDocument};
use crate::pipeline::{archive, batch, input};
use crate::response::{self, ConvertResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Process one invocation payload and produce the response envelope.
///
/// Never returns an error: fatal faults become a 4xx/5xx envelope with an
/// `error` message, per-document faults are reported in `results`.
pub async fn handle(
    event: serde_json::Value,
    engine: Arc<dyn ConvertEngine>,
    config: &ConvertConfig,
) -> ConvertResponse {
    match run(event, engine, config).await {
        Ok(batch) => response::encode_response(&batch),
        Err(error) => {
            warn!("invocation failed: {error}");
            response::error_response(&error)
        }
    }
}

/// Synchronous wrapper around [`handle`].
///
/// Creates a temporary tokio runtime internally.
pub fn handle_sync(
    event: serde_json::Value,
    engine: Arc<dyn ConvertEngine>,
    config: &ConvertConfig,
) -> Result<ConvertResponse, ConvertError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("failed to create tokio runtime: {e}")))?;
    Ok(runtime.block_on(handle(event, engine, config)))
}

/// Convert already-resolved documents into a [`BatchResult`].
///
/// Callers must supply documents with unique names — [`handle`] gets that
/// guarantee from the input resolver; library callers own it here.
pub async fn convert_batch(
    documents: Vec<SourceDocument>,
    engine: Arc<dyn ConvertEngine>,
    quality: ConversionQuality,
    config: &ConvertConfig,
) -> Result<BatchResult, ConvertError> {
    let resolved = documents
        .into_iter()
        .map(|document| input::ResolvedDocument {
            name: document.name.clone(),
            source: Ok(document),
        })
        .collect();
    let results = batch::run_batch(resolved, engine, quality, config).await;
    let archive = archive::build_archive(&results)?;
    Ok(BatchResult { results, archive })
}

async fn run(
    event: serde_json::Value,
    engine: Arc<dyn ConvertEngine>,
    config: &ConvertConfig,
) -> Result<BatchResult, ConvertError> {
    let started = Instant::now();

    let request = input::parse_request(event)?;
    let quality = input::quality_for(&request, config)?;
    let documents = input::resolve_request(&request, config).await?;

    let results = batch::run_batch(documents, engine, quality, config).await;
    let archive = archive::build_archive(&results)?;
    let batch = BatchResult { results, archive };

    info!(
        "invocation complete in {}ms: {}/{} document(s) ok, archive: {}",
        started.elapsed().as_millis(),
        batch.ok_count(),
        batch.results.len(),
        batch.archive.is_some()
    );
    Ok(batch)
}
