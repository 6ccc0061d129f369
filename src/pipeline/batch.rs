//! Batch coordination: run every document with bounded concurrency.
//!
//! ## Ordering
//!
//! `buffer_unordered` yields completions in arbitrary order, so each task
//! carries its batch index and the collected results are sorted back into
//! input order. Output order is therefore a pure function of input order,
//! never an accident of scheduling.
//!
//! ## Isolation
//!
//! Every failure mode of a single document — resolution error carried in from
//! the input stage, engine fault, timeout, panic — is absorbed into that
//! document's [`DocumentResult`]. Nothing a document does can cancel or fail
//! a sibling. There is no retry: a failed document is reported failed exactly
//! once; retry policy belongs to the caller.

use crate::config::{ConversionQuality, ConvertConfig};
use crate::engine::ConvertEngine;
use crate::output::{DocumentResult, DocumentStatus};
use crate::pipeline::input::ResolvedDocument;
use crate::pipeline::rasterize;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the rasteriser over all resolved documents.
///
/// Returns one [`DocumentResult`] per input, in input order. At most
/// `config.concurrency` documents are in flight at once; the rest queue in
/// input order. When `config.time_budget` is set, documents whose turn comes
/// after the budget expires are flagged `not_processed` rather than silently
/// dropped.
pub async fn run_batch(
    documents: Vec<ResolvedDocument>,
    engine: Arc<dyn ConvertEngine>,
    quality: ConversionQuality,
    config: &ConvertConfig,
) -> Vec<DocumentResult> {
    let deadline = config.time_budget.map(|budget| Instant::now() + budget);
    let total = documents.len();

    let mut completed: Vec<(usize, DocumentResult)> =
        stream::iter(documents.into_iter().enumerate().map(|(index, document)| {
            let engine = Arc::clone(&engine);
            async move {
                let result = process_document(document, engine, quality, config, deadline).await;
                (index, result)
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    // completions arrive in arbitrary order; reassemble input order
    completed.sort_by_key(|(index, _)| *index);
    let results: Vec<DocumentResult> = completed.into_iter().map(|(_, result)| result).collect();

    let ok = results
        .iter()
        .filter(|r| r.status == DocumentStatus::Ok)
        .count();
    info!("batch complete: {ok}/{total} document(s) ok");
    results
}

/// One document's whole lifecycle, with every failure caught at this boundary.
async fn process_document(
    document: ResolvedDocument,
    engine: Arc<dyn ConvertEngine>,
    quality: ConversionQuality,
    config: &ConvertConfig,
    deadline: Option<Instant>,
) -> DocumentResult {
    let name = document.name;

    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!("document '{name}': time budget exhausted before dispatch");
        return DocumentResult::not_processed(name);
    }

    let source = match document.source {
        Ok(source) => source,
        Err(error) => {
            warn!("document '{name}': {error}");
            return DocumentResult::failed(name, error);
        }
    };

    match rasterize::rasterize_document(engine, source, quality, config).await {
        Ok(outcome) => {
            debug!("document '{name}': ok, {} page(s)", outcome.images.len());
            DocumentResult::ok(name, outcome.images, outcome.truncation)
        }
        Err(error) => {
            warn!("document '{name}': {error}");
            DocumentResult::failed(name, error)
        }
    }
}
