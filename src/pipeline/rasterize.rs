//! Per-document rasterisation: drive the engine capability over one document.
//!
//! ## Why spawn_blocking?
//!
//! [`ConvertEngine::convert`] is blocking by contract (pdfium is CPU-bound
//! and not async-safe). `tokio::task::spawn_blocking` moves the work onto the
//! blocking thread pool so the async workers keep scheduling sibling
//! documents, and turns an engine panic into a `JoinError` this stage maps to
//! that document's failure instead of tearing down the batch.
//!
//! Note the timeout below stops *waiting*, not the blocking call itself; the
//! thread finishes (or dies with the process) in the background. That bounds
//! invocation latency, which is the contract here.

use crate::config::{ConversionQuality, ConvertConfig};
use crate::engine::ConvertEngine;
use crate::error::DocumentError;
use crate::output::{PageImage, ResourceLimit, SourceDocument};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What one document's rasterisation produced.
#[derive(Debug)]
pub struct RasterOutcome {
    /// Pages in `page_index` order, contiguous from 0.
    pub images: Vec<PageImage>,
    /// Present when a ceiling truncated the output.
    pub truncation: Option<ResourceLimit>,
}

/// Rasterise one document, enforcing the per-document timeout and ceilings.
///
/// A zero-page document succeeds with empty `images`.
pub async fn rasterize_document(
    engine: Arc<dyn ConvertEngine>,
    document: SourceDocument,
    quality: ConversionQuality,
    config: &ConvertConfig,
) -> Result<RasterOutcome, DocumentError> {
    let name = document.name;
    let bytes = document.bytes;

    let task = tokio::task::spawn_blocking(move || engine.convert(&bytes, &quality));
    let timeout = Duration::from_secs(config.convert_timeout_secs);
    let output = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| DocumentError::Timeout {
            secs: config.convert_timeout_secs,
        })?
        .map_err(|e| DocumentError::Internal {
            detail: format!("rasterisation task panicked: {e}"),
        })?
        .map_err(DocumentError::from)?;

    let mut truncation = None;
    let mut pages = output.images;

    // engines should stop at page_limit themselves; enforce it regardless
    if pages.len() > quality.page_limit {
        pages.truncate(quality.page_limit);
    }
    if output.total_pages > pages.len() {
        warn!(
            "document '{name}': rendered {}/{} pages (limit {})",
            pages.len(),
            output.total_pages,
            quality.page_limit
        );
        truncation = Some(ResourceLimit::PageCount);
    }

    // byte ceiling: keep whole pages while the running total fits
    let mut images = Vec::with_capacity(pages.len());
    let mut total_bytes: u64 = 0;
    for (page_index, jpeg) in pages.into_iter().enumerate() {
        total_bytes += jpeg.len() as u64;
        if total_bytes > config.max_image_bytes_per_document {
            warn!(
                "document '{name}': image bytes exceed the {} byte limit, truncating at page {page_index}",
                config.max_image_bytes_per_document
            );
            truncation = Some(ResourceLimit::ImageBytes);
            break;
        }
        images.push(PageImage {
            source_name: name.clone(),
            page_index,
            bytes: jpeg,
        });
    }

    debug!("document '{name}': {} page(s) rasterised", images.len());
    Ok(RasterOutcome { images, truncation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use crate::error::EngineError;

    /// Engine returning a fixed number of fixed-size pages, or failing.
    struct FixedEngine {
        pages: usize,
        total_pages: usize,
        page_bytes: usize,
        fail: Option<fn() -> EngineError>,
        delay: Option<Duration>,
    }

    impl FixedEngine {
        fn pages(n: usize) -> Self {
            Self {
                pages: n,
                total_pages: n,
                page_bytes: 16,
                fail: None,
                delay: None,
            }
        }
    }

    impl ConvertEngine for FixedEngine {
        fn convert(
            &self,
            _bytes: &[u8],
            quality: &ConversionQuality,
        ) -> Result<EngineOutput, EngineError> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            let rendered = self.pages.min(quality.page_limit);
            Ok(EngineOutput {
                images: (0..rendered).map(|_| vec![0u8; self.page_bytes]).collect(),
                total_pages: self.total_pages,
            })
        }
    }

    fn doc(name: &str) -> SourceDocument {
        SourceDocument {
            name: name.to_string(),
            bytes: b"%PDF-1.7\n".to_vec(),
            origin: crate::output::DocumentOrigin::Inline,
        }
    }

    #[tokio::test]
    async fn zero_pages_is_success_not_error() {
        let config = ConvertConfig::default();
        let outcome = rasterize_document(
            Arc::new(FixedEngine::pages(0)),
            doc("empty"),
            config.quality(),
            &config,
        )
        .await
        .expect("zero pages must succeed");
        assert!(outcome.images.is_empty());
        assert!(outcome.truncation.is_none());
    }

    #[tokio::test]
    async fn page_indices_contiguous_from_zero() {
        let config = ConvertConfig::default();
        let outcome = rasterize_document(
            Arc::new(FixedEngine::pages(3)),
            doc("a"),
            config.quality(),
            &config,
        )
        .await
        .expect("converts");
        let indices: Vec<usize> = outcome.images.iter().map(|i| i.page_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(outcome.images.iter().all(|i| i.source_name == "a"));
    }

    #[tokio::test]
    async fn page_limit_truncates_and_is_reported() {
        let config = ConvertConfig::builder()
            .max_pages_per_document(2)
            .build()
            .unwrap();
        let outcome = rasterize_document(
            Arc::new(FixedEngine::pages(5)),
            doc("big"),
            config.quality(),
            &config,
        )
        .await
        .expect("converts");
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(outcome.truncation, Some(ResourceLimit::PageCount));
    }

    #[tokio::test]
    async fn byte_ceiling_keeps_whole_pages() {
        let config = ConvertConfig::builder()
            .max_image_bytes_per_document(40)
            .build()
            .unwrap();
        let engine = FixedEngine {
            page_bytes: 16,
            ..FixedEngine::pages(5)
        };
        // 16 + 16 = 32 fits, a third page would make 48 > 40
        let outcome = rasterize_document(Arc::new(engine), doc("fat"), config.quality(), &config)
            .await
            .expect("converts");
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(outcome.truncation, Some(ResourceLimit::ImageBytes));
    }

    #[tokio::test]
    async fn engine_failure_maps_to_conversion_error() {
        let config = ConvertConfig::default();
        let engine = FixedEngine {
            fail: Some(|| EngineError::Corrupt {
                detail: "bad xref".into(),
            }),
            ..FixedEngine::pages(1)
        };
        let err = rasterize_document(Arc::new(engine), doc("bad"), config.quality(), &config)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), "corrupt");
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let config = ConvertConfig::builder().convert_timeout_secs(1).build().unwrap();
        let engine = FixedEngine {
            delay: Some(Duration::from_millis(1500)),
            ..FixedEngine::pages(1)
        };
        let err = rasterize_document(Arc::new(engine), doc("slow"), config.quality(), &config)
            .await
            .expect_err("must time out");
        assert!(matches!(err, DocumentError::Timeout { secs: 1 }));
    }
}
