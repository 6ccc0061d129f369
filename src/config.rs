//! Configuration types for the conversion pipeline.
//!
//! All pipeline behaviour is controlled through [`ConvertConfig`], built via
//! its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks and to diff two runs to understand
//! why their outputs differ.
//!
//! [`ConversionQuality`] is the read-only slice of the config (plus any
//! per-request overrides) that travels with every document task and down into
//! the engine capability.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one invocation of the conversion pipeline.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2zip::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .jpeg_quality(90)
///     .dpi(200)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// JPEG encoding quality. Range: 1–100. Default: 85.
    pub jpeg_quality: u8,

    /// Rendering DPI used when rasterising each page. Default: 150.
    ///
    /// 150 DPI keeps text legible while holding per-page JPEG sizes well
    /// below typical response-size ceilings. Per-request `dpi` overrides this.
    pub dpi: u32,

    /// Maximum rendered dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI: a 300-DPI render of an A0 poster
    /// would otherwise allocate a 10 000 × 14 000 px bitmap. The cap bounds
    /// either edge, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// Number of documents rasterised concurrently. Default: 3.
    ///
    /// Rasterisation is CPU-bound and each in-flight document holds its
    /// decoded pages in memory, so this is a memory cap as much as a CPU one.
    pub concurrency: usize,

    /// Timeout for each URL fetch in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Maximum bytes accepted from a URL fetch. Default: 32 MiB.
    ///
    /// Enforced against both the `Content-Length` header and the streamed
    /// body, so a server that lies about its length is still bounded.
    pub max_fetch_bytes: u64,

    /// Per-document page-count ceiling. Default: 500.
    ///
    /// Documents with more pages are truncated, not failed; the truncation is
    /// reported on that document's result.
    pub max_pages_per_document: usize,

    /// Per-document ceiling on total produced JPEG bytes. Default: 64 MiB.
    ///
    /// Bounds worst-case response size. Like the page ceiling this truncates
    /// at the last whole page that fits rather than failing the document.
    pub max_image_bytes_per_document: u64,

    /// Per-document rasterisation timeout in seconds. Default: 120.
    pub convert_timeout_secs: u64,

    /// Soft deadline for the whole invocation, measured from batch start.
    /// Default: none.
    ///
    /// When set, documents not yet dispatched at expiry are reported as
    /// `not_processed` instead of being silently dropped. Typically derived
    /// from the hosting platform's remaining execution time.
    pub time_budget: Option<Duration>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            dpi: 150,
            max_rendered_pixels: 4000,
            concurrency: 3,
            fetch_timeout_secs: 30,
            max_fetch_bytes: 32 * 1024 * 1024,
            max_pages_per_document: 500,
            max_image_bytes_per_document: 64 * 1024 * 1024,
            convert_timeout_secs: 120,
            time_budget: None,
        }
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }

    /// The quality parameters shared read-only across a batch.
    pub fn quality(&self) -> ConversionQuality {
        ConversionQuality {
            jpeg_quality: self.jpeg_quality,
            dpi: self.dpi,
            max_rendered_pixels: self.max_rendered_pixels,
            page_limit: self.max_pages_per_document,
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(1, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn max_fetch_bytes(mut self, bytes: u64) -> Self {
        self.config.max_fetch_bytes = bytes;
        self
    }

    pub fn max_pages_per_document(mut self, n: usize) -> Self {
        self.config.max_pages_per_document = n.max(1);
        self
    }

    pub fn max_image_bytes_per_document(mut self, bytes: u64) -> Self {
        self.config.max_image_bytes_per_document = bytes;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = Some(budget);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "jpeg_quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.dpi == 0 {
            return Err(ConvertError::InvalidConfig("dpi must be ≥ 1".into()));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.fetch_timeout_secs == 0 || c.convert_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Quality parameters for rasterising one document.
///
/// Assembled once per request from [`ConvertConfig`] plus the optional
/// request-level `quality`/`dpi` overrides, then shared read-only across all
/// documents in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionQuality {
    /// JPEG encoding quality, 1–100.
    pub jpeg_quality: u8,
    /// Rendering resolution in dots per inch.
    pub dpi: u32,
    /// Cap on either rendered dimension in pixels.
    pub max_rendered_pixels: u32,
    /// Pages beyond this index are not rendered. Engines should stop early
    /// but must still report the document's true page count.
    pub page_limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConvertConfig::builder().build().expect("defaults build");
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.dpi, 150);
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let config = ConvertConfig::builder()
            .jpeg_quality(250)
            .dpi(10_000)
            .concurrency(0)
            .max_pages_per_document(0)
            .build()
            .expect("clamped values build");
        assert_eq!(config.jpeg_quality, 100);
        assert_eq!(config.dpi, 600);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_pages_per_document, 1);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ConvertConfig::builder()
            .fetch_timeout_secs(0)
            .build()
            .expect_err("zero timeout must not build");
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn quality_snapshot_tracks_config() {
        let config = ConvertConfig::builder()
            .jpeg_quality(70)
            .dpi(96)
            .max_pages_per_document(10)
            .build()
            .unwrap();
        let quality = config.quality();
        assert_eq!(quality.jpeg_quality, 70);
        assert_eq!(quality.dpi, 96);
        assert_eq!(quality.page_limit, 10);
    }
}
