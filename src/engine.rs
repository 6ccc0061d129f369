//! The rasterisation capability and its pdfium-backed implementation.
//!
//! ## Why a trait?
//!
//! The pipeline treats page rasterisation as a black box: PDF bytes plus a
//! [`ConversionQuality`] in, ordered JPEG buffers out. Modelling that as the
//! [`ConvertEngine`] trait lets tests drive the batch machinery with scripted
//! engines (failures, delays, page counts) without a pdfium binary, and lets
//! embedders swap in a different renderer without touching the pipeline.
//!
//! ## Why blocking?
//!
//! pdfium wraps a C++ library with thread-local state that must not be called
//! from async contexts. The trait is therefore synchronous by contract and
//! the pipeline wraps every call in `tokio::task::spawn_blocking`
//! (see [`crate::pipeline::rasterize`]).

use crate::config::ConversionQuality;
use crate::error::EngineError;
use image::codecs::jpeg::JpegEncoder;
use pdfium_render::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Everything an engine reports for one document.
#[derive(Debug)]
pub struct EngineOutput {
    /// JPEG-encoded pages in page order. May be shorter than `total_pages`
    /// when the engine stopped at [`ConversionQuality::page_limit`].
    pub images: Vec<Vec<u8>>,
    /// The document's true page count, regardless of how many were rendered.
    pub total_pages: usize,
}

/// The page-rasterisation capability consumed by the pipeline.
pub trait ConvertEngine: Send + Sync {
    /// Rasterise every page of `bytes` to JPEG at the given quality.
    ///
    /// A zero-page document is a valid success (empty `images`), not an
    /// error. Implementations may stop rendering at `quality.page_limit` but
    /// must report the true `total_pages` so truncation can be surfaced.
    fn convert(&self, bytes: &[u8], quality: &ConversionQuality)
        -> Result<EngineOutput, EngineError>;
}

/// Production engine backed by pdfium.
#[derive(Debug, Default)]
pub struct PdfiumEngine;

impl ConvertEngine for PdfiumEngine {
    fn convert(
        &self,
        bytes: &[u8],
        quality: &ConversionQuality,
    ) -> Result<EngineOutput, EngineError> {
        let pdfium = Pdfium::default();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(classify_load_error)?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        let render_count = total_pages.min(quality.page_limit);
        debug!("loaded PDF: {total_pages} pages, rendering {render_count}");

        let mut images = Vec::with_capacity(render_count);

        for idx in 0..render_count {
            let page = pages.get(idx as u16).map_err(|e| EngineError::Render {
                page: idx,
                detail: format!("{e:?}"),
            })?;

            let render_config = render_config_for(&page, quality);
            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| EngineError::Render {
                        page: idx,
                        detail: format!("{e:?}"),
                    })?;

            let image = bitmap.as_image();
            let mut buf = Vec::new();
            let encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.jpeg_quality);
            // pdfium hands back RGBA; JPEG has no alpha channel
            image::DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| EngineError::Render {
                    page: idx,
                    detail: format!("JPEG encoding failed: {e}"),
                })?;

            debug!(
                "rendered page {} → {}x{} px, {} bytes JPEG",
                idx + 1,
                image.width(),
                image.height(),
                buf.len()
            );
            images.push(buf);
        }

        Ok(EngineOutput {
            images,
            total_pages,
        })
    }
}

/// Pixel target from the page's physical size at the requested DPI, capped so
/// oversized pages cannot exhaust memory.
fn render_config_for(page: &PdfPage, quality: &ConversionQuality) -> PdfRenderConfig {
    let width_px = (page.width().value / 72.0 * quality.dpi as f32).round() as i32;
    let target_width = width_px.clamp(1, quality.max_rendered_pixels as i32);
    PdfRenderConfig::new()
        .set_target_width(target_width)
        .set_maximum_height(quality.max_rendered_pixels as i32)
}

fn classify_load_error(e: PdfiumError) -> EngineError {
    let detail = format!("{e:?}");
    if detail.contains("Password") || detail.contains("password") {
        EngineError::Encrypted
    } else if detail.contains("Unsupported") {
        EngineError::Unsupported { detail }
    } else {
        EngineError::Corrupt { detail }
    }
}
