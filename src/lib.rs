//! # pdf2zip
//!
//! Convert PDF documents to JPEG page images packaged as a single ZIP
//! archive, as a stateless request/response pipeline.
//!
//! ## Why this crate?
//!
//! Turning "a PDF" into "its pages as images" sounds trivial until a batch
//! arrives: one corrupt document must not sink its siblings, output order
//! must not depend on which rasterisation finished first, archive entry
//! names must never collide, and a slow or adversarial input must not stall
//! the whole invocation. This crate packages those decisions behind a single
//! request/response call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request (JSON)
//!  │
//!  ├─ 1. Input     base64 bodies decoded, URLs fetched (bounded time/size),
//!  │               names disambiguated
//!  ├─ 2. Batch     bounded fan-out, per-document isolation, input-order output
//!  ├─ 3. Rasterize engine capability in spawn_blocking, page/byte ceilings
//!  ├─ 4. Archive   deterministic ZIP entry names, input-order entries
//!  └─ 5. Response  {statusCode, isBase64Encoded, body, results[]}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2zip::{handle, ConvertConfig, PdfiumEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ConvertConfig::default();
//!     let event = serde_json::json!({
//!         "documents": [
//!             {"name": "report", "pdf_url": "https://example.com/report.pdf"},
//!         ],
//!         "quality": 90
//!     });
//!     let response = handle(event, Arc::new(PdfiumEngine), &config).await;
//!     println!("statusCode: {}", response.status_code);
//!     for doc in &response.results {
//!         println!("{}: {:?} ({} pages)", doc.name, doc.status, doc.page_count);
//!     }
//! }
//! ```
//!
//! ## Swapping the engine
//!
//! Rasterisation is a capability ([`ConvertEngine`]), not a hard-wired
//! dependency. [`PdfiumEngine`] is the production implementation; tests drive
//! the pipeline with scripted engines and no pdfium binary at all.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2zip` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod output;
pub mod pipeline;
pub mod response;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionQuality, ConvertConfig, ConvertConfigBuilder};
pub use engine::{ConvertEngine, EngineOutput, PdfiumEngine};
pub use error::{ConversionReason, ConvertError, DocumentError, EngineError};
pub use handler::{convert_batch, handle, handle_sync};
pub use output::{
    BatchResult, DocumentOrigin, DocumentResult, DocumentStatus, PageImage, ResourceLimit,
    SourceDocument,
};
pub use pipeline::input::{ConvertRequest, DocumentSpec, ResolvedDocument};
pub use response::{ConvertResponse, DocumentSummary};
