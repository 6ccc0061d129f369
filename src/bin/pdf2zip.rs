//! CLI binary for pdf2zip.
//!
//! A thin shim over the library crate: reads an invocation payload from a
//! file or stdin, runs the pipeline with the pdfium engine, and writes the
//! response envelope JSON.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use pdf2zip::{handle, ConvertConfig, PdfiumEngine};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pdf2zip",
    version,
    about = "Convert PDF documents to JPEG page images packaged as a ZIP archive"
)]
struct Cli {
    /// Request JSON file ('-' reads stdin)
    input: PathBuf,

    /// Write the response envelope here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decode the archive from the response and write it to this path
    #[arg(long, value_name = "FILE")]
    extract_zip: Option<PathBuf>,

    /// JPEG quality 1-100 (a request-level 'quality' still wins)
    #[arg(long, default_value_t = 85)]
    quality: u8,

    /// Rendering DPI (a request-level 'dpi' still wins)
    #[arg(long, default_value_t = 150)]
    dpi: u32,

    /// Documents rasterised concurrently
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// URL fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,

    /// Per-document conversion timeout in seconds
    #[arg(long, default_value_t = 120)]
    convert_timeout: u64,

    /// Soft deadline for the whole invocation in seconds
    #[arg(long)]
    time_budget: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&cli.input)
            .with_context(|| format!("failed to read request file '{}'", cli.input.display()))?
    };
    let event: serde_json::Value =
        serde_json::from_str(&raw).context("request is not valid JSON")?;

    let mut builder = ConvertConfig::builder()
        .jpeg_quality(cli.quality)
        .dpi(cli.dpi)
        .concurrency(cli.concurrency)
        .fetch_timeout_secs(cli.fetch_timeout)
        .convert_timeout_secs(cli.convert_timeout);
    if let Some(secs) = cli.time_budget {
        builder = builder.time_budget(Duration::from_secs(secs));
    }
    let config = builder.build()?;

    let response = handle(event, Arc::new(PdfiumEngine), &config).await;

    if let Some(path) = &cli.extract_zip {
        match &response.body {
            Some(body) => {
                let bytes = STANDARD
                    .decode(body)
                    .context("response body is not valid base64")?;
                std::fs::write(path, bytes)
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                eprintln!("wrote archive to {}", path.display());
            }
            None => eprintln!(
                "no archive produced (statusCode {})",
                response.status_code
            ),
        }
    }

    let json = serde_json::to_string_pretty(&response).context("failed to serialise response")?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{json}"),
    }

    if response.status_code >= 400 {
        bail!("invocation failed with statusCode {}", response.status_code);
    }
    Ok(())
}
