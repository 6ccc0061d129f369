//! Archive assembly: write every produced page into a single ZIP.
//!
//! Entry names are a pure function of (document name, page index, batch
//! size): a single-document batch keeps the simple `page_NNNN.jpg` scheme,
//! a multi-document batch prefixes the disambiguated document name. The
//! input resolver guarantees unique names, so entries never collide.
//!
//! The writer uses the zip crate's fixed default timestamp, so re-running the
//! same batch yields a byte-identical archive.

use crate::error::ConvertError;
use crate::output::DocumentResult;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Assemble the archive, or `None` when no document produced any image.
///
/// Entries are written in result order (input order), and within a document
/// in page order.
pub fn build_archive(results: &[DocumentResult]) -> Result<Option<Vec<u8>>, ConvertError> {
    let total: usize = results.iter().map(|r| r.images.len()).sum();
    if total == 0 {
        return Ok(None);
    }

    let multi_document = results.len() > 1;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for result in results {
        for image in &result.images {
            let entry = entry_name(&result.name, image.page_index, multi_document);
            zip.start_file(entry.as_str(), options)?;
            zip.write_all(&image.bytes)
                .map_err(|source| ConvertError::ArchiveWrite { entry, source })?;
        }
    }

    let cursor = zip.finish()?;
    debug!(
        "archive assembled: {total} entries, {} bytes",
        cursor.get_ref().len()
    );
    Ok(Some(cursor.into_inner()))
}

/// The archive entry name for one page.
///
/// 1-based, zero-padded page numbers keep entries in page order under naive
/// lexicographic listing.
pub fn entry_name(name: &str, page_index: usize, multi_document: bool) -> String {
    if multi_document {
        format!("{name}_page_{:04}.jpg", page_index + 1)
    } else {
        format!("page_{:04}.jpg", page_index + 1)
    }
}
