//! In-process PDF page operations built on `lopdf`.
//!
//! This crate provides the built-in alternatives to the external
//! rescaling and splitting scripts:
//! - [`rescale`]: fit every page onto a new page size
//! - [`split`]: cut a document into chapter files by a fixed page layout

pub mod rescale;
pub mod split;

use std::path::Path;

use bookrelease_shared::{BookReleaseError, Result};
use lopdf::Document;

pub use rescale::rescale_pdf;
pub use split::split_chapters;

/// Load a PDF from disk.
pub(crate) fn load(path: &Path) -> Result<Document> {
    Document::load(path)
        .map_err(|e| BookReleaseError::Pdf(format!("failed to load {}: {e}", path.display())))
}

/// Save a document, creating the file.
pub(crate) fn save(doc: &mut Document, path: &Path) -> Result<()> {
    doc.save(path)
        .map_err(|e| BookReleaseError::Pdf(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}
