// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF-to-text loader backed by lopdf

use lopdf::Document;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::PageDocument;

/// Pages with this many trimmed characters or fewer carry no usable text
/// (headers, page numbers, scanned images without OCR)
pub const MIN_PAGE_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("PDF has no pages")]
    NoPages,

    #[error("Failed to read PDF file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load every page of a PDF held in memory
///
/// Pages whose text cannot be decoded are kept with empty content so page
/// numbering stays aligned with the file.
///
/// # Errors
/// - [`DocumentError::Parse`] if the bytes are not a readable PDF
/// - [`DocumentError::Encrypted`] for password-protected files
/// - [`DocumentError::NoPages`] if the document has no pages at all
pub fn load_pdf(bytes: &[u8]) -> Result<Vec<PageDocument>, DocumentError> {
    let document = Document::load_mem(bytes).map_err(|e| DocumentError::Parse(e.to_string()))?;

    if document.is_encrypted() {
        return Err(DocumentError::Encrypted);
    }

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(DocumentError::NoPages);
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for (position, page_number) in page_numbers.iter().enumerate() {
        let content = match document.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_number, e);
                String::new()
            }
        };
        pages.push(PageDocument::new(position as u32 + 1, content));
    }

    info!(
        "Loaded PDF: {} pages, {} characters",
        pages.len(),
        pages.iter().map(PageDocument::char_len).sum::<usize>()
    );

    Ok(pages)
}

/// Load a PDF from disk
pub fn load_pdf_file<P: AsRef<Path>>(path: P) -> Result<Vec<PageDocument>, DocumentError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_pdf(&bytes)
}

/// Drop pages without meaningful text
pub fn retain_text_pages(pages: Vec<PageDocument>) -> Vec<PageDocument> {
    let total = pages.len();
    let kept: Vec<PageDocument> = pages
        .into_iter()
        .filter(|p| p.content.trim().chars().count() > MIN_PAGE_CHARS)
        .collect();

    debug!("Kept {} of {} pages with text", kept.len(), total);
    kept
}
