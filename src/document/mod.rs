// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF document loading
//!
//! Turns an uploaded PDF into one [`PageDocument`] per page. Page numbers are
//! 1-based and follow the page's position in the file.

pub mod loader;

pub use loader::{load_pdf, load_pdf_file, retain_text_pages, DocumentError, MIN_PAGE_CHARS};

use serde::{Deserialize, Serialize};

/// Extracted text of one PDF page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    /// 1-based page number
    pub page: u32,
    pub content: String,
}

impl PageDocument {
    pub fn new(page: u32, content: impl Into<String>) -> Self {
        Self {
            page,
            content: content.into(),
        }
    }

    /// Length of the page text in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
