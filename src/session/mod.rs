// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-user chat session
//!
//! Holds everything that survives between UI interactions: the active index,
//! the loaded pages and fragments, the transcript and the user's settings.
//! Every failure is converted into a human-readable message here, stored on
//! the session and rendered inline; nothing escapes to crash the server.

pub mod chat;
pub mod settings;

pub use chat::{ChatMessage, Role};
pub use settings::{SearchSettings, SettingsUpdate};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answer::{answer_for, error_message};
use crate::document::{load_pdf, retain_text_pages, DocumentError, PageDocument};
use crate::embeddings::Embedder;
use crate::storage::{safe_remove_database, unique_database_path, CleanupPolicy, DEFAULT_DB_BASE};
use crate::text::{Fragment, RecursiveCharacterSplitter, SplitError};
use crate::vector::{DistanceMetric, IndexError, VectorIndex};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Не удалось прочитать PDF: {0}")]
    Unreadable(#[source] DocumentError),

    #[error("PDF не содержит текста")]
    NoText,

    #[error("Нет страниц с текстом")]
    NoTextPages,

    #[error("Не удалось создать фрагменты")]
    NoFragments,

    #[error("Некорректные параметры разбиения: {0}")]
    Split(#[from] SplitError),

    #[error("Не удалось построить индекс: {0}")]
    Index(#[from] IndexError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AskError {
    #[error("Вопрос пуст")]
    EmptyQuestion,

    #[error("Сначала загрузите PDF-файл")]
    NoDocument,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Index directories are created as `<db_base>_<timestamp>`
    pub db_base: PathBuf,
    pub cleanup: CleanupPolicy,
    pub metric: DistanceMetric,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_base: PathBuf::from(DEFAULT_DB_BASE),
            cleanup: CleanupPolicy::default(),
            metric: DistanceMetric::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub filename: String,
    pub pages: usize,
    pub fragments: usize,
    /// Fragments were dropped to respect `max_chunks`
    pub truncated: bool,
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Indexed(IngestSummary),
    /// A document is already loaded; clear the session first
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub pages: usize,
    pub fragments: usize,
    pub total_chars: usize,
    pub avg_len: usize,
}

impl SessionStats {
    pub fn from_parts(documents: &[PageDocument], fragments: &[Fragment]) -> Self {
        let total_chars: usize = fragments.iter().map(Fragment::char_len).sum();
        let avg_len = if fragments.is_empty() {
            0
        } else {
            total_chars / fragments.len()
        };

        Self {
            pages: documents.len(),
            fragments: fragments.len(),
            total_chars,
            avg_len,
        }
    }

    /// Character count in thousands, e.g. `12K`
    pub fn total_chars_display(&self) -> String {
        format!("{}K", self.total_chars / 1000)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClearReport {
    pub active_removed: bool,
    pub leftover_removed: bool,
}

/// Serializable view of the session for the JSON API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub pdf_filename: Option<String>,
    pub processing_complete: bool,
    pub error_message: Option<String>,
    pub db_path: Option<String>,
    pub model: String,
    pub stats: Option<SessionStats>,
    pub settings: SearchSettings,
    pub chat_history: Vec<ChatMessage>,
}

pub struct Session {
    embedder: Arc<dyn Embedder>,
    config: SessionConfig,
    settings: SearchSettings,
    index: Option<VectorIndex>,
    documents: Vec<PageDocument>,
    fragments: Vec<Fragment>,
    pdf_filename: Option<String>,
    chat_history: Vec<ChatMessage>,
    processing_complete: bool,
    error_message: Option<String>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.embedder.model_name())
            .field("pdf_filename", &self.pdf_filename)
            .field("fragments", &self.fragments.len())
            .field("messages", &self.chat_history.len())
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(embedder: Arc<dyn Embedder>, config: SessionConfig) -> Self {
        Self {
            embedder,
            config,
            settings: SearchSettings::default(),
            index: None,
            documents: Vec::new(),
            fragments: Vec::new(),
            pdf_filename: None,
            chat_history: Vec::new(),
            processing_complete: false,
            error_message: None,
            db_path: None,
        }
    }

    /// Load, split, embed and index an uploaded PDF
    ///
    /// Ignored while a document is loaded. On failure the message is stored in
    /// `error_message` and no index directory is left behind.
    pub async fn ingest_pdf(
        &mut self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<IngestOutcome, IngestError> {
        if self.processing_complete {
            debug!("Ignoring upload of {}: document already loaded", filename);
            return Ok(IngestOutcome::Skipped);
        }

        info!("Processing {} ({:.1} MB)", filename, bytes.len() as f64 / 1_048_576.0);

        let pages = match load_pdf(bytes) {
            Ok(pages) => pages,
            Err(DocumentError::NoPages) => return Err(self.record_failure(IngestError::NoText)),
            Err(e) => return Err(self.record_failure(IngestError::Unreadable(e))),
        };

        self.ingest_pages(filename, pages).await
    }

    /// Same as [`ingest_pdf`](Self::ingest_pdf) for pages that are already extracted
    pub async fn ingest_pages(
        &mut self,
        filename: &str,
        pages: Vec<PageDocument>,
    ) -> Result<IngestOutcome, IngestError> {
        if self.processing_complete {
            return Ok(IngestOutcome::Skipped);
        }

        match self.build_index(filename, pages).await {
            Ok(summary) => {
                info!(
                    "Indexed {}: {} pages, {} fragments at {}",
                    summary.filename,
                    summary.pages,
                    summary.fragments,
                    summary.db_path.display()
                );
                Ok(IngestOutcome::Indexed(summary))
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    fn record_failure(&mut self, error: IngestError) -> IngestError {
        warn!("Ingest failed: {}", error);
        self.error_message = Some(error.to_string());
        error
    }

    async fn build_index(
        &mut self,
        filename: &str,
        mut pages: Vec<PageDocument>,
    ) -> Result<IngestSummary, IngestError> {
        if pages.is_empty() {
            return Err(IngestError::NoText);
        }

        for (position, page) in pages.iter_mut().enumerate() {
            page.page = position as u32 + 1;
        }

        let documents = retain_text_pages(pages);
        if documents.is_empty() {
            return Err(IngestError::NoTextPages);
        }

        let splitter =
            RecursiveCharacterSplitter::new(self.settings.chunk_size, self.settings.chunk_overlap)?;
        let mut fragments = splitter.split_documents(&documents);
        if fragments.is_empty() {
            return Err(IngestError::NoFragments);
        }

        let truncated = fragments.len() > self.settings.max_chunks;
        if truncated {
            debug!(
                "Keeping first {} of {} fragments",
                self.settings.max_chunks,
                fragments.len()
            );
            fragments.truncate(self.settings.max_chunks);
        }

        let db_path = unique_database_path(&self.config.db_base);
        let index = VectorIndex::build(
            &db_path,
            fragments.clone(),
            self.embedder.as_ref(),
            self.config.metric,
        )
        .await?;

        let summary = IngestSummary {
            filename: filename.to_string(),
            pages: documents.len(),
            fragments: fragments.len(),
            truncated,
            db_path: db_path.clone(),
        };

        self.index = Some(index);
        self.documents = documents;
        self.fragments = fragments;
        self.pdf_filename = Some(filename.to_string());
        self.processing_complete = true;
        self.error_message = None;
        self.db_path = Some(db_path);

        Ok(summary)
    }

    /// Search the index and append the question and reply to the transcript
    ///
    /// Search failures become an inline error reply rather than an `Err`.
    pub async fn ask(&mut self, question: &str) -> Result<ChatMessage, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let index = match (&self.index, self.processing_complete) {
            (Some(index), true) => index,
            _ => return Err(AskError::NoDocument),
        };

        self.chat_history.push(ChatMessage::user(question));

        let reply = match index
            .similarity_search_with_relevance_scores(
                question,
                self.embedder.as_ref(),
                self.settings.k_results,
            )
            .await
        {
            Ok(results) => {
                debug!("Search returned {} results", results.len());
                answer_for(results, self.settings.min_relevance)
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                error_message(&e)
            }
        };

        let message = ChatMessage::bot(reply);
        self.chat_history.push(message.clone());
        Ok(message)
    }

    /// Reset every field and remove index directories
    ///
    /// Removes the active index and any leftover directory named exactly
    /// after the base path. Settings are kept.
    pub async fn clear_all(&mut self) -> ClearReport {
        let active = self.db_path.take();

        self.index = None;
        self.documents.clear();
        self.fragments.clear();
        self.pdf_filename = None;
        self.chat_history.clear();
        self.processing_complete = false;
        self.error_message = None;

        let active_removed = match active {
            Some(path) => safe_remove_database(&path, &self.config.cleanup).await,
            None => true,
        };
        let leftover_removed = safe_remove_database(&self.config.db_base, &self.config.cleanup).await;

        info!("Session cleared");
        ClearReport {
            active_removed,
            leftover_removed,
        }
    }

    pub fn update_settings(&mut self, update: &SettingsUpdate) {
        self.settings.apply(update);
        debug!("Settings updated: {:?}", self.settings);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn stats(&self) -> Option<SessionStats> {
        self.processing_complete
            .then(|| SessionStats::from_parts(&self.documents, &self.fragments))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            pdf_filename: self.pdf_filename.clone(),
            processing_complete: self.processing_complete,
            error_message: self.error_message.clone(),
            db_path: self.db_path.as_ref().map(|p| p.display().to_string()),
            model: self.embedder.model_name().to_string(),
            stats: self.stats(),
            settings: self.settings.clone(),
            chat_history: self.chat_history.clone(),
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn is_ready(&self) -> bool {
        self.processing_complete
    }

    pub fn pdf_filename(&self) -> Option<&str> {
        self.pdf_filename.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn documents(&self) -> &[PageDocument] {
        &self.documents
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn db_base(&self) -> &Path {
        &self.config.db_base
    }
}
