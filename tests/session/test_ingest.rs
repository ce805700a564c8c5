// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Upload pipeline: extraction, filtering, splitting, indexing

use crate::common::{
    dir_entries, hash_session, pdf_with_pages, session_config, study_notes_pdf, BIOLOGY_PAGE,
    HISTORY_PAGE,
};
use anyhow::anyhow;
use async_trait::async_trait;
use pdf_chat::embeddings::Embedder;
use pdf_chat::session::SettingsUpdate;
use pdf_chat::vector::{MANIFEST_FILE, VECTORS_FILE};
use pdf_chat::{IngestError, IngestOutcome, Session, VectorIndex};
use std::sync::Arc;
use tempfile::TempDir;

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        8
    }

    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow!("model crashed"))
    }
}

#[tokio::test]
async fn test_ingest_builds_persisted_index() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);

    let outcome = tokio_test::assert_ok!(session.ingest_pdf("notes.pdf", &study_notes_pdf()).await);
    let summary = match outcome {
        IngestOutcome::Indexed(summary) => summary,
        IngestOutcome::Skipped => panic!("first upload must be indexed"),
    };

    assert_eq!(summary.filename, "notes.pdf");
    assert_eq!(summary.pages, 3);
    assert!(!summary.truncated);
    assert!(session.is_ready());
    assert_eq!(session.pdf_filename(), Some("notes.pdf"));
    assert!(session.error_message().is_none());

    let db_path = session.db_path().unwrap().to_path_buf();
    assert_eq!(db_path, summary.db_path);
    assert!(db_path.join(MANIFEST_FILE).exists());
    assert!(db_path.join(VECTORS_FILE).exists());
    let dir_name = db_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(dir_name.starts_with("vector_db_"));
    assert_eq!(dir_name.len(), "vector_db_".len() + "YYYYMMDD_HHMMSS".len());

    let reopened = VectorIndex::open(&db_path).unwrap();
    assert_eq!(reopened.len(), summary.fragments);
    assert_eq!(reopened.manifest().model, "hash-128");
}

#[tokio::test]
async fn test_pages_numbered_by_position() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    let pdf = pdf_with_pages(&["", BIOLOGY_PAGE, HISTORY_PAGE]);

    session.ingest_pdf("notes.pdf", &pdf).await.unwrap();

    let pages: Vec<u32> = session.documents().iter().map(|d| d.page).collect();
    assert_eq!(pages, vec![2, 3]);
    assert!(session.fragments().iter().all(|f| f.page == 2 || f.page == 3));
}

#[tokio::test]
async fn test_pdf_without_text_leaves_no_index() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    let pdf = pdf_with_pages(&["", "too short"]);

    let result = session.ingest_pdf("scan.pdf", &pdf).await;

    assert!(matches!(result, Err(IngestError::NoTextPages)));
    assert_eq!(session.error_message(), Some("Нет страниц с текстом"));
    assert!(!session.is_ready());
    assert!(session.db_path().is_none());
    assert!(dir_entries(temp.path()).is_empty());
}

#[tokio::test]
async fn test_embedding_failure_leaves_no_index() {
    let temp = TempDir::new().unwrap();
    let mut session = Session::new(Arc::new(FailingEmbedder), session_config(&temp));

    let result = session.ingest_pdf("notes.pdf", &study_notes_pdf()).await;

    assert!(matches!(result, Err(IngestError::Index(_))));
    assert!(session.error_message().unwrap().contains("model crashed"));
    assert!(!session.is_ready());
    assert!(dir_entries(temp.path()).is_empty());
}

#[tokio::test]
async fn test_fragment_count_respects_cap() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session.update_settings(&SettingsUpdate {
        max_chunks: Some(5),
        ..Default::default()
    });

    let long_page = "photosynthesis converts light energy into chemical energy ".repeat(60);
    let pdf = pdf_with_pages(&[&long_page, &long_page]);

    let outcome = session.ingest_pdf("long.pdf", &pdf).await.unwrap();
    match outcome {
        IngestOutcome::Indexed(summary) => {
            assert_eq!(summary.fragments, 5);
            assert!(summary.truncated);
        }
        IngestOutcome::Skipped => panic!("expected an index"),
    }
    assert_eq!(session.fragments().len(), 5);
    assert_eq!(session.index().unwrap().len(), 5);
    assert!(session.fragments().iter().all(|f| f.page == 1));
}

#[tokio::test]
async fn test_chunk_settings_apply_to_next_upload() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session.update_settings(&SettingsUpdate {
        chunk_size: Some(100),
        chunk_overlap: Some(0),
        ..Default::default()
    });

    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();

    assert!(session.fragments().len() > 3);
    assert!(session.fragments().iter().all(|f| f.char_len() <= 100));
}

#[tokio::test]
async fn test_second_upload_is_skipped_until_cleared() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);

    session
        .ingest_pdf("first.pdf", &study_notes_pdf())
        .await
        .unwrap();
    let first_path = session.db_path().unwrap().to_path_buf();

    let outcome = session
        .ingest_pdf("second.pdf", &pdf_with_pages(&[HISTORY_PAGE]))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);
    assert_eq!(session.pdf_filename(), Some("first.pdf"));
    assert_eq!(session.db_path(), Some(first_path.as_path()));
    assert!(first_path.join(MANIFEST_FILE).exists());
    assert_eq!(dir_entries(temp.path()).len(), 1);
}

#[tokio::test]
async fn test_unreadable_bytes_report_error() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);

    let result = session.ingest_pdf("broken.pdf", b"definitely not a pdf").await;

    assert!(matches!(result, Err(IngestError::Unreadable(_))));
    assert!(session.error_message().is_some());
    assert!(session.stats().is_none());
}
