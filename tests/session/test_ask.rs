// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Question answering against an indexed document

use crate::common::{hash_session, session_config, study_notes_pdf};
use anyhow::anyhow;
use async_trait::async_trait;
use pdf_chat::answer::{ERROR_PREFIX, LOW_RELEVANCE_MESSAGE};
use pdf_chat::embeddings::Embedder;
use pdf_chat::session::{AskError, Role, SettingsUpdate};
use pdf_chat::{HashEmbedder, Session};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Hash embeddings until `failing` is set
struct SwitchableEmbedder {
    inner: HashEmbedder,
    failing: AtomicBool,
}

impl Default for SwitchableEmbedder {
    fn default() -> Self {
        Self {
            inner: HashEmbedder::new(128).unwrap(),
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Embedder for SwitchableEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("embedder offline"));
        }
        self.inner.embed(text).await
    }
}

#[tokio::test]
async fn test_matching_question_returns_cards() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();
    session.update_settings(&SettingsUpdate {
        k_results: Some(1),
        min_relevance: Some(0.0),
        ..Default::default()
    });

    let reply = session
        .ask("How do mitochondria produce ATP?")
        .await
        .unwrap();

    assert_eq!(reply.role, Role::Bot);
    assert_eq!(reply.content.matches("result-card").count(), 1);
    assert!(reply.content.contains("Стр. 1"));
    assert!(reply.content.contains("Mitochondria"));
}

#[tokio::test]
async fn test_results_are_limited_to_k() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();
    session.update_settings(&SettingsUpdate {
        k_results: Some(2),
        min_relevance: Some(0.0),
        ..Default::default()
    });

    let reply = session.ask("rocks and senate").await.unwrap();
    assert_eq!(reply.content.matches("result-card").count(), 2);
}

#[tokio::test]
async fn test_weak_matches_show_low_relevance_message() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();
    session.update_settings(&SettingsUpdate {
        min_relevance: Some(1.0),
        ..Default::default()
    });

    let reply = session.ask("quantum chromodynamics").await.unwrap();
    assert_eq!(reply.content, LOW_RELEVANCE_MESSAGE);
    assert!(!reply.content.contains("result-card"));
}

#[tokio::test]
async fn test_transcript_records_both_sides() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();

    session.ask("  What is basalt?  ").await.unwrap();
    session.ask("Who advised magistrates?").await.unwrap();

    let history = session.chat_history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "What is basalt?");
    assert_eq!(history[1].role, Role::Bot);
    assert_eq!(history[2].role, Role::User);
    assert_eq!(history[3].role, Role::Bot);
    assert!(history.iter().all(|m| m.time.len() == 5));
}

#[tokio::test]
async fn test_empty_question_is_ignored() {
    let temp = TempDir::new().unwrap();
    let mut session = hash_session(&temp);
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();

    assert_eq!(session.ask("   ").await, Err(AskError::EmptyQuestion));
    assert!(session.chat_history().is_empty());
}

#[tokio::test]
async fn test_search_failure_becomes_inline_error() {
    let temp = TempDir::new().unwrap();
    let embedder = Arc::new(SwitchableEmbedder::default());
    let mut session = Session::new(embedder.clone(), session_config(&temp));
    session
        .ingest_pdf("notes.pdf", &study_notes_pdf())
        .await
        .unwrap();

    embedder.failing.store(true, Ordering::SeqCst);
    let reply = session.ask("ATP").await.unwrap();

    assert_eq!(reply.role, Role::Bot);
    assert!(reply.content.starts_with(ERROR_PREFIX));
    assert!(reply.content.contains("embedder"));
    assert!(reply.content.contains("offline"));
    assert_eq!(session.chat_history().len(), 2);
}
