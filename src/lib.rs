// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod answer;
pub mod api;
pub mod cli;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod session;
pub mod storage;
pub mod text;
pub mod vector;
pub mod version;

// Re-export main types
pub use api::{create_app, AppState};
pub use config::AppConfig;
pub use document::PageDocument;
pub use embeddings::{Embedder, HashEmbedder, OnnxEmbeddingModel};
pub use session::{ChatMessage, IngestError, IngestOutcome, Session, SessionConfig};
pub use text::{Fragment, RecursiveCharacterSplitter};
pub use vector::{DistanceMetric, ScoredFragment, VectorIndex};
