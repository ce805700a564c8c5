// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persisted fragment index
//!
//! One directory per upload holding:
//! - `manifest.json`: model, dimension, metric and fragment count
//! - `vectors.bin`: bincode-encoded fragments with their embeddings
//!
//! Search is an exhaustive scan; a single PDF capped at a few hundred
//! fragments doesn't need an ANN structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::embeddings::{DistanceMetric, Embedding};
use crate::embeddings::Embedder;
use crate::text::Fragment;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VECTORS_FILE: &str = "vectors.bin";

/// Bumped when the on-disk layout changes
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index directory not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode vectors: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Failed to parse manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid vector dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector values: contains NaN or Infinity")]
    NonFiniteVector,

    #[error("Embedding model mismatch: index built with '{index}', query uses '{query}'")]
    ModelMismatch { index: String, query: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

impl IndexError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub id: Uuid,
    pub format_version: u32,
    pub model: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub fragment_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    fragment: Fragment,
    vector: Vec<f32>,
}

/// Fragment returned from a search, with its relevance in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Empty in-memory index bound to `dir`; nothing is written until [`persist`](Self::persist)
    pub fn new(
        dir: impl Into<PathBuf>,
        model: impl Into<String>,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            dir: dir.into(),
            manifest: IndexManifest {
                id: Uuid::new_v4(),
                format_version: INDEX_FORMAT_VERSION,
                model: model.into(),
                dimension,
                metric,
                fragment_count: 0,
                created_at: Utc::now(),
            },
            entries: Vec::new(),
        }
    }

    /// Embed every fragment and write the index to `dir`
    ///
    /// If writing fails, the partially written directory is removed.
    pub async fn build(
        dir: impl Into<PathBuf>,
        fragments: Vec<Fragment>,
        embedder: &dyn Embedder,
        metric: DistanceMetric,
    ) -> Result<Self, IndexError> {
        let texts: Vec<String> = fragments.iter().map(|f| f.content.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        if vectors.len() != fragments.len() {
            return Err(IndexError::Embedding(format!(
                "expected {} embeddings, got {}",
                fragments.len(),
                vectors.len()
            )));
        }

        let mut index = Self::new(dir, embedder.model_name(), embedder.dimension(), metric);
        for (fragment, vector) in fragments.into_iter().zip(vectors) {
            index.add(fragment, vector)?;
        }

        if let Err(e) = index.persist() {
            let _ = fs::remove_dir_all(&index.dir);
            return Err(e);
        }

        info!(
            "Built index at {} with {} fragments",
            index.dir.display(),
            index.len()
        );
        Ok(index)
    }

    pub fn add(&mut self, fragment: Fragment, vector: Vec<f32>) -> Result<(), IndexError> {
        if vector.len() != self.manifest.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::NonFiniteVector);
        }

        self.entries.push(IndexEntry { fragment, vector });
        self.manifest.fragment_count = self.entries.len();
        Ok(())
    }

    /// Write manifest and vectors to the index directory
    pub fn persist(&self) -> Result<(), IndexError> {
        fs::create_dir_all(&self.dir).map_err(|e| IndexError::io(&self.dir, e))?;

        let vectors_path = self.dir.join(VECTORS_FILE);
        let payload = bincode::serialize(&self.entries)?;
        fs::write(&vectors_path, payload).map_err(|e| IndexError::io(&vectors_path, e))?;

        // Manifest last, so a directory with a manifest always has its vectors
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let manifest = serde_json::to_string_pretty(&self.manifest)?;
        fs::write(&manifest_path, manifest).map_err(|e| IndexError::io(&manifest_path, e))?;

        debug!("Persisted {} vectors to {}", self.entries.len(), self.dir.display());
        Ok(())
    }

    /// Load a previously persisted index
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(IndexError::NotFound(dir.display().to_string()));
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&manifest_path).map_err(|e| IndexError::io(&manifest_path, e))?;
        let manifest: IndexManifest = serde_json::from_str(&raw)?;

        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: manifest.format_version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        let vectors_path = dir.join(VECTORS_FILE);
        let payload = fs::read(&vectors_path).map_err(|e| IndexError::io(&vectors_path, e))?;
        let entries: Vec<IndexEntry> = bincode::deserialize(&payload)?;

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != manifest.dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: manifest.dimension,
                actual: bad.vector.len(),
            });
        }

        info!("Opened index at {} ({} fragments)", dir.display(), entries.len());
        Ok(Self {
            dir,
            manifest,
            entries,
        })
    }

    /// Top-`k` fragments for a query vector, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredFragment>, IndexError> {
        if query.len() != self.manifest.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual: query.len(),
            });
        }

        let query = Embedding::new(query.to_vec());
        let mut results: Vec<ScoredFragment> = self
            .entries
            .iter()
            .map(|entry| ScoredFragment {
                fragment: entry.fragment.clone(),
                score: self
                    .manifest
                    .metric
                    .relevance(&query, &Embedding::new(entry.vector.clone())),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Embed `question` and return the top-`k` fragments with relevance scores
    pub async fn similarity_search_with_relevance_scores(
        &self,
        question: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> Result<Vec<ScoredFragment>, IndexError> {
        if embedder.model_name() != self.manifest.model {
            return Err(IndexError::ModelMismatch {
                index: self.manifest.model.clone(),
                query: embedder.model_name().to_string(),
            });
        }

        let query = embedder
            .embed(question)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;
        self.search(&query, k)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.entries.iter().map(|e| &e.fragment)
    }
}
