// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding generation
//!
//! [`Embedder`] is the seam between the ingest pipeline and the model:
//! - [`OnnxEmbeddingModel`] runs all-MiniLM-L6-v2 through ONNX Runtime
//! - [`HashEmbedder`] is a deterministic bag-of-words hasher with no model
//!   files, used by tests and as an opt-in fallback
//!
//! Both produce L2-normalized vectors, which the vector index relies on when
//! converting squared Euclidean distance into a relevance score.

pub mod hash_embedder;
pub mod onnx_model;

pub use hash_embedder::HashEmbedder;
pub use onnx_model::OnnxEmbeddingModel;

use anyhow::Result;
use async_trait::async_trait;

/// Name of the sentence transformer used for the ONNX model
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Output dimension of all-MiniLM-L6-v2
pub const DEFAULT_DIMENSION: usize = 384;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
