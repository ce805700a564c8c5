// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic hashing embedder
//!
//! Maps each lowercase word to a couple of signed buckets (the hashing trick)
//! and normalizes the result. Texts sharing words land close together, which
//! is enough for relevance filtering tests and for running without model files.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{l2_normalize, Embedder};

/// Buckets touched per token
const PROBES_PER_TOKEN: u64 = 2;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    model_name: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }

        Ok(Self {
            model_name: format!("hash-{}", dimension),
            dimension,
        })
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            for probe in 0..PROBES_PER_TOKEN {
                let mut hasher = DefaultHasher::new();
                token.hash(&mut hasher);
                probe.hash(&mut hasher);
                let seed = hasher.finish();

                let index = (seed % self.dimension as u64) as usize;
                let sign = if (seed >> 63) == 0 { 1.0 } else { -1.0 };
                embedding[index] += sign;
            }
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }
}
