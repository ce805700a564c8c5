// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs the all-MiniLM-L6-v2 sentence transformer through ONNX Runtime on the
//! CPU execution provider.
//!
//! - BERT tokenization via HuggingFace `tokenizers`
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - L2 normalization of the pooled vector
//! - 384-dimensional output vectors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::{l2_normalize, Embedder, DEFAULT_DIMENSION};

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// # Thread Safety
/// The session sits behind `Arc<Mutex>` because `Session::run` needs `&mut`;
/// cloning the model is cheap and shares the same session.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

/// Tokenized batch, padded to the longest sequence
struct EncodedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl OnnxEmbeddingModel {
    /// Load the model and tokenizer from disk
    ///
    /// # Errors
    /// - Model or tokenizer file missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The model doesn't produce `[batch, seq_len, 384]` token embeddings
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    /// ).await?;
    /// ```
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Initializing ONNX embedding model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: DEFAULT_DIMENSION,
        };

        // Validate output shape with a test inference
        let probe = model.run_batch(&["validation test".to_string()])?;
        if probe.first().map(Vec::len) != Some(DEFAULT_DIMENSION) {
            anyhow::bail!(
                "Model outputs unexpected dimensions (expected {})",
                DEFAULT_DIMENSION
            );
        }

        info!("ONNX embedding model '{}' loaded", model.model_name);
        Ok(model)
    }

    /// Load `model.onnx` and `tokenizer.json` from one directory
    pub async fn from_dir<P: AsRef<Path>>(model_name: impl Into<String>, dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::new(
            model_name,
            dir.join("model.onnx"),
            dir.join("tokenizer.json"),
        )
        .await
    }

    fn encode(&self, texts: &[String]) -> Result<EncodedBatch> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(mask.iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }

        let shape = (texts.len(), max_len);
        Ok(EncodedBatch {
            input_ids: Array2::from_shape_vec(shape, input_ids)
                .context("Failed to create input_ids array")?,
            attention_mask: Array2::from_shape_vec(shape, attention_mask)
                .context("Failed to create attention_mask array")?,
            token_type_ids: Array2::zeros(shape),
        })
    }

    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = self.encode(texts)?;
        let mask = batch.attention_mask.clone();

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(batch.input_ids)?,
            "attention_mask" => Value::from_array(batch.attention_mask)?,
            "token_type_ids" => Value::from_array(batch.token_type_ids)?
        ])?;

        // Different exports name the output differently, so take it by index
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        if output.ndim() != 3 || output.shape()[2] != self.dimension {
            anyhow::bail!(
                "Unexpected output shape {:?} (expected [batch, seq_len, {}])",
                output.shape(),
                self.dimension
            );
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for i in 0..texts.len() {
            let tokens = output
                .index_axis(Axis(0), i)
                .into_dimensionality::<ndarray::Ix2>()
                .context("Unexpected token embedding rank")?;
            let mut pooled = mean_pool(tokens, mask.row(i).as_slice().unwrap_or(&[]));
            l2_normalize(&mut pooled);
            embeddings.push(pooled);
        }

        debug!("Embedded batch of {} texts", texts.len());
        Ok(embeddings)
    }
}

/// Average token embeddings, ignoring padding positions
fn mean_pool(tokens: ArrayView2<f32>, mask: &[i64]) -> Vec<f32> {
    let (seq_len, hidden_dim) = tokens.dim();
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len {
        let weight = mask.get(i).copied().unwrap_or(0) as f32;
        sum_mask += weight;
        for j in 0..hidden_dim {
            pooled[j] += tokens[[i, j]] * weight;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }
    pooled
}

#[async_trait]
impl Embedder for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.run_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("Model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.run_batch(texts)
    }
}
