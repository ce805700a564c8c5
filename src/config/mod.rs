// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration
//!
//! Values come from CLI flags, each of which can also be supplied through an
//! environment variable (a `.env` file is loaded first when present).

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::embeddings::{Embedder, HashEmbedder, OnnxEmbeddingModel, DEFAULT_DIMENSION, DEFAULT_MODEL_NAME};
use crate::session::SessionConfig;
use crate::storage::{CleanupPolicy, DEFAULT_DB_BASE};
use crate::vector::DistanceMetric;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;
pub const DEFAULT_MODEL_PATH: &str = "./models/all-MiniLM-L6-v2-onnx/model.onnx";
pub const DEFAULT_TOKENIZER_PATH: &str = "./models/all-MiniLM-L6-v2-onnx/tokenizer.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Index directories are created as `<db_base>_<timestamp>`
    pub db_base: PathBuf,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_upload_mb: usize,
    /// Fall back to the hashing embedder when the ONNX files are missing
    pub allow_hash_embedder: bool,
    /// Scoring used by newly built indexes
    pub metric: DistanceMetric,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_base: PathBuf::from(DEFAULT_DB_BASE),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            tokenizer_path: PathBuf::from(DEFAULT_TOKENIZER_PATH),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            allow_hash_embedder: false,
            metric: DistanceMetric::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }
        if self.max_upload_mb == 0 {
            return Err("Upload limit must be greater than 0".to_string());
        }
        if self.db_base.as_os_str().is_empty() {
            return Err("Database base path must not be empty".to_string());
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            db_base: self.db_base.clone(),
            cleanup: CleanupPolicy::default(),
            metric: self.metric,
        }
    }

    /// Load the ONNX model, or the hashing embedder if allowed and the model fails
    pub async fn load_embedder(&self) -> Result<Arc<dyn Embedder>> {
        match OnnxEmbeddingModel::new(DEFAULT_MODEL_NAME, &self.model_path, &self.tokenizer_path)
            .await
        {
            Ok(model) => Ok(Arc::new(model)),
            Err(e) if self.allow_hash_embedder => {
                warn!("ONNX model unavailable ({}), using hash embedder", e);
                Ok(Arc::new(HashEmbedder::new(DEFAULT_DIMENSION)?))
            }
            Err(e) => {
                info!("Set --allow-hash-embedder to run without model files");
                Err(e)
            }
        }
    }
}
