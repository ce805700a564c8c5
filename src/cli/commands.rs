// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::answer::{excerpt, format_percent, LOW_RELEVANCE_MESSAGE, NO_RESULTS_MESSAGE};
use crate::api::start_server;
use crate::config::{
    AppConfig, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_MODEL_PATH, DEFAULT_PORT,
    DEFAULT_TOKENIZER_PATH,
};
use crate::document::load_pdf_file;
use crate::embeddings::Embedder;
use crate::session::settings::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_K_RESULTS, DEFAULT_MAX_CHUNKS,
    DEFAULT_MIN_RELEVANCE,
};
use crate::session::{IngestOutcome, Session, SettingsUpdate};
use crate::storage::{safe_remove_database, CleanupPolicy, DEFAULT_DB_BASE};
use crate::vector::{DistanceMetric, ScoredFragment, VectorIndex};

/// Embedding model location, shared by every command that embeds text
#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    /// ONNX model file
    #[arg(long, env = "EMBEDDING_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// HuggingFace tokenizer.json
    #[arg(long, env = "EMBEDDING_TOKENIZER_PATH", default_value = DEFAULT_TOKENIZER_PATH)]
    pub tokenizer_path: PathBuf,

    /// Use the hashing embedder if the ONNX model cannot be loaded
    #[arg(long, env = "ALLOW_HASH_EMBEDDER")]
    pub allow_hash_embedder: bool,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "PDF_CHAT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PDF_CHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base path for index directories
    #[arg(long, env = "PDF_CHAT_DB_BASE", default_value = DEFAULT_DB_BASE)]
    pub db_base: PathBuf,

    /// Upload size limit in MB
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Relevance scoring for new indexes: l2 or cosine
    #[arg(long, env = "PDF_CHAT_METRIC", default_value_t = DistanceMetric::L2)]
    pub metric: DistanceMetric,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// PDF file to index
    pub pdf: PathBuf,

    /// Base path for index directories
    #[arg(long, env = "PDF_CHAT_DB_BASE", default_value = DEFAULT_DB_BASE)]
    pub db_base: PathBuf,

    /// Fragment length in characters
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared between neighbouring fragments
    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    /// Maximum fragments to embed
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNKS)]
    pub max_chunks: usize,

    /// Relevance scoring: l2 or cosine
    #[arg(long, env = "PDF_CHAT_METRIC", default_value_t = DistanceMetric::L2)]
    pub metric: DistanceMetric,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Index directory created by `ingest` or the server
    #[arg(long)]
    pub db: PathBuf,

    /// Question to search for
    pub question: String,

    /// Number of results
    #[arg(short, long, default_value_t = DEFAULT_K_RESULTS)]
    pub k: usize,

    /// Hide results scoring below this
    #[arg(long, default_value_t = DEFAULT_MIN_RELEVANCE)]
    pub min_relevance: f32,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Index directory to remove
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Leftover directory named exactly after the base path is removed too
    #[arg(long, env = "PDF_CHAT_DB_BASE", default_value = DEFAULT_DB_BASE)]
    pub db_base: PathBuf,
}

impl EmbedderArgs {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            allow_hash_embedder: self.allow_hash_embedder,
            ..AppConfig::default()
        }
    }

    async fn load(&self) -> Result<Arc<dyn Embedder>> {
        self.app_config().load_embedder().await
    }
}

impl ServeArgs {
    pub fn into_config(self) -> AppConfig {
        AppConfig {
            host: self.host,
            port: self.port,
            db_base: self.db_base,
            max_upload_mb: self.max_upload_mb,
            metric: self.metric,
            ..self.embedder.app_config()
        }
    }
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.into_config();
    config.validate().map_err(|e| anyhow!(e))?;

    let embedder = config.load_embedder().await?;
    start_server(&config, embedder).await
}

pub async fn ingest(args: IngestArgs) -> Result<()> {
    let embedder = args.embedder.load().await?;
    let config = AppConfig {
        db_base: args.db_base.clone(),
        metric: args.metric,
        ..AppConfig::default()
    };

    let mut session = Session::new(embedder, config.session_config());
    session.update_settings(&SettingsUpdate {
        chunk_size: Some(args.chunk_size),
        chunk_overlap: Some(args.chunk_overlap),
        max_chunks: Some(args.max_chunks),
        ..Default::default()
    });

    let filename = args
        .pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.pdf.display().to_string());
    let pages = load_pdf_file(&args.pdf)?;

    match session.ingest_pages(&filename, pages).await? {
        IngestOutcome::Indexed(summary) => {
            println!("📄 {}", summary.filename);
            println!("  Pages:     {}", summary.pages);
            println!("  Fragments: {}", summary.fragments);
            if summary.truncated {
                println!("  (limited to the first {} fragments)", args.max_chunks);
            }
            println!("{}", summary.db_path.display());
            Ok(())
        }
        IngestOutcome::Skipped => Err(anyhow!("Session already holds a document")),
    }
}

pub async fn query(args: QueryArgs) -> Result<()> {
    let embedder = args.embedder.load().await?;
    let index = VectorIndex::open(&args.db)?;
    info!(
        "Opened index {} ({} fragments)",
        index.dir().display(),
        index.len()
    );

    let results = index
        .similarity_search_with_relevance_scores(&args.question, embedder.as_ref(), args.k)
        .await?;
    println!("{}", render_results(&results, args.min_relevance));
    Ok(())
}

/// Plain-text rendering of a result list for the terminal
pub fn render_results(results: &[ScoredFragment], min_relevance: f32) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let relevant: Vec<&ScoredFragment> = results
        .iter()
        .filter(|r| r.score >= min_relevance)
        .collect();
    if relevant.is_empty() {
        return LOW_RELEVANCE_MESSAGE.to_string();
    }

    relevant
        .iter()
        .map(|r| {
            format!(
                "[Стр. {} • {} совпадение]\n{}",
                r.fragment.page,
                format_percent(r.score),
                excerpt(&r.fragment.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn cleanup(args: CleanupArgs) -> Result<()> {
    let policy = CleanupPolicy::default();

    if let Some(db) = &args.db {
        report_removal(db, safe_remove_database(db, &policy).await);
    }
    report_removal(&args.db_base, safe_remove_database(&args.db_base, &policy).await);
    Ok(())
}

fn report_removal(path: &std::path::Path, removed: bool) {
    if removed {
        println!("✅ {}", path.display());
    } else {
        println!("⚠️  Could not remove {}", path.display());
    }
}
