// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// PDF chat: ask questions about a PDF
#[derive(Parser, Debug)]
#[command(name = "pdf-chat")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Question answering over a single PDF", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web UI
    Serve(commands::ServeArgs),

    /// Index a PDF and print the index directory
    Ingest(commands::IngestArgs),

    /// Search an existing index
    Query(commands::QueryArgs),

    /// Remove index directories
    Cleanup(commands::CleanupArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => commands::serve(args).await,
        Commands::Ingest(args) => commands::ingest(args).await,
        Commands::Query(args) => commands::query(args).await,
        Commands::Cleanup(args) => commands::cleanup(args).await,
    }
}
