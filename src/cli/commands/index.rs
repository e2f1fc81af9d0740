//! Context index CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::sync::Arc;

use crate::application::{embedder_from_config, index_service_from_config};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, ScoredChunk};
use crate::infrastructure::vector::ContextIndex;
use crate::services::{ContextRetriever, IndexStatus};

/// Context index management.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Index action.
    #[command(subcommand)]
    pub command: IndexCommands,
}

/// Index actions.
#[derive(Subcommand, Debug)]
pub enum IndexCommands {
    /// Build the index if it does not exist yet
    Build,
    /// Rebuild the index from the current documentation
    Rebuild,
    /// Show the persisted index manifest
    Status,
    /// Retrieve the chunks most similar to a query
    Search {
        /// Query text; empty selects the leading chunks
        query: String,
        /// Number of chunks to return
        #[arg(short, default_value = "5")]
        k: usize,
    },
}

/// Result of `index build` and `index rebuild`.
#[derive(Debug, serde::Serialize)]
pub struct IndexBuildOutput {
    /// `built` or `rebuilt`.
    pub action: &'static str,
    /// Index directory.
    pub dir: String,
    /// Chunk count.
    pub chunks: usize,
    /// Provider and model.
    pub embedding: String,
    /// Build timestamp.
    pub built_at: String,
}

impl IndexBuildOutput {
    fn new(action: &'static str, dir: String, index: &ContextIndex) -> Self {
        let manifest = index.manifest();
        Self {
            action,
            dir,
            chunks: index.len(),
            embedding: manifest.identity(),
            built_at: manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

impl CommandOutput for IndexBuildOutput {
    fn to_human(&self) -> String {
        format!(
            "Index {} at {}\n  Chunks:    {}\n  Embedding: {}\n  Built at:  {}",
            self.action, self.dir, self.chunks, self.embedding, self.built_at
        )
    }
}

/// Result of `index status`.
#[derive(Debug, serde::Serialize)]
pub struct IndexStatusOutput {
    /// Directory and manifest.
    #[serde(flatten)]
    pub status: IndexStatus,
}

impl CommandOutput for IndexStatusOutput {
    fn to_human(&self) -> String {
        let status = &self.status;
        let Some(manifest) = &status.manifest else {
            return format!(
                "No index at {}. Run `stevedore index build`.",
                status.dir.display()
            );
        };

        let mut lines = vec![
            format!("Index at {}", status.dir.display()),
            "─────────────────────────────────────────".to_string(),
            format!("Format:       v{}", manifest.format_version),
            format!("Embedding:    {}", manifest.identity()),
            format!("Active:       {}", status.active_embedding),
            format!(
                "Chunking:     {} tokens, {} overlap",
                manifest.chunk_size, manifest.chunk_overlap
            ),
            format!("Chunks:       {}", manifest.chunk_count),
            format!(
                "Built at:     {}",
                manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        ];
        match status.stale {
            Some(true) => lines.push("Freshness:    stale (documentation changed)".to_string()),
            Some(false) => lines.push("Freshness:    up to date".to_string()),
            None => lines.push("Freshness:    unknown (documentation unreadable)".to_string()),
        }
        if let Some(reason) = &status.incompatibility {
            lines.push(format!("Incompatible: {reason}"));
        }
        lines.join("\n")
    }
}

/// Result of `index search`.
#[derive(Debug, serde::Serialize)]
pub struct SearchOutput {
    /// Query text.
    pub query: String,
    /// Requested hit count.
    pub k: usize,
    /// Hits, best first.
    pub hits: Vec<ScoredChunk>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.hits.is_empty() {
            return "No chunks found.".to_string();
        }

        let mut lines = vec![format!("Top {} chunk(s) for {:?}:\n", self.hits.len(), self.query)];
        lines.push(format!("{:<6} {:<32} {}", "SCORE", "CHUNK", "TEXT"));
        lines.push("-".repeat(90));
        for hit in &self.hits {
            lines.push(format!(
                "{:<6.3} {:<32} {}",
                hit.score,
                truncate(&hit.id, 30),
                truncate(&hit.text.replace('\n', " "), 50)
            ));
        }
        lines.join("\n")
    }
}

/// Run an index subcommand.
pub async fn execute(args: IndexArgs, config: &Config, json_mode: bool) -> Result<()> {
    let embedder = embedder_from_config(&config.embedding)?;
    let service = index_service_from_config(config, Arc::clone(&embedder))?;
    let dir = config.index.dir.clone();

    match args.command {
        IndexCommands::Build => {
            let existed = service.store().has_index().await;
            let index = service
                .load_or_build()
                .await
                .context("Failed to build context index")?;
            let action = if existed { "loaded" } else { "built" };
            output(&IndexBuildOutput::new(action, dir, &index), json_mode);
        }
        IndexCommands::Rebuild => {
            let index = service
                .rebuild()
                .await
                .context("Failed to rebuild context index")?;
            output(&IndexBuildOutput::new("rebuilt", dir, &index), json_mode);
        }
        IndexCommands::Status => {
            let status = service
                .status()
                .await
                .context("Failed to read index status")?;
            output(&IndexStatusOutput { status }, json_mode);
        }
        IndexCommands::Search { query, k } => {
            let index = service
                .load_or_build()
                .await
                .context("Context index unavailable")?;
            let retriever = ContextRetriever::new(Arc::new(index), embedder);
            let hits = retriever.search(&query, k).await.context("Search failed")?;
            output(&SearchOutput { query, k, hits }, json_mode);
        }
    }

    Ok(())
}
