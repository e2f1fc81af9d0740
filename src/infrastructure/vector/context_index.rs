//! In-memory context index
//!
//! Exact nearest-neighbor search by cosine similarity over every chunk. The
//! corpus is a handful of manuals, so a linear scan is enough.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DocumentChunk, ScoredChunk};
use crate::domain::ports::EmbeddingProvider;

/// Bumped whenever the persisted layout changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Version stamp written next to the persisted chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Bumped when the on-disk layout changes.
    pub format_version: u32,
    /// Embedding provider the chunks were embedded with.
    pub embedding_provider: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Chunk size in tokens.
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// When the build finished.
    pub built_at: DateTime<Utc>,
    /// Digest of the documentation sources the index was built from
    pub content_fingerprint: String,
}

impl IndexManifest {
    /// Identity string comparable to `EmbeddingProvider::identity`.
    pub fn identity(&self) -> String {
        format!(
            "{}/{}/{}",
            self.embedding_provider, self.embedding_model, self.dimension
        )
    }

    /// Refuse an index written by another format or embedding function.
    pub fn check_compatible(&self, embedder: &dyn EmbeddingProvider) -> DomainResult<()> {
        if self.format_version != INDEX_FORMAT_VERSION {
            return Err(DomainError::IndexVersionMismatch {
                expected: format!("format v{INDEX_FORMAT_VERSION}"),
                found: format!("format v{}", self.format_version),
            });
        }
        let expected = embedder.identity();
        let found = self.identity();
        if expected != found {
            return Err(DomainError::IndexVersionMismatch { expected, found });
        }
        Ok(())
    }
}

/// Read-only set of embedded chunks plus their manifest.
#[derive(Debug, Clone)]
pub struct ContextIndex {
    manifest: IndexManifest,
    chunks: Vec<DocumentChunk>,
}

impl ContextIndex {
    /// Assemble an index, checking that every vector has the manifest dimension.
    pub fn new(manifest: IndexManifest, chunks: Vec<DocumentChunk>) -> DomainResult<Self> {
        if manifest.chunk_count != chunks.len() {
            return Err(DomainError::IndexUnavailable(format!(
                "manifest lists {} chunks but {} were found",
                manifest.chunk_count,
                chunks.len()
            )));
        }
        if let Some(bad) = chunks
            .iter()
            .find(|c| c.embedding.len() != manifest.dimension)
        {
            return Err(DomainError::IndexUnavailable(format!(
                "chunk {} has dimension {}, expected {}",
                bad.id,
                bad.embedding.len(),
                manifest.dimension
            )));
        }
        Ok(Self { manifest, chunks })
    }

    /// Build metadata.
    pub const fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// All chunks in insertion order.
    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query_vector`, best first.
    ///
    /// Ties keep index order (the sort is stable); callers must not rely on it.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                id: chunk.id.clone(),
                source: chunk.source,
                text: chunk.text.clone(),
                score: cosine_similarity(query_vector, &chunk.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// The first `k` chunks in index order, with a zero score.
    ///
    /// Used for the generic context of an empty query.
    pub fn leading(&self, k: usize) -> Vec<ScoredChunk> {
        self.chunks
            .iter()
            .take(k)
            .map(|chunk| ScoredChunk {
                id: chunk.id.clone(),
                source: chunk.source,
                text: chunk.text.clone(),
                score: 0.0,
            })
            .collect()
    }
}

/// Cosine similarity; 0.0 for empty, mismatched, or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let a_norm = a.iter().map(|value| value * value).sum::<f32>().sqrt();
    let b_norm = b.iter().map(|value| value * value).sum::<f32>().sqrt();

    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }

    dot / (a_norm * b_norm)
}
