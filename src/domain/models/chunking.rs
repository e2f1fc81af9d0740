//! Text chunking domain models
//!
//! Token-aware chunking keeps each documentation chunk small enough for
//! focused retrieval while the overlap preserves context across boundaries.

use serde::{Deserialize, Serialize};

/// Configuration for document chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum size of each chunk in tokens
    pub chunk_size: usize,

    /// Overlap between chunks in tokens
    pub chunk_overlap: usize,

    /// Whether to snap chunk ends to sentence or line boundaries
    pub respect_boundaries: bool,
}

impl Default for ChunkingConfig {
    /// 400 tokens per chunk with a 40 token overlap.
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 40,
            respect_boundaries: true,
        }
    }
}

impl ChunkingConfig {
    /// Small chunks, for precise retrieval over short manuals
    pub fn small() -> Self {
        Self {
            chunk_size: 128,
            chunk_overlap: 16,
            respect_boundaries: true,
        }
    }

    /// Validate the chunking configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be less than chunk_size".to_string());
        }

        Ok(())
    }
}
