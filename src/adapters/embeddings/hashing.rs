//! Local hashing embedding provider.
//!
//! Deterministic bag-of-words vectors: each token of at least three characters
//! is hashed with SHA-256 into a signed bucket, and the result is L2-normalized.
//! Needs no network and produces identical vectors across processes, so it is
//! the default for offline use and tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::errors::DomainResult;
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

/// Model identifier stamped in the index manifest.
pub const HASHING_MODEL: &str = "token-hash-v1";

const MIN_TOKEN_CHARS: usize = 3;

/// Feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    /// Provider producing vectors of `dimension` entries.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in text
            .split(|ch: char| !ch.is_alphanumeric() && ch != '_')
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        {
            let token = token.to_lowercase();
            let digest = Sha256::digest(token.as_bytes());
            let idx = usize::from(u16::from_le_bytes([digest[0], digest[1]])) % self.dimension;
            let sign = if digest[2] % 2 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn model(&self) -> &str {
        HASHING_MODEL
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        Ok(inputs
            .iter()
            .map(|input| EmbeddingOutput {
                id: input.id.clone(),
                vector: self.embed_text(&input.text),
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }
}
