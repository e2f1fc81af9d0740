//! Query-time retrieval over the shared context index.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ScoredChunk;
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::vector::ContextIndex;

/// Read-only handle over the loaded index and the embedder it was built with.
///
/// Cheap to clone; every clone shares the same index.
#[derive(Clone)]
pub struct ContextRetriever {
    index: Arc<ContextIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ContextRetriever {
    /// Retriever over a loaded index.
    pub fn new(index: Arc<ContextIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Underlying index.
    pub fn index(&self) -> &ContextIndex {
        &self.index
    }

    /// The `k` best chunks for `query`, most similar first.
    ///
    /// An empty query selects the first `k` chunks in index order without
    /// embedding anything.
    pub async fn search(&self, query: &str, k: usize) -> DomainResult<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(DomainError::ValidationFailed(
                "retrieval depth k must be at least 1".to_string(),
            ));
        }

        let hits = if query.trim().is_empty() {
            self.index.leading(k)
        } else {
            let vector = self.embedder.embed(query).await?;
            self.index.search(&vector, k)
        };

        Ok(hits
            .into_iter()
            .filter(|hit| !hit.text.trim().is_empty())
            .collect())
    }

    /// Texts of the `k` best chunks for `query`, most similar first.
    pub async fn retrieve(&self, query: &str, k: usize) -> DomainResult<Vec<String>> {
        let hits = self.search(query, k).await?;
        tracing::debug!(k, hits = hits.len(), "context retrieved");
        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }

    /// Retrieved texts joined with newlines; empty when nothing matched.
    pub async fn retrieve_block(&self, query: &str, k: usize) -> DomainResult<String> {
        Ok(self.retrieve(query, k).await?.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::domain::models::{DocumentChunk, SourceId};
    use crate::infrastructure::vector::{IndexManifest, INDEX_FORMAT_VERSION};

    fn retriever(texts: &[&str]) -> ContextRetriever {
        let embedder = HashingEmbeddingProvider::new(256);
        let chunks: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk::new(SourceId::Manual, i, (*t).to_string(), 1, embedder.embed_text(t)))
            .collect();
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: "hashing".into(),
            embedding_model: "token-hash-v1".into(),
            dimension: 256,
            chunk_size: 400,
            chunk_overlap: 40,
            chunk_count: chunks.len(),
            built_at: chrono::Utc::now(),
            content_fingerprint: String::new(),
        };
        ContextRetriever::new(
            Arc::new(ContextIndex::new(manifest, chunks).unwrap()),
            Arc::new(embedder),
        )
    }

    #[tokio::test]
    async fn test_retrieve_most_similar_first() {
        let r = retriever(&[
            "O navio atraca no berço norte",
            "Para gerar um gráfico de vendas use o relatório mensal",
            "Cadastro de clientes na página de clientes",
        ]);
        let texts = r.retrieve("gráfico de vendas", 2).await.unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("gráfico de vendas"));
    }

    #[tokio::test]
    async fn test_empty_query_uses_leading_chunks() {
        let r = retriever(&["primeiro trecho", "segundo trecho", "terceiro trecho"]);
        let block = r.retrieve_block("   ", 2).await.unwrap();
        assert_eq!(block, "primeiro trecho\nsegundo trecho");
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let r = retriever(&["x"]);
        assert!(matches!(
            r.retrieve("navio", 0).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_index_gives_empty_block() {
        let r = retriever(&[]);
        assert_eq!(r.retrieve_block("navio", 5).await.unwrap(), "");
    }
}
