//! Prompt composition: role header, retrieved context, role instructions.
//!
//! Placeholders such as `{{user}}` stay literal here; the session layer
//! resolves them right before the prompt reaches a model.

use crate::domain::models::{ComposedPrompt, RetrievalConfig, SpecialistRole};
use crate::services::context_retriever::ContextRetriever;

/// Fills prompt templates with retrieved context and session placeholders.
pub struct PromptComposer {
    retriever: ContextRetriever,
    retrieval: RetrievalConfig,
}

impl PromptComposer {
    /// Composer retrieving with the given depths.
    pub const fn new(retriever: ContextRetriever, retrieval: RetrievalConfig) -> Self {
        Self {
            retriever,
            retrieval,
        }
    }

    /// Retriever backing `{context}`.
    pub const fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    /// Compose the prompt for `role`, retrieving context for `query`.
    ///
    /// A retrieval failure degrades to an empty context block.
    pub async fn compose_prompt(&self, role: SpecialistRole, query: &str) -> ComposedPrompt {
        let k = self.retrieval.k_for(role);
        let context_block = match self.retriever.retrieve_block(query, k).await {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "context retrieval failed, composing without context");
                String::new()
            }
        };
        if context_block.is_empty() {
            tracing::debug!(role = %role, "empty context block");
        }
        ComposedPrompt::new(role, context_block)
    }

    /// Rendered system prompt for `role` and `query`.
    pub async fn compose(&self, role: SpecialistRole, query: &str) -> String {
        self.compose_prompt(role, query).await.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::domain::models::session::placeholders_in;
    use crate::domain::models::{DocumentChunk, SourceId};
    use crate::infrastructure::vector::{ContextIndex, IndexManifest, INDEX_FORMAT_VERSION};
    use std::sync::Arc;

    fn composer(k: usize) -> PromptComposer {
        let embedder = HashingEmbeddingProvider::new(128);
        let texts = ["Página de planos: /planos", "Gráficos de barras comparam meses"];
        let chunks: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentChunk::new(SourceId::LinkMap, i, (*t).to_string(), 1, embedder.embed_text(t)))
            .collect();
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: "hashing".into(),
            embedding_model: "token-hash-v1".into(),
            dimension: 128,
            chunk_size: 400,
            chunk_overlap: 40,
            chunk_count: 2,
            built_at: chrono::Utc::now(),
            content_fingerprint: String::new(),
        };
        let retriever = ContextRetriever::new(
            Arc::new(ContextIndex::new(manifest, chunks).unwrap()),
            Arc::new(embedder),
        );
        PromptComposer::new(
            retriever,
            RetrievalConfig {
                helper_k: k,
                analytics_k: k,
                optimizer_k: k,
                model_fallback: true,
            },
        )
    }

    #[tokio::test]
    async fn test_compose_keeps_every_placeholder() {
        let composer = composer(1);
        for role in SpecialistRole::ALL {
            let rendered = composer.compose(role, "planos").await;
            for placeholder in placeholders_in(role.instructions()) {
                assert!(rendered.contains(placeholder), "{role} lost {placeholder}");
            }
            assert!(rendered.starts_with(role.context_header()));
        }
    }

    #[tokio::test]
    async fn test_compose_embeds_retrieved_context() {
        let prompt = composer(1).compose_prompt(SpecialistRole::Helper, "planos").await;
        assert_eq!(prompt.context_block, "Página de planos: /planos");
    }

    #[tokio::test]
    async fn test_retrieval_failure_gives_empty_context() {
        let prompt = composer(0).compose_prompt(SpecialistRole::Analytics, "x").await;
        assert!(prompt.context_block.is_empty());
        assert!(prompt.render().contains("Contexto Data Analytics:"));
    }
}
