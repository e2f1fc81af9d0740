//! Context index lifecycle: load, build, rebuild, status.
//!
//! Build-and-save is a critical section guarded by an in-process mutex and
//! the index directory's lock file, so concurrent first boots build once.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DocumentChunk, SourceDocument};
use crate::domain::ports::{EmbeddingInput, EmbeddingProvider};
use crate::infrastructure::vector::{
    content_fingerprint, Chunker, ContextIndex, DocumentStore, IndexManifest, IndexStore,
    INDEX_FORMAT_VERSION,
};

/// Summary of the persisted index, for `index status`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    /// Index directory.
    pub dir: PathBuf,
    /// Manifest, when an index exists.
    pub manifest: Option<IndexManifest>,
    /// Identity of the active embedding provider
    pub active_embedding: String,
    /// Why the persisted index cannot be loaded, if it cannot
    pub incompatibility: Option<String>,
    /// Whether the documentation changed since the build; `None` if unknown
    pub stale: Option<bool>,
}

/// Owns the documentation sources, the chunker, and the persisted index.
pub struct IndexService {
    documents: DocumentStore,
    chunker: Chunker,
    store: IndexStore,
    embedder: Arc<dyn EmbeddingProvider>,
    lock_wait: Duration,
    build_guard: Mutex<()>,
}

impl IndexService {
    /// Service over the given stores.
    pub fn new(
        documents: DocumentStore,
        chunker: Chunker,
        store: IndexStore,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            documents,
            chunker,
            store,
            embedder,
            lock_wait: Duration::from_secs(30),
            build_guard: Mutex::new(()),
        }
    }

    /// How long to wait for a concurrent build to finish.
    #[must_use]
    pub const fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Embedder used for builds and queries.
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Persisted index store.
    pub const fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Load the persisted index, building and saving it first if absent.
    #[instrument(skip(self), fields(dir = %self.store.dir().display()))]
    pub async fn load_or_build(&self) -> DomainResult<ContextIndex> {
        let _guard = self.build_guard.lock().await;

        if self.store.has_index().await {
            return self.load().await;
        }

        let _lock = self.store.acquire_lock(self.lock_wait).await?;
        // Another process may have finished while we waited
        if self.store.has_index().await {
            info!("index saved by another process, loading it");
            return self.load().await;
        }

        let index = self.build().await?;
        self.store.save(&index).await?;
        Ok(index)
    }

    /// Build from the current documentation and replace the persisted index.
    #[instrument(skip(self), fields(dir = %self.store.dir().display()))]
    pub async fn rebuild(&self) -> DomainResult<ContextIndex> {
        let _guard = self.build_guard.lock().await;
        let _lock = self.store.acquire_lock(self.lock_wait).await?;

        // The old index stays in place if the build fails
        let index = self.build().await?;
        self.store.remove().await?;
        self.store.save(&index).await?;
        info!(chunks = index.len(), "context index rebuilt");
        Ok(index)
    }

    /// Load the persisted index, warning if the documentation has changed since.
    pub async fn load(&self) -> DomainResult<ContextIndex> {
        let index = self.store.load(self.embedder.as_ref()).await?;
        info!(
            chunks = index.len(),
            embedding = %index.manifest().identity(),
            built_at = %index.manifest().built_at,
            "context index loaded"
        );
        if self.is_stale(index.manifest()).await == Some(true) {
            warn!(
                docs = %self.documents.dir().display(),
                "documentation changed since the index was built; run `stevedore index rebuild`"
            );
        }
        Ok(index)
    }

    /// Chunk and embed every documentation source, without saving.
    pub async fn build(&self) -> DomainResult<ContextIndex> {
        let documents = self.documents.load_all().await.map_err(|e| {
            DomainError::IndexUnavailable(format!("cannot build index: {e}"))
        })?;

        let chunks = self.embed_documents(&documents).await?;
        let config = self.chunker.config();
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: self.embedder.name().to_string(),
            embedding_model: self.embedder.model().to_string(),
            dimension: self.embedder.dimension(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            chunk_count: chunks.len(),
            built_at: chrono::Utc::now(),
            content_fingerprint: content_fingerprint(&documents),
        };

        info!(
            sources = documents.len(),
            chunks = chunks.len(),
            embedding = %manifest.identity(),
            "context index built"
        );
        ContextIndex::new(manifest, chunks)
    }

    async fn embed_documents(&self, documents: &[SourceDocument]) -> DomainResult<Vec<DocumentChunk>> {
        let pieces: Vec<_> = documents
            .iter()
            .flat_map(|doc| self.chunker.chunk(doc))
            .collect();

        let dimension = self.embedder.dimension();
        let mut chunks = Vec::with_capacity(pieces.len());
        for batch in pieces.chunks(self.embedder.max_batch_size().max(1)) {
            let inputs: Vec<EmbeddingInput> = batch
                .iter()
                .map(|piece| EmbeddingInput {
                    id: format!("{}:chunk:{}", piece.source, piece.chunk_index),
                    text: piece.text.clone(),
                })
                .collect();
            let outputs = self.embedder.embed_batch(&inputs).await?;
            if outputs.len() != batch.len() {
                return Err(DomainError::EmbeddingFailed(format!(
                    "provider returned {} vectors for {} chunks",
                    outputs.len(),
                    batch.len()
                )));
            }

            for (piece, output) in batch.iter().zip(outputs) {
                if output.vector.len() != dimension {
                    return Err(DomainError::EmbeddingFailed(format!(
                        "vector for {} has dimension {}, expected {dimension}",
                        output.id,
                        output.vector.len()
                    )));
                }
                chunks.push(DocumentChunk::new(
                    piece.source,
                    piece.chunk_index,
                    piece.text.clone(),
                    piece.token_count,
                    output.vector,
                ));
            }
        }
        Ok(chunks)
    }

    /// Describe the persisted index without loading its chunks.
    pub async fn status(&self) -> DomainResult<IndexStatus> {
        let manifest = self.store.read_manifest().await?;
        let incompatibility = manifest
            .as_ref()
            .and_then(|m| m.check_compatible(self.embedder.as_ref()).err())
            .map(|e| e.to_string());
        let stale = match &manifest {
            Some(m) => self.is_stale(m).await,
            None => None,
        };

        Ok(IndexStatus {
            dir: self.store.dir().to_path_buf(),
            manifest,
            active_embedding: self.embedder.identity(),
            incompatibility,
            stale,
        })
    }

    async fn is_stale(&self, manifest: &IndexManifest) -> Option<bool> {
        match self.documents.load_all().await {
            Ok(documents) => Some(content_fingerprint(&documents) != manifest.content_fingerprint),
            Err(e) => {
                tracing::debug!(error = %e, "cannot fingerprint documentation");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::domain::models::{ChunkingConfig, SourceId};

    async fn write_docs(dir: &std::path::Path) {
        for source in SourceId::ALL {
            tokio::fs::write(
                dir.join(source.file_name()),
                format!("Documento {source}. O navio atraca no porto. Cadastro de clientes."),
            )
            .await
            .unwrap();
        }
    }

    fn service(root: &std::path::Path, dimension: usize) -> IndexService {
        IndexService::new(
            DocumentStore::new(root.join("docs")),
            Chunker::with_config(ChunkingConfig::small()).unwrap(),
            IndexStore::new(root.join("index")),
            Arc::new(HashingEmbeddingProvider::new(dimension)),
        )
        .with_lock_wait(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_load_or_build_builds_once() {
        let root = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(root.path().join("docs")).await.unwrap();
        write_docs(&root.path().join("docs")).await;

        let svc = service(root.path(), 64);
        let first = svc.load_or_build().await.unwrap();
        assert!(svc.store().has_index().await);
        let built_at = first.manifest().built_at;

        let second = svc.load_or_build().await.unwrap();
        assert_eq!(second.manifest().built_at, built_at);
        assert_eq!(second.len(), first.len());
    }

    #[tokio::test]
    async fn test_missing_docs_is_index_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let err = service(root.path(), 64).load_or_build().await.unwrap_err();
        assert!(matches!(err, DomainError::IndexUnavailable(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_status_reports_staleness_and_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let docs = root.path().join("docs");
        tokio::fs::create_dir_all(&docs).await.unwrap();
        write_docs(&docs).await;

        let svc = service(root.path(), 64);
        assert!(svc.status().await.unwrap().manifest.is_none());
        svc.load_or_build().await.unwrap();
        assert_eq!(svc.status().await.unwrap().stale, Some(false));

        tokio::fs::write(docs.join(SourceId::Manual.file_name()), "Manual novo.")
            .await
            .unwrap();
        assert_eq!(svc.status().await.unwrap().stale, Some(true));

        let other = service(root.path(), 32).status().await.unwrap();
        assert!(other.incompatibility.is_some());
    }
}
