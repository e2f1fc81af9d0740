//! Persistence for the context index
//!
//! Layout of the index directory:
//! - `chunks.json`: every chunk with its embedding
//! - `manifest.json`: version stamp, written last so its presence marks a complete index
//! - `.build.lock`: held while a process builds and saves

use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::context_index::{ContextIndex, IndexManifest};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DocumentChunk;
use crate::domain::ports::EmbeddingProvider;

/// Build metadata file.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Chunk and vector file.
pub const CHUNKS_FILE: &str = "chunks.json";
/// Marker held while a build is running.
pub const LOCK_FILE: &str = ".build.lock";

/// Reads and writes a persisted context index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Index directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a complete index has been saved.
    pub async fn has_index(&self) -> bool {
        tokio::fs::try_exists(self.dir.join(MANIFEST_FILE))
            .await
            .unwrap_or(false)
    }

    /// Read the manifest, `None` if no index has been saved.
    pub async fn read_manifest(&self) -> DomainResult<Option<IndexManifest>> {
        let path = self.dir.join(MANIFEST_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::IndexUnavailable(format!(
                    "{}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            DomainError::IndexUnavailable(format!("corrupt manifest {}: {e}", path.display()))
        })
    }

    /// Load the persisted index, refusing one built by another embedding function.
    pub async fn load(&self, embedder: &dyn EmbeddingProvider) -> DomainResult<ContextIndex> {
        let manifest = self.read_manifest().await?.ok_or_else(|| {
            DomainError::IndexUnavailable(format!("no index at {}", self.dir.display()))
        })?;
        manifest.check_compatible(embedder)?;

        let path = self.dir.join(CHUNKS_FILE);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::IndexUnavailable(format!("{}: {e}", path.display())))?;
        let chunks: Vec<DocumentChunk> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::IndexUnavailable(format!("corrupt chunks {}: {e}", path.display()))
        })?;

        ContextIndex::new(manifest, chunks)
    }

    /// Save the index; chunks first, manifest last, each via rename.
    pub async fn save(&self, index: &ContextIndex) -> DomainResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        write_atomic(&self.dir.join(CHUNKS_FILE), &serde_json::to_vec(index.chunks())?).await?;
        write_atomic(
            &self.dir.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(index.manifest())?,
        )
        .await?;
        tracing::info!(
            dir = %self.dir.display(),
            chunks = index.len(),
            "context index saved"
        );
        Ok(())
    }

    /// Delete a saved index; the manifest goes first.
    pub async fn remove(&self) -> DomainResult<()> {
        for file in [MANIFEST_FILE, CHUNKS_FILE] {
            match tokio::fs::remove_file(self.dir.join(file)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Take the cross-process build lock, waiting up to `wait` for a holder to finish.
    pub async fn acquire_lock(&self, wait: Duration) -> DomainResult<BuildLock> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(LOCK_FILE);

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(50))
            .with_max_interval(Duration::from_secs(2))
            .with_max_elapsed_time(Some(wait))
            .build();

        let lock_path = &path;
        let result = retry(policy, move || async move {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(lock_path)
                .await
            {
                Ok(mut file) => {
                    let stamp = format!(
                        "pid={} at={}\n",
                        std::process::id(),
                        chrono::Utc::now().to_rfc3339()
                    );
                    // The lock is the file's existence; the stamp is informational
                    let _ = file.write_all(stamp.as_bytes()).await;
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(lock = %lock_path.display(), "index build lock held, waiting");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await;

        match result {
            Ok(()) => Ok(BuildLock { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(DomainError::IndexUnavailable(format!(
                    "timed out after {}s waiting for build lock {}; remove it if no build is running",
                    wait.as_secs(),
                    path.display()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Held build lock; the lock file is removed on drop.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release build lock");
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> DomainResult<()> {
    let tmp = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::domain::models::SourceId;
    use crate::infrastructure::vector::context_index::INDEX_FORMAT_VERSION;

    fn sample_index(embedder: &HashingEmbeddingProvider) -> ContextIndex {
        let chunks = vec![DocumentChunk::new(
            SourceId::Glossary,
            0,
            "navio".into(),
            1,
            embedder.embed_text("navio"),
        )];
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: "hashing".into(),
            embedding_model: embedder.model().to_string(),
            dimension: embedder.dimension(),
            chunk_size: 400,
            chunk_overlap: 40,
            chunk_count: 1,
            built_at: chrono::Utc::now(),
            content_fingerprint: "f".into(),
        };
        ContextIndex::new(manifest, chunks).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("index"));
        let embedder = HashingEmbeddingProvider::new(64);

        assert!(!store.has_index().await);
        store.save(&sample_index(&embedder)).await.unwrap();
        assert!(store.has_index().await);

        let loaded = store.load(&embedder).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.chunks()[0].text, "navio");
    }

    #[tokio::test]
    async fn test_load_refuses_other_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store
            .save(&sample_index(&HashingEmbeddingProvider::new(64)))
            .await
            .unwrap();

        let err = store
            .load(&HashingEmbeddingProvider::new(128))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IndexVersionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(MANIFEST_FILE), "{not json")
            .await
            .unwrap();
        let err = IndexStore::new(dir.path()).read_manifest().await.unwrap_err();
        assert!(matches!(err, DomainError::IndexUnavailable(_)));
    }

    #[tokio::test]
    async fn test_remove_deletes_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        store
            .save(&sample_index(&HashingEmbeddingProvider::new(64)))
            .await
            .unwrap();
        store.remove().await.unwrap();
        assert!(!store.has_index().await);
        store.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_and_released() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        let lock = store.acquire_lock(Duration::from_secs(1)).await.unwrap();
        let err = store
            .acquire_lock(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IndexUnavailable(ref m) if m.contains("build lock")));

        drop(lock);
        assert!(store.acquire_lock(Duration::from_secs(1)).await.is_ok());
    }
}
