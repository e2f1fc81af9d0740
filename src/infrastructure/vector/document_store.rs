//! Documentation corpus loader
//!
//! Reads the fixed set of source files from the documentation directory.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SourceDocument, SourceId};

/// Loads the documentation sources from a directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `source`.
    pub fn path_of(&self, source: SourceId) -> PathBuf {
        self.dir.join(source.file_name())
    }

    /// Load every source whole, in index order.
    ///
    /// All sources must be present; an empty file is allowed.
    pub async fn load_all(&self) -> DomainResult<Vec<SourceDocument>> {
        let mut documents = Vec::with_capacity(SourceId::ALL.len());
        for source in SourceId::ALL {
            let path = self.path_of(source);
            let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                DomainError::DocumentUnavailable(format!("{}: {e}", path.display()))
            })?;
            tracing::debug!(source = %source, bytes = text.len(), "loaded documentation source");
            documents.push(SourceDocument::new(source, text));
        }
        Ok(documents)
    }
}

/// Stable hex digest over source ids and contents.
pub fn content_fingerprint(documents: &[SourceDocument]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.source.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.text.as_bytes());
        hasher.update([0u8]);
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
