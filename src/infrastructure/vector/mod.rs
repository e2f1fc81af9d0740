//! Vector infrastructure components
//!
//! Documentation loading, token-aware chunking, the in-memory context index,
//! and its on-disk persistence.

pub mod chunker;
pub mod context_index;
pub mod document_store;
pub mod index_store;

pub use chunker::Chunker;
pub use context_index::{cosine_similarity, ContextIndex, IndexManifest, INDEX_FORMAT_VERSION};
pub use document_store::{content_fingerprint, DocumentStore};
pub use index_store::{BuildLock, IndexStore};
