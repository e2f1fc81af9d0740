//! Embedding provider adapters

pub mod hashing;
pub mod openai;

pub use hashing::{HashingEmbeddingProvider, HASHING_MODEL};
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
