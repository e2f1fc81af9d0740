//! Adapters for external systems: embedding providers, chat models, the
//! platform API, and the agent tools built on top of it.

pub mod embeddings;
pub mod models;
pub mod platform;
pub mod tools;
