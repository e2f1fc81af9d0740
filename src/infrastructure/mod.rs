//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Documentation loading, chunking, and the persisted context index

pub mod config;
pub mod logging;
pub mod vector;
