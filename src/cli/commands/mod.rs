//! CLI command implementations.

pub mod ask;
pub mod index;
pub mod prompt;
