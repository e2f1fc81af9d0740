//! Port trait definitions (Hexagonal Architecture)
//!
//! - `EmbeddingProvider`: text to vector
//! - `ChatModel`: system prompt plus conversation to text or tool calls
//! - `Tool`: a callable exposed to specialists
//! - `RecordStore`, `PlanDirectory`, `OptimizationEngine`: platform backends behind the tools

pub mod embedding;
pub mod model;
pub mod tools;

pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use model::ChatModel;
pub use tools::{OptimizationEngine, PlanDirectory, RecordStore, Tool, ToolContext};
