//! Domain models.

pub mod agent;
pub mod chunking;
pub mod config;
pub mod conversation;
pub mod document;
pub mod prompt;
pub mod role;
pub mod routing;
pub mod session;
pub mod tool;

pub use agent::{AgentDefinition, SpecialistOutcome, ToolTrace, TurnStatus};
pub use chunking::ChunkingConfig;
pub use config::{
    AgentsConfig, Config, EmbeddingConfig, IndexConfig, LoggingConfig, ModelConfig,
    RetrievalConfig, ToolsConfig,
};
pub use conversation::{
    ChatMessage, Conversation, ModelReply, ModelRequest, StopReason, TokenUsage, ToolCall,
};
pub use document::{DocumentChunk, ScoredChunk, SourceDocument, SourceId, TextChunk};
pub use prompt::ComposedPrompt;
pub use role::SpecialistRole;
pub use routing::{Language, Route, RouteDecision, RouteSource, SupervisorReply};
pub use session::SessionContext;
pub use tool::{
    Artifact, ChartKind, ChartSpec, OptimizationResult, PlanId, Record, RecordCommand,
    RecordQuery, RecordScope, ToolError, ToolSpec,
};
