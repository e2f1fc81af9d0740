//! Domain errors for the stevedore assistant.

use thiserror::Error;

/// Domain-level errors that can occur while grounding, routing, or running agents.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The persisted index is missing or corrupt and cannot be rebuilt.
    #[error("Context index unavailable: {0}")]
    IndexUnavailable(String),

    /// The persisted index was built with a different embedding function or format.
    #[error("Context index version mismatch: expected {expected}, found {found}")]
    IndexVersionMismatch { expected: String, found: String },

    /// A documentation source is missing or unreadable.
    #[error("Document source unavailable: {0}")]
    DocumentUnavailable(String),

    /// The embedding provider failed or returned malformed vectors.
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// The chat model could not be reached or returned an unusable reply.
    #[error("Model invocation failed: {0}")]
    ModelFailed(String),

    /// A tool call failed.
    #[error("Tool execution failed: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    /// A specialist used all of its model calls without a final answer.
    #[error("Iteration budget exceeded for {agent} after {iterations} model calls")]
    IterationBudgetExceeded { agent: String, iterations: u32 },

    /// A specialist turn ran past its deadline.
    #[error("Turn deadline of {timeout_secs}s exceeded for {agent}")]
    TurnDeadlineExceeded { agent: String, timeout_secs: u64 },

    /// Input or configuration was rejected.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the error must stop the process instead of degrading into a reply.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::IndexUnavailable(_) | Self::IndexVersionMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
