//! Stevedore - retrieval-grounded platform assistant
//!
//! A supervisor routes each user message to one of three specialist agents
//! (helper, data analytics, optimizer). Every specialist's system prompt is
//! grounded in chunks retrieved from a persisted index over the platform
//! documentation.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, ports, and errors
//! - **Adapters** (`adapters`): Embedding providers, chat models, platform backends, agent tools
//! - **Infrastructure Layer** (`infrastructure`): Configuration, logging, the context index
//! - **Service Layer** (`services`): Retrieval, prompt composition, specialists, routing, supervisor
//! - **Application Layer** (`application`): Runtime construction from configuration
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use stevedore::application::AssistantRuntime;
//! use stevedore::domain::models::SessionContext;
//! use stevedore::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let runtime = AssistantRuntime::from_config(&config).await?;
//!     let session = SessionContext::new("42", "7", "Ana", "token");
//!     let (_, text) = runtime.ask(session, "gráfico de vendas do mês").await;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::AssistantRuntime;
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Conversation, LoggingConfig, SessionContext, SpecialistRole, SupervisorReply,
};
pub use domain::ports::{ChatModel, EmbeddingProvider, Tool};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ContextRetriever, PromptComposer, Supervisor};
