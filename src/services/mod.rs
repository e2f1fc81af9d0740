//! Retrieval, prompt composition, specialist turns, routing, and supervision.

pub mod aggregation;
pub mod context_retriever;
pub mod index_service;
pub mod prompt_composer;
pub mod router;
pub mod specialist;
pub mod supervisor;
pub mod team;

pub use context_retriever::ContextRetriever;
pub use index_service::{IndexService, IndexStatus};
pub use prompt_composer::PromptComposer;
pub use router::IntentRouter;
pub use specialist::{SpecialistAgent, TurnLimits};
pub use supervisor::Supervisor;
pub use team::Team;
