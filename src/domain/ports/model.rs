//! Chat model port
//!
//! Abstracts the language model behind specialists and the supervisor, so
//! providers can be swapped without touching the routing or reasoning contracts.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ModelReply, ModelRequest};

/// A language model that returns either final text or tool-call requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name (e.g., "anthropic", "scripted")
    fn name(&self) -> &'static str;

    /// Run one completion.
    async fn complete(&self, request: ModelRequest) -> DomainResult<ModelReply>;
}
