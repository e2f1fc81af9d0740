//! Explicit construction of the assistant object graph.
//!
//! Startup order: embedder, index (load or build), retriever, composer,
//! specialists, router, supervisor. Only index errors abort startup.

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::embeddings::{HashingEmbeddingProvider, OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::models::{AnthropicChatModel, AnthropicConfig, ScriptedChatModel};
use crate::adapters::platform::{HttpPlatformClient, InMemoryPlatform};
use crate::adapters::tools::ToolBackends;
use crate::domain::models::{
    Config, Conversation, EmbeddingConfig, ModelConfig, SessionContext, SpecialistRole,
    SupervisorReply, ToolsConfig,
};
use crate::domain::ports::{ChatModel, EmbeddingProvider};
use crate::infrastructure::vector::{Chunker, DocumentStore, IndexStore};
use crate::services::{
    ContextRetriever, IndexService, IntentRouter, PromptComposer, SpecialistAgent, Supervisor,
    Team, TurnLimits,
};

/// Embedding provider selected by `embedding.provider`.
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbeddingProvider::new(config.dimension))),
        "openai" => {
            let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(config))
                .context("Failed to create OpenAI embedding provider")?;
            Ok(Arc::new(provider))
        }
        other => bail!("Unknown embedding provider: {other}"),
    }
}

/// Chat model selected by `model.provider`.
pub fn model_from_config(config: &ModelConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "anthropic" => {
            let anthropic = AnthropicConfig::from(config);
            if anthropic.get_api_key().is_none() {
                bail!("Anthropic API key not set. Set ANTHROPIC_API_KEY or configure model.api_key");
            }
            let model = AnthropicChatModel::new(anthropic).context("Failed to create Anthropic client")?;
            Ok(Arc::new(model))
        }
        "scripted" => Ok(Arc::new(ScriptedChatModel::cycling(config.scripted_replies.clone()))),
        other => bail!("Unknown model provider: {other}"),
    }
}

/// Tool backends: the platform API when configured, otherwise in memory.
pub fn backends_from_config(config: &ToolsConfig) -> Result<ToolBackends> {
    let allowed = config.allowed_entities.clone();
    match HttpPlatformClient::from_config(config).context("Failed to create platform client")? {
        Some(client) => {
            info!(base_url = ?config.platform_base_url, "using platform API for tools");
            Ok(ToolBackends::single(Arc::new(client), allowed))
        }
        None => {
            warn!("tools.platform_base_url is not set; records and artifacts are kept in memory");
            Ok(ToolBackends::single(Arc::new(InMemoryPlatform::new()), allowed))
        }
    }
}

/// Index lifecycle service for the configured directories.
pub fn index_service_from_config(
    config: &Config,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<IndexService> {
    let chunker = Chunker::with_config(config.index.chunking()).context("Invalid chunking configuration")?;
    Ok(IndexService::new(
        DocumentStore::new(PathBuf::from(&config.docs_dir)),
        chunker,
        IndexStore::new(PathBuf::from(&config.index.dir)),
        embedder,
    )
    .with_lock_wait(Duration::from_secs(config.index.lock_wait_secs)))
}

/// Load (or build on first use) the index and wrap it in a retriever.
pub async fn load_retriever(config: &Config) -> Result<ContextRetriever> {
    let embedder = embedder_from_config(&config.embedding)?;
    let service = index_service_from_config(config, Arc::clone(&embedder))?;
    let index = service
        .load_or_build()
        .await
        .context("Context index unavailable")?;
    Ok(ContextRetriever::new(Arc::new(index), embedder))
}

/// The supervisor and everything it needs to answer user turns.
pub struct AssistantRuntime {
    composer: Arc<PromptComposer>,
    supervisor: Supervisor,
}

impl AssistantRuntime {
    /// Build the runtime from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = embedder_from_config(&config.embedding)?;
        let model = model_from_config(&config.model)?;
        let backends = backends_from_config(&config.tools)?;
        Self::assemble(config, embedder, model, backends).await
    }

    /// Build the runtime from already constructed adapters.
    pub async fn assemble(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
        backends: ToolBackends,
    ) -> Result<Self> {
        let service = index_service_from_config(config, Arc::clone(&embedder))?;
        let index = service
            .load_or_build()
            .await
            .context("Context index unavailable")?;
        let retriever = ContextRetriever::new(Arc::new(index), embedder);
        let composer = Arc::new(PromptComposer::new(retriever, config.retrieval.clone()));

        let limits = TurnLimits::from(&config.agents);
        let agents = join_all(SpecialistRole::ALL.into_iter().map(|role| {
            SpecialistAgent::build(
                role,
                Arc::clone(&model),
                backends.tools_for(role),
                Arc::clone(&composer),
                limits,
            )
        }))
        .await;

        let mut team = Team::new();
        for agent in agents {
            team.add(agent).context("Failed to register specialist")?;
        }

        let router = if config.retrieval.model_fallback {
            IntentRouter::with_model_fallback(Arc::clone(&model))
        } else {
            IntentRouter::rules_only()
        };

        info!(
            specialists = ?team.role_names(),
            model = model.name(),
            "assistant runtime ready"
        );

        Ok(Self {
            composer,
            supervisor: Supervisor::new(router, team),
        })
    }

    /// Prompt composer shared by the specialists.
    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Turn supervisor.
    pub const fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Run one supervised turn over `conversation`.
    pub async fn handle(&self, conversation: &Conversation) -> SupervisorReply {
        self.supervisor.route(conversation).await
    }

    /// Answer a single message and resolve the session placeholders.
    pub async fn ask(&self, session: SessionContext, message: &str) -> (SupervisorReply, String) {
        let conversation = Conversation::with_user_message(session, message);
        let reply = self.handle(&conversation).await;
        let text = conversation.session.resolve(&reply.text);
        (reply, text)
    }
}
