//! Specialist agents and their reasoning loop.
//!
//! One agent type covers every role; the role supplies instructions and the
//! tool subset. A turn alternates model calls and tool calls until the model
//! answers with text, bounded by an iteration cap and a deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::{
    AgentDefinition, AgentsConfig, ChatMessage, Conversation, Language, ModelRequest,
    SpecialistOutcome, SpecialistRole, ToolCall, ToolSpec, ToolTrace, TurnStatus,
};
use crate::domain::ports::{ChatModel, Tool, ToolContext};
use crate::infrastructure::logging::SecretScrubber;
use crate::services::aggregation::{failure_notice, mentions_error, tool_error_note};
use crate::services::prompt_composer::PromptComposer;

/// Limits applied to every specialist turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnLimits {
    /// Model calls allowed per turn
    pub max_iterations: u32,
    /// Wall-clock limit for one turn.
    pub turn_timeout: Duration,
    /// Recompose the system prompt from the user's message each turn
    pub per_turn_retrieval: bool,
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            max_iterations: 6,
            turn_timeout: Duration::from_secs(120),
            per_turn_retrieval: true,
        }
    }
}

impl From<&AgentsConfig> for TurnLimits {
    fn from(config: &AgentsConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            turn_timeout: Duration::from_secs(config.turn_timeout_secs),
            per_turn_retrieval: config.per_turn_retrieval,
        }
    }
}

#[derive(Default)]
struct TurnState {
    iterations: u32,
    traces: Vec<ToolTrace>,
}

enum LoopFailure {
    Budget,
    Model(DomainError),
}

/// A role-configured agent bound to a model and its tools.
pub struct SpecialistAgent {
    definition: AgentDefinition,
    model: Arc<dyn ChatModel>,
    tools: HashMap<String, Arc<dyn Tool>>,
    tool_specs: Vec<ToolSpec>,
    composer: Arc<PromptComposer>,
    limits: TurnLimits,
}

impl SpecialistAgent {
    /// Build an agent; its construction-time prompt uses empty-query context.
    pub async fn build(
        role: SpecialistRole,
        model: Arc<dyn ChatModel>,
        tools: Vec<Arc<dyn Tool>>,
        composer: Arc<PromptComposer>,
        limits: TurnLimits,
    ) -> Self {
        let prompt = composer.compose_prompt(role, "").await;
        let definition = AgentDefinition::new(role, prompt);
        let tool_specs: Vec<ToolSpec> = tools.iter().map(|t| t.spec()).collect();
        let tools = tools
            .into_iter()
            .map(|t| (t.spec().name, t))
            .collect();

        info!(
            agent = %definition.role_name,
            tools = ?definition.tool_names,
            model = model.name(),
            "specialist ready"
        );

        Self {
            definition,
            model,
            tools,
            tool_specs,
            composer,
            limits,
        }
    }

    /// Prompt, tools and name of this agent.
    pub const fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    /// Role this agent plays.
    pub const fn role(&self) -> SpecialistRole {
        self.definition.role
    }

    /// Agent name as used in logs and replies.
    pub fn role_name(&self) -> &str {
        &self.definition.role_name
    }

    /// Iteration and time limits.
    pub const fn limits(&self) -> &TurnLimits {
        &self.limits
    }

    /// System prompt for this turn, placeholders resolved.
    async fn system_prompt(&self, conversation: &Conversation) -> String {
        let prompt = match conversation.latest_user_message() {
            Some(message) if self.limits.per_turn_retrieval && !message.trim().is_empty() => {
                self.composer.compose_prompt(self.role(), message).await
            }
            _ => self.definition.system_prompt.clone(),
        };
        conversation.session.resolve(&prompt.render())
    }

    /// Run one turn over `conversation`.
    ///
    /// Never fails: model errors, the iteration cap, and the deadline all end
    /// the turn with an explicit failure text.
    #[instrument(skip_all, fields(agent = %self.definition.role_name))]
    pub async fn run(&self, conversation: &Conversation) -> SpecialistOutcome {
        let language = Language::detect(conversation.latest_user_message().unwrap_or_default());
        let system = self.system_prompt(conversation).await;
        let scrubber = SecretScrubber::new().with_secret(conversation.session.token.clone());
        let ctx = ToolContext::new(conversation.session.clone());

        let mut state = TurnState::default();
        let result = tokio::time::timeout(
            self.limits.turn_timeout,
            self.reason(system, conversation.messages.clone(), &ctx, &scrubber, &mut state),
        )
        .await;

        let (status, text) = match result {
            Ok(Ok(text)) => (
                TurnStatus::Completed,
                self.report_unresolved_failures(text, &state.traces, language),
            ),
            Ok(Err(LoopFailure::Budget)) => {
                let err = DomainError::IterationBudgetExceeded {
                    agent: self.definition.role_name.clone(),
                    iterations: state.iterations,
                };
                warn!(error = %err, "specialist turn stopped");
                let status = TurnStatus::BudgetExceeded;
                (status, failure_notice(status, self.role(), language))
            }
            Ok(Err(LoopFailure::Model(e))) => {
                warn!(error = %scrubber.scrub_message(&e.to_string()), "model call failed");
                let status = TurnStatus::ModelFailed;
                (status, failure_notice(status, self.role(), language))
            }
            Err(_) => {
                let err = DomainError::TurnDeadlineExceeded {
                    agent: self.definition.role_name.clone(),
                    timeout_secs: self.limits.turn_timeout.as_secs(),
                };
                warn!(iterations = state.iterations, error = %err, "specialist turn stopped");
                let status = TurnStatus::DeadlineExceeded;
                (status, failure_notice(status, self.role(), language))
            }
        };

        info!(
            status = %status,
            iterations = state.iterations,
            tool_calls = state.traces.len(),
            "specialist turn finished"
        );

        SpecialistOutcome {
            role: self.role(),
            status,
            text,
            iterations: state.iterations,
            tool_calls: state.traces,
        }
    }

    async fn reason(
        &self,
        system: String,
        mut messages: Vec<ChatMessage>,
        ctx: &ToolContext,
        scrubber: &SecretScrubber,
        state: &mut TurnState,
    ) -> Result<String, LoopFailure> {
        loop {
            if state.iterations >= self.limits.max_iterations {
                return Err(LoopFailure::Budget);
            }
            state.iterations += 1;

            let request = ModelRequest::new(system.clone(), messages.clone())
                .with_tools(self.tool_specs.clone());
            let reply = self.model.complete(request).await.map_err(LoopFailure::Model)?;

            if !reply.wants_tools() {
                return Ok(reply.content);
            }

            messages.push(ChatMessage::Assistant {
                content: reply.content.clone(),
                tool_calls: reply.tool_calls.clone(),
            });
            for call in &reply.tool_calls {
                let trace = self.invoke(call, ctx, scrubber).await;
                messages.push(ChatMessage::ToolResult {
                    call_id: call.id.clone(),
                    content: trace.observation.clone(),
                    is_error: !trace.succeeded,
                });
                state.traces.push(trace);
            }
        }
    }

    /// Call a tool; failures become error observations.
    async fn invoke(&self, call: &ToolCall, ctx: &ToolContext, scrubber: &SecretScrubber) -> ToolTrace {
        let arguments = scrubber.scrub_message(&call.arguments.to_string());
        let operation = call
            .arguments
            .get("operation")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return ToolTrace {
                tool: call.name.clone(),
                operation,
                succeeded: false,
                observation: format!("Erro: ferramenta desconhecida '{}'", call.name),
            };
        };

        match tool.call(&call.arguments, ctx).await {
            Ok(observation) => {
                info!(tool = %call.name, arguments = %arguments, "tool call succeeded");
                debug!(observation = %scrubber.scrub_message(&observation));
                ToolTrace {
                    tool: call.name.clone(),
                    operation,
                    succeeded: true,
                    observation,
                }
            }
            Err(e) => {
                let observation = format!("Erro ao executar {}: {e}", call.name);
                let error = e.for_tool(&call.name);
                warn!(
                    tool = %call.name,
                    arguments = %arguments,
                    error = %scrubber.scrub_message(&error.to_string()),
                    "tool call failed"
                );
                ToolTrace {
                    tool: call.name.clone(),
                    operation,
                    succeeded: false,
                    observation,
                }
            }
        }
    }

    /// Make sure a tool failure that was never recovered reaches the user.
    ///
    /// A failure counts as recovered when a later call of the same tool succeeded.
    fn report_unresolved_failures(
        &self,
        text: String,
        traces: &[ToolTrace],
        language: Language,
    ) -> String {
        let mut last_by_tool: Vec<&ToolTrace> = Vec::new();
        for trace in traces {
            match last_by_tool.iter_mut().find(|t| t.tool == trace.tool) {
                Some(slot) => *slot = trace,
                None => last_by_tool.push(trace),
            }
        }
        let unresolved: Vec<&&ToolTrace> = last_by_tool.iter().filter(|t| !t.succeeded).collect();

        if unresolved.is_empty() || mentions_error(&text) {
            return text;
        }

        debug!(agent = %self.definition.role_name, "appending unreported tool errors");
        let notes: Vec<String> = unresolved
            .iter()
            .map(|t| tool_error_note(&t.tool, &t.observation, language))
            .collect();
        if text.trim().is_empty() {
            notes.join("\n")
        } else {
            format!("{}\n{}", text.trim_end(), notes.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::adapters::models::ScriptedChatModel;
    use crate::adapters::platform::InMemoryPlatform;
    use crate::adapters::tools::ToolBackends;
    use crate::domain::models::{ModelReply, RetrievalConfig, SessionContext};
    use crate::infrastructure::vector::{ContextIndex, IndexManifest, INDEX_FORMAT_VERSION};
    use crate::services::context_retriever::ContextRetriever;
    use serde_json::json;

    fn composer() -> Arc<PromptComposer> {
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: "hashing".into(),
            embedding_model: "token-hash-v1".into(),
            dimension: 16,
            chunk_size: 400,
            chunk_overlap: 40,
            chunk_count: 0,
            built_at: chrono::Utc::now(),
            content_fingerprint: String::new(),
        };
        let retriever = ContextRetriever::new(
            Arc::new(ContextIndex::new(manifest, Vec::new()).unwrap()),
            Arc::new(HashingEmbeddingProvider::new(16)),
        );
        Arc::new(PromptComposer::new(retriever, RetrievalConfig::default()))
    }

    async fn agent(
        role: SpecialistRole,
        model: ScriptedChatModel,
        platform: &InMemoryPlatform,
        limits: TurnLimits,
    ) -> SpecialistAgent {
        let backends = ToolBackends::single(Arc::new(platform.clone()), vec!["cliente".into()]);
        SpecialistAgent::build(role, Arc::new(model), backends.tools_for(role), composer(), limits).await
    }

    fn conversation(message: &str) -> Conversation {
        Conversation::with_user_message(SessionContext::new("42", "7", "Ana", "tok-secret"), message)
    }

    #[tokio::test]
    async fn test_tool_call_then_final_text() {
        let platform = InMemoryPlatform::new();
        platform.add_plan("Navio A", "plan-17", 36.5, 12).await;
        let model = ScriptedChatModel::with_replies([
            ModelReply::tool_call("get_plan", json!({"name": "Navio A"})),
            ModelReply::tool_call("run_optimization", json!({"plan_id": "plan-17"})),
            ModelReply::text("Otimização concluída: 36.5 horas, 12 sequências."),
        ]);
        let agent = agent(SpecialistRole::Optimizer, model.clone(), &platform, TurnLimits::default()).await;

        let outcome = agent.run(&conversation("otimizar plano Navio A")).await;
        assert_eq!(outcome.status, TurnStatus::Completed);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.tool_calls.len(), 2);
        assert!(outcome.tool_calls.iter().all(|t| t.succeeded));

        let requests = model.requests().await;
        assert!(requests[0].system.contains("Contexto Otimizador:"));
        assert!(requests[0].system.contains("tok-secret"), "token placeholder resolved");
        assert!(!requests[0].system.contains("{{token}}"));
        assert_eq!(requests[0].tools.len(), 2);
        assert!(matches!(
            requests[2].messages.last(),
            Some(ChatMessage::ToolResult { is_error: false, .. })
        ));
    }

    #[tokio::test]
    async fn test_tool_error_is_observed_and_reported() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::with_replies([
            ModelReply::tool_call("get_plan", json!({"name": "Navio Z"})),
            ModelReply::text("Pronto."),
        ]);
        let agent = agent(SpecialistRole::Optimizer, model.clone(), &platform, TurnLimits::default()).await;

        let outcome = agent.run(&conversation("otimizar plano Navio Z")).await;
        assert_eq!(outcome.status, TurnStatus::Completed);
        assert_eq!(outcome.failed_tools().count(), 1);
        assert!(outcome.text.contains("Erro na ferramenta get_plan"));

        let requests = model.requests().await;
        assert!(matches!(
            requests[1].messages.last(),
            Some(ChatMessage::ToolResult { is_error: true, content, .. }) if content.contains("not found")
        ));
    }

    #[tokio::test]
    async fn test_recovered_tool_error_is_not_appended() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::with_replies([
            ModelReply::tool_call("query", json!({"operation": "create", "entity": "navio", "fields": {"nome": "X"}})),
            ModelReply::tool_call("query", json!({"operation": "create", "entity": "cliente", "fields": {"nome": "ACME"}})),
            ModelReply::text("Cliente ACME cadastrado. Acesse /clientes."),
        ]);
        let agent = agent(SpecialistRole::Helper, model, &platform, TurnLimits::default()).await;

        let outcome = agent.run(&conversation("cadastrar cliente ACME")).await;
        assert_eq!(outcome.text, "Cliente ACME cadastrado. Acesse /clientes.");
        assert_eq!(outcome.failed_tools().count(), 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_gives_explicit_failure() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::with_replies(
            (0..10).map(|_| ModelReply::tool_call("query", json!({"operation": "query", "entity": "cliente"}))),
        );
        let limits = TurnLimits {
            max_iterations: 3,
            ..TurnLimits::default()
        };
        let agent = agent(SpecialistRole::Helper, model.clone(), &platform, limits).await;

        let outcome = agent.run(&conversation("listar clientes")).await;
        assert_eq!(outcome.status, TurnStatus::BudgetExceeded);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(model.call_count().await, 3);
        assert!(outcome.text.starts_with("Erro"));
    }

    #[tokio::test]
    async fn test_deadline_gives_explicit_failure() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::cycling(vec!["tarde demais".into()])
            .with_delay(Duration::from_millis(500));
        let limits = TurnLimits {
            turn_timeout: Duration::from_millis(50),
            ..TurnLimits::default()
        };
        let agent = agent(SpecialistRole::Helper, model, &platform, limits).await;

        let outcome = agent.run(&conversation("cadastrar cliente")).await;
        assert_eq!(outcome.status, TurnStatus::DeadlineExceeded);
        assert!(outcome.text.contains("tempo limite"));
    }

    #[tokio::test]
    async fn test_model_failure_gives_explicit_failure() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::new();
        model.push_error("overloaded").await;
        let agent = agent(SpecialistRole::Analytics, model, &platform, TurnLimits::default()).await;

        let outcome = agent.run(&conversation("show me the sales report")).await;
        assert_eq!(outcome.status, TurnStatus::ModelFailed);
        assert!(outcome.text.starts_with("Error"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_observation() {
        let platform = InMemoryPlatform::new();
        let model = ScriptedChatModel::with_replies([
            ModelReply::tool_call("run_optimization", json!({"plan_id": "p"})),
            ModelReply::text("Não foi possível executar."),
        ]);
        let agent = agent(SpecialistRole::Helper, model, &platform, TurnLimits::default()).await;

        let outcome = agent.run(&conversation("otimizar")).await;
        assert_eq!(outcome.status, TurnStatus::Completed);
        assert!(!outcome.tool_calls[0].succeeded);
        assert_eq!(outcome.text, "Não foi possível executar.");
    }
}
