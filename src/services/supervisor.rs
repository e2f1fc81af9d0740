//! Single-dispatch supervisor.
//!
//! Routes each user turn to at most one specialist and turns its outcome
//! into the final reply. The reply text may still contain `{{username}}`.

use tracing::{info, instrument, warn};

use crate::domain::models::{Conversation, Language, Route, SupervisorReply};
use crate::services::aggregation::{acknowledgment, aggregate, greeting};
use crate::services::router::IntentRouter;
use crate::services::team::Team;

/// Routes each turn and turns the specialist outcome into the user reply.
pub struct Supervisor {
    router: IntentRouter,
    team: Team,
}

impl Supervisor {
    /// Supervisor over `team`, routed by `router`.
    pub const fn new(router: IntentRouter, team: Team) -> Self {
        Self { router, team }
    }

    /// Registered specialists.
    pub const fn team(&self) -> &Team {
        &self.team
    }

    /// Handle the latest user message of `conversation`.
    #[instrument(skip_all, fields(user = %conversation.session.user_id))]
    pub async fn route(&self, conversation: &Conversation) -> SupervisorReply {
        let language = Language::detect(conversation.latest_user_message().unwrap_or_default());
        let decision = self.router.decide(conversation).await;
        info!(route = %decision.route, source = ?decision.source, "turn routed");

        let role = match decision.route {
            Route::Direct => {
                return SupervisorReply {
                    text: greeting(language),
                    decision,
                    language,
                    specialist_status: None,
                };
            }
            Route::Specialist(role) => role,
        };

        let Some(agent) = self.team.get(role) else {
            warn!(role = %role, "no specialist registered for route");
            return SupervisorReply {
                text: acknowledgment(language),
                decision,
                language,
                specialist_status: None,
            };
        };

        let outcome = agent.run(conversation).await;
        let text = aggregate(&outcome, language);
        SupervisorReply {
            text,
            decision,
            language,
            specialist_status: Some(outcome.status),
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
    use crate::domain::models::{
        ModelReply, RetrievalConfig, SessionContext, SpecialistRole, TurnStatus,
    };
    use crate::infrastructure::vector::{ContextIndex, IndexManifest, INDEX_FORMAT_VERSION};
    use crate::services::context_retriever::ContextRetriever;
    use crate::services::prompt_composer::PromptComposer;
    use crate::services::specialist::{SpecialistAgent, TurnLimits};
    use serde_json::json;
    use std::sync::Arc;

    async fn supervisor(role: SpecialistRole, model: ScriptedChatModel) -> Supervisor {
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_provider: "hashing".into(),
            embedding_model: "token-hash-v1".into(),
            dimension: 8,
            chunk_size: 400,
            chunk_overlap: 40,
            chunk_count: 0,
            built_at: chrono::Utc::now(),
            content_fingerprint: String::new(),
        };
        let retriever = ContextRetriever::new(
            Arc::new(ContextIndex::new(manifest, Vec::new()).unwrap()),
            Arc::new(HashingEmbeddingProvider::new(8)),
        );
        let composer = Arc::new(PromptComposer::new(retriever, RetrievalConfig::default()));
        let backends = ToolBackends::single(Arc::new(InMemoryPlatform::new()), vec!["cliente".into()]);
        let agent = SpecialistAgent::build(
            role,
            Arc::new(model),
            backends.tools_for(role),
            composer,
            TurnLimits::default(),
        )
        .await;
        let mut team = Team::new();
        team.add(agent).unwrap();
        Supervisor::new(IntentRouter::rules_only(), team)
    }

    fn conversation(message: &str) -> Conversation {
        Conversation::with_user_message(SessionContext::new("1", "2", "Ana", "t"), message)
    }

    #[tokio::test]
    async fn test_greeting_never_dispatches() {
        let model = ScriptedChatModel::new();
        let sup = supervisor(SpecialistRole::Helper, model.clone()).await;

        let reply = sup.route(&conversation("bom dia")).await;
        assert_eq!(reply.decision.route, Route::Direct);
        assert!(reply.text.contains("{{username}}"));
        assert!(reply.specialist_status.is_none());
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_specialist_acknowledges() {
        let sup = supervisor(SpecialistRole::Helper, ScriptedChatModel::new()).await;
        let reply = sup.route(&conversation("otimizar plano Navio A")).await;
        assert_eq!(reply.text, acknowledgment(Language::Portuguese));
    }

    #[tokio::test]
    async fn test_helper_reply_is_aggregated() {
        let model = ScriptedChatModel::with_replies([ModelReply::text(
            "Vou executar a consulta.\nPara cadastrar o cliente, informe o nome e o CNPJ.",
        )]);
        let sup = supervisor(SpecialistRole::Helper, model).await;

        let reply = sup.route(&conversation("cadastrar novo cliente")).await;
        assert_eq!(reply.specialist_status, Some(TurnStatus::Completed));
        assert_eq!(
            reply.text,
            "{{username}}, para cadastrar o cliente, informe o nome e o CNPJ."
        );
    }

    #[tokio::test]
    async fn test_analytics_confirms_only() {
        let model = ScriptedChatModel::with_replies([
            ModelReply::tool_call(
                "query",
                json!({"operation": "publish_chart", "chart": {
                    "kind": "bar", "title": "Vendas", "labels": ["jan"], "values": [10.0]
                }}),
            ),
            ModelReply::text("Gráfico publicado: jan 10."),
        ]);
        let sup = supervisor(SpecialistRole::Analytics, model).await;

        let reply = sup.route(&conversation("gráfico de vendas do mês")).await;
        assert!(!reply.text.contains("jan 10"));
        assert!(reply.text.contains("plataforma"));
    }
}
