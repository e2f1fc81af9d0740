//! Intent routing for the supervisor.
//!
//! Keyword rules run first. A greeting-only message is answered directly.
//! Otherwise explicit intent words (verbs like "cadastrar" or "otimizar",
//! nouns like "gráfico") are checked for helper, analytics, then optimizer,
//! and only when none is present do the weaker hint words ("ajuda",
//! "quais", "mostrar") decide. Messages no rule covers are classified by the
//! supervisor model when one is configured, and otherwise go to the helper.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::role::SUPERVISOR_INSTRUCTIONS;
use crate::domain::models::routing::{fold_text, words};
use crate::domain::models::{
    Conversation, ModelRequest, Route, RouteDecision, RouteSource, SpecialistRole,
};
use crate::domain::ports::ChatModel;

/// Words a greeting-only message may consist of.
const GREETING_WORDS: &[&str] = &[
    "oi", "ola", "opa", "bom", "boa", "dia", "tarde", "noite", "tudo", "bem", "e", "ai", "com",
    "como", "vai", "voce", "vc", "tal", "que", "hello", "hi", "hey", "good", "morning",
    "afternoon", "evening", "how", "are", "you", "there",
];

/// At least one of these must appear for a message to count as a greeting.
const GREETING_MARKERS: &[&str] = &["oi", "ola", "opa", "bom", "boa", "hello", "hi", "hey", "good"];

const HELPER_INTENT: &[&str] = &[
    "cadastr", "registr", "alter", "atualiz", "edit", "modific", "adicion", "register", "update",
    "modify",
];

const HELPER_HINTS: &[&str] = &[
    "ajuda", "naveg", "pagina", "menu", "funcion", "duvida", "help", "navigat", "page",
];

const ANALYTICS_INTENT: &[&str] = &[
    "relat", "grafic", "report", "chart", "graph", "dashboard", "estatist", "metric",
];

const ANALYTICS_HINTS: &[&str] = &[
    "consult", "list", "quant", "mostr", "exib", "show", "quais", "which", "existent",
];

const OPTIMIZER_INTENT: &[&str] = &[
    "otimiz", "optimi", "sequenc", "carregamento", "descarregamento", "loading", "unloading",
];

/// Explicit intent stems per role, in priority order.
const INTENT_RULES: [(SpecialistRole, &[&str]); 3] = [
    (SpecialistRole::Helper, HELPER_INTENT),
    (SpecialistRole::Analytics, ANALYTICS_INTENT),
    (SpecialistRole::Optimizer, OPTIMIZER_INTENT),
];

/// Hint stems, consulted only when no intent stem matched.
const HINT_RULES: [(SpecialistRole, &[&str]); 2] = [
    (SpecialistRole::Helper, HELPER_HINTS),
    (SpecialistRole::Analytics, ANALYTICS_HINTS),
];

/// Apply the keyword rules to `message`.
///
/// Returns `None` when no rule matches.
pub fn classify_by_rules(message: &str) -> Option<RouteDecision> {
    let folded = fold_text(message);
    let tokens: Vec<&str> = words(&folded).collect();

    if tokens.is_empty() {
        return Some(RouteDecision {
            route: Route::Direct,
            source: RouteSource::Rule,
            matched: None,
        });
    }

    let greeting_only = tokens.iter().all(|t| GREETING_WORDS.contains(t))
        && tokens.iter().any(|t| GREETING_MARKERS.contains(t));
    if greeting_only {
        return Some(RouteDecision::rule(Route::Direct, tokens.join(" ")));
    }

    first_rule_match(&tokens, &INTENT_RULES).or_else(|| first_rule_match(&tokens, &HINT_RULES))
}

fn first_rule_match(tokens: &[&str], rules: &[(SpecialistRole, &[&str])]) -> Option<RouteDecision> {
    rules.iter().find_map(|(role, stems)| {
        tokens.iter().find_map(|token| {
            stems
                .iter()
                .find(|stem| token.starts_with(*stem))
                .map(|stem| RouteDecision::rule(Route::Specialist(*role), *stem))
        })
    })
}

/// Picks the route for a user turn.
pub struct IntentRouter {
    classifier: Option<Arc<dyn ChatModel>>,
}

impl IntentRouter {
    /// Router that uses the keyword rules only.
    pub const fn rules_only() -> Self {
        Self { classifier: None }
    }

    /// Router that asks `model` when no rule matches.
    pub fn with_model_fallback(model: Arc<dyn ChatModel>) -> Self {
        Self {
            classifier: Some(model),
        }
    }

    /// Decision used when nothing else matched.
    pub fn fallback() -> RouteDecision {
        RouteDecision {
            route: Route::Specialist(SpecialistRole::Helper),
            source: RouteSource::Fallback,
            matched: None,
        }
    }

    /// Route the latest user message: rules first, then the model when enabled.
    pub async fn decide(&self, conversation: &Conversation) -> RouteDecision {
        let message = conversation.latest_user_message().unwrap_or_default();
        if let Some(decision) = classify_by_rules(message) {
            debug!(route = %decision.route, matched = ?decision.matched, "routing rule matched");
            return decision;
        }

        let Some(model) = &self.classifier else {
            debug!("no routing rule matched, using fallback");
            return Self::fallback();
        };

        let request = ModelRequest::new(
            conversation.session.resolve(SUPERVISOR_INSTRUCTIONS),
            conversation.messages.clone(),
        );
        match model.complete(request).await {
            Ok(reply) => match parse_label(&reply.content) {
                Some(route) => {
                    info!(route = %route, "supervisor model classified the message");
                    RouteDecision {
                        route,
                        source: RouteSource::Model,
                        matched: Some(reply.content.trim().to_string()),
                    }
                }
                None => {
                    warn!(answer = %reply.content.trim(), "unusable classification, using fallback");
                    Self::fallback()
                }
            },
            Err(e) => {
                warn!(error = %e, "classification failed, using fallback");
                Self::fallback()
            }
        }
    }
}

/// Take the first word of the answer that is a route label.
fn parse_label(answer: &str) -> Option<Route> {
    Route::from_label(answer).or_else(|| answer.split_whitespace().find_map(Route::from_label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::models::ScriptedChatModel;
    use crate::domain::models::SessionContext;

    fn route_of(message: &str) -> Option<Route> {
        classify_by_rules(message).map(|d| d.route)
    }

    fn conversation(message: &str) -> Conversation {
        Conversation::with_user_message(SessionContext::new("1", "2", "Ana", "t"), message)
    }

    #[test]
    fn test_greetings_are_direct() {
        for message in ["oi", "Bom dia!", "boa tarde, tudo bem?", "Olá", "hello there", "", "  "] {
            assert_eq!(route_of(message), Some(Route::Direct), "{message:?}");
        }
    }

    #[test]
    fn test_rule_routes() {
        let helper = Some(Route::Specialist(SpecialistRole::Helper));
        let analytics = Some(Route::Specialist(SpecialistRole::Analytics));
        let optimizer = Some(Route::Specialist(SpecialistRole::Optimizer));

        assert_eq!(route_of("cadastrar novo cliente"), helper);
        assert_eq!(route_of("oi, preciso alterar meu endereço"), helper);
        assert_eq!(route_of("onde fica a página de planos?"), helper);
        assert_eq!(route_of("gráfico de vendas do mês"), analytics);
        assert_eq!(route_of("quais planos existem?"), analytics);
        assert_eq!(route_of("show me a report of shipments"), analytics);
        assert_eq!(route_of("otimizar plano Navio A"), optimizer);
        assert_eq!(route_of("optimize the loading sequence"), optimizer);
    }

    #[test]
    fn test_intent_outranks_hints() {
        let helper = Some(Route::Specialist(SpecialistRole::Helper));
        let analytics = Some(Route::Specialist(SpecialistRole::Analytics));
        let optimizer = Some(Route::Specialist(SpecialistRole::Optimizer));

        let cases = [
            ("gráfico de vendas do mês incluindo devoluções", analytics),
            ("relatório de acessos do mês", analytics),
            ("otimizar o plano Navio A e mostrar a duração total", optimizer),
            ("preciso de ajuda para otimizar o plano Navio A", optimizer),
            ("mostre o relatório do sequenciamento", analytics),
            ("preciso de ajuda com o menu", helper),
            ("quantos navios existem?", analytics),
            ("help me update my address", helper),
        ];
        for (message, expected) in cases {
            assert_eq!(route_of(message), expected, "{message:?}");
        }
    }

    #[test]
    fn test_greeting_with_small_talk() {
        for message in ["oi, tudo bem com você?", "olá, que tal?", "e aí, bom dia"] {
            assert_eq!(route_of(message), Some(Route::Direct), "{message:?}");
        }
        assert_ne!(route_of("oi, cadastrar cliente"), Some(Route::Direct));
    }

    #[test]
    fn test_helper_rule_has_priority() {
        // A registration request that mentions a report still goes to the helper
        assert_eq!(
            route_of("cadastrar relatório mensal"),
            Some(Route::Specialist(SpecialistRole::Helper))
        );
    }

    #[test]
    fn test_unmatched_message() {
        assert_eq!(route_of("navio atrasado no porto"), None);
    }

    #[tokio::test]
    async fn test_model_classifies_unmatched() {
        let model = ScriptedChatModel::cycling(vec!["optimizer".into()]);
        let router = IntentRouter::with_model_fallback(Arc::new(model.clone()));

        let decision = router.decide(&conversation("navio atrasado no porto")).await;
        assert_eq!(decision.route, Route::Specialist(SpecialistRole::Optimizer));
        assert_eq!(decision.source, RouteSource::Model);

        let requests = model.requests().await;
        assert!(requests[0].system.contains("Ana"));
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_rules_skip_the_model() {
        let model = ScriptedChatModel::new();
        let router = IntentRouter::with_model_fallback(Arc::new(model.clone()));
        let decision = router.decide(&conversation("bom dia")).await;
        assert_eq!(decision.route, Route::Direct);
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_unusable_answer_falls_back_to_helper() {
        let model = ScriptedChatModel::cycling(vec!["não sei".into()]);
        let router = IntentRouter::with_model_fallback(Arc::new(model));
        let decision = router.decide(&conversation("navio atrasado")).await;
        assert_eq!(decision, IntentRouter::fallback());

        let failing = IntentRouter::with_model_fallback(Arc::new(ScriptedChatModel::new()));
        assert_eq!(failing.decide(&conversation("navio atrasado")).await, IntentRouter::fallback());

        assert_eq!(
            IntentRouter::rules_only().decide(&conversation("navio atrasado")).await,
            IntentRouter::fallback()
        );
    }

    #[test]
    fn test_parse_label_scans_words() {
        assert_eq!(
            parse_label("Resposta: data_analytics"),
            Some(Route::Specialist(SpecialistRole::Analytics))
        );
        assert_eq!(parse_label("talvez"), None);
    }
}
