//! Supervisor routing models.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::agent::TurnStatus;
use super::role::SpecialistRole;

/// Where a user turn is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum Route {
    /// The supervisor answers itself (greeting, first contact)
    Direct,
    /// Dispatch to one specialist
    Specialist(SpecialistRole),
}

impl Route {
    /// Parse a one-word classification label.
    pub fn from_label(label: &str) -> Option<Self> {
        let word = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
            .to_lowercase();
        match word.as_str() {
            "direct" | "direto" | "greeting" => Some(Self::Direct),
            other => other.parse::<SpecialistRole>().ok().map(Self::Specialist),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Specialist(role) => write!(f, "{role}"),
        }
    }
}

/// How a route was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// A keyword rule matched
    Rule,
    /// The supervisor model classified the message
    Model,
    /// No rule matched and the model answer was unusable
    Fallback,
}

/// Route chosen for a turn and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Where the turn goes
    pub route: Route,
    /// Whether a rule, the model or the fallback decided
    pub source: RouteSource,
    /// Keyword or label that produced the decision
    pub matched: Option<String>,
}

impl RouteDecision {
    /// Decision made by a keyword rule.
    pub fn rule(route: Route, matched: impl Into<String>) -> Self {
        Self {
            route,
            source: RouteSource::Rule,
            matched: Some(matched.into()),
        }
    }
}

/// Language of the user's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Portuguese, the default
    #[default]
    Portuguese,
    /// English
    English,
}

const PORTUGUESE_MARKERS: &[&str] = &[
    "o", "os", "as", "de", "do", "da", "dos", "das", "que", "e", "um", "uma", "para", "com",
    "nao", "em", "no", "na", "por", "como", "meu", "minha", "voce", "oi", "ola", "bom", "boa",
    "dia", "tarde", "noite", "obrigado", "obrigada", "quero", "gostaria", "qual", "quais", "novo",
    "nova", "mes", "sim", "pelo", "pela",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "an", "of", "to", "and", "is", "are", "for", "with", "my", "i", "you", "what", "how",
    "please", "can", "could", "show", "me", "hello", "hi", "hey", "good", "morning", "evening",
    "thanks", "new", "want", "which", "this", "month", "yes", "by",
];

impl Language {
    /// Guess the language from stop-word counts; ties go to Portuguese.
    pub fn detect(text: &str) -> Self {
        let folded = fold_text(text);
        let (mut pt, mut en) = (0_usize, 0_usize);
        for word in words(&folded) {
            if PORTUGUESE_MARKERS.contains(&word) {
                pt += 1;
            }
            if ENGLISH_MARKERS.contains(&word) {
                en += 1;
            }
        }
        if en > pt {
            Self::English
        } else {
            Self::Portuguese
        }
    }
}

/// Lowercase `text` and fold Portuguese diacritics to ASCII.
pub fn fold_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Alphanumeric words of already folded text.
pub fn words(folded: &str) -> impl Iterator<Item = &str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Final reply of a supervised turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorReply {
    /// User-visible text; may still contain `{{username}}`
    pub text: String,
    /// How the turn was routed
    pub decision: RouteDecision,
    /// Language the supervisor answered in
    pub language: Language,
    /// Status of the dispatched specialist, if any
    pub specialist_status: Option<TurnStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_label() {
        assert_eq!(Route::from_label("direct"), Some(Route::Direct));
        assert_eq!(
            Route::from_label(" Data_Analytics.\n"),
            Some(Route::Specialist(SpecialistRole::Analytics))
        );
        assert_eq!(
            Route::from_label("optimizer"),
            Some(Route::Specialist(SpecialistRole::Optimizer))
        );
        assert_eq!(Route::from_label("I think helper is best"), None);
    }

    #[test]
    fn test_language_detect() {
        assert_eq!(Language::detect("gráfico de vendas do mês"), Language::Portuguese);
        assert_eq!(Language::detect("show me the sales chart for this month"), Language::English);
        assert_eq!(Language::detect("oi"), Language::Portuguese);
        assert_eq!(Language::detect("hello"), Language::English);
        assert_eq!(Language::detect(""), Language::Portuguese);
    }

    #[test]
    fn test_fold_text() {
        assert_eq!(fold_text("Otimização GRÁFICO"), "otimizacao grafico");
        assert_eq!(words("bom dia, ana!").collect::<Vec<_>>(), vec!["bom", "dia", "ana"]);
    }

    #[test]
    fn test_route_display() {
        assert_eq!(Route::Direct.to_string(), "direct");
        assert_eq!(
            Route::Specialist(SpecialistRole::Analytics).to_string(),
            "data_analytics"
        );
    }
}
