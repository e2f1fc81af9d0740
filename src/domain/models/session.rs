//! Session identity and placeholder substitution.
//!
//! Prompts and replies carry literal `{{token_name}}` placeholders. The session
//! layer resolves them right before text reaches the model or the user.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Placeholder for the acting user's id.
pub const USER_PLACEHOLDER: &str = "{{user}}";
/// Placeholder for the acting organization's id.
pub const COMPANY_PLACEHOLDER: &str = "{{empresa}}";
/// Placeholder for the user's auth token.
pub const TOKEN_PLACEHOLDER: &str = "{{token}}";
/// Placeholder for the user's display name.
pub const USERNAME_PLACEHOLDER: &str = "{{username}}";

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[A-Za-z_][A-Za-z0-9_]*\}\}").expect("valid placeholder regex"));

/// Returns every placeholder occurrence in `text`, in order of appearance.
pub fn placeholders_in(text: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// Identity of the user on whose behalf a turn runs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Value substituted for `{{user}}`
    pub user_id: String,
    /// Value substituted for `{{empresa}}`
    pub company_id: String,
    /// Value substituted for `{{username}}`
    pub username: String,
    /// Auth token forwarded to the optimization engine
    #[serde(skip_serializing)]
    pub token: String,
}

impl SessionContext {
    /// Session for the given user, company, display name and auth token.
    pub fn new(
        user_id: impl Into<String>,
        company_id: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: company_id.into(),
            username: username.into(),
            token: token.into(),
        }
    }

    /// Substitute the known session placeholders in `text`.
    ///
    /// Unknown placeholders are left untouched.
    pub fn resolve(&self, text: &str) -> String {
        text.replace(USER_PLACEHOLDER, &self.user_id)
            .replace(COMPANY_PLACEHOLDER, &self.company_id)
            .replace(TOKEN_PLACEHOLDER, &self.token)
            .replace(USERNAME_PLACEHOLDER, &self.username)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("company_id", &self.company_id)
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_order() {
        let text = "Como user_id, use {{user}}, como empresa_id, use {{empresa}}. {{user}}";
        assert_eq!(placeholders_in(text), vec!["{{user}}", "{{empresa}}", "{{user}}"]);
        assert!(placeholders_in("nothing here { {x} }").is_empty());
    }

    #[test]
    fn test_resolve_known_placeholders() {
        let session = SessionContext::new("42", "7", "Ana", "tok-123");
        let resolved = session.resolve("{{username}}: {{user}}/{{empresa}} {{token}} {{other}}");
        assert_eq!(resolved, "Ana: 42/7 tok-123 {{other}}");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionContext::new("1", "2", "Ana", "super-secret");
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
