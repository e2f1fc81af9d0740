//! Single-turn supervised ask command.

use anyhow::Result;
use clap::Args;

use crate::application::AssistantRuntime;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Language, RouteSource, SessionContext, TurnStatus};

/// Ask the assistant a single question.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Message to send
    pub message: String,

    /// User id injected into record scopes
    #[arg(long, default_value = "0")]
    pub user: String,

    /// Company id injected into record scopes
    #[arg(long, default_value = "0")]
    pub company: String,

    /// Name the reply addresses
    #[arg(long, default_value = "usuário")]
    pub username: String,

    /// Auth token forwarded to the optimization engine
    #[arg(long, env = "STEVEDORE_USER_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,
}

/// Result of `ask`.
#[derive(Debug, serde::Serialize)]
pub struct AskOutput {
    /// Specialist or `direct`.
    pub route: String,
    /// Whether rules or the model chose the route.
    pub route_source: RouteSource,
    /// Detected reply language.
    pub language: Language,
    /// Specialist turn status, if one ran.
    pub specialist_status: Option<TurnStatus>,
    /// Reply with placeholders resolved.
    pub reply: String,
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        self.reply.clone()
    }
}

/// Run `ask`.
pub async fn execute(args: AskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let runtime = AssistantRuntime::from_config(config).await?;
    let session = SessionContext::new(args.user, args.company, args.username, args.token);

    let (reply, text) = runtime.ask(session, &args.message).await;
    output(
        &AskOutput {
            route: reply.decision.route.to_string(),
            route_source: reply.decision.source,
            language: reply.language,
            specialist_status: reply.specialist_status,
            reply: text,
        },
        json_mode,
    );
    Ok(())
}
