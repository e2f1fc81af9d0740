//! Prompt preview command.

use anyhow::{anyhow, Result};
use clap::Args;

use crate::application::load_retriever;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::session::placeholders_in;
use crate::domain::models::{Config, SpecialistRole};
use crate::services::PromptComposer;

/// Render a specialist prompt without calling the model.
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Specialist role (helper, analytics, optimizer)
    pub role: String,

    /// Retrieval query; empty uses the leading chunks
    #[arg(short, long, default_value = "")]
    pub query: String,
}

/// Result of `prompt`.
#[derive(Debug, serde::Serialize)]
pub struct PromptOutput {
    /// Specialist role.
    pub role: SpecialistRole,
    /// Agent name.
    pub agent: &'static str,
    /// Query used for retrieval.
    pub query: String,
    /// Placeholders left for the caller.
    pub placeholders: Vec<String>,
    /// Rendered prompt.
    pub prompt: String,
}

impl CommandOutput for PromptOutput {
    fn to_human(&self) -> String {
        format!(
            "# {} (query: {:?})\n# placeholders: {}\n\n{}",
            self.agent,
            self.query,
            self.placeholders.join(", "),
            self.prompt
        )
    }
}

/// Run `prompt`.
pub async fn execute(args: PromptArgs, config: &Config, json_mode: bool) -> Result<()> {
    let role: SpecialistRole = args.role.parse().map_err(|e: String| anyhow!(e))?;
    let retriever = load_retriever(config).await?;
    let composer = PromptComposer::new(retriever, config.retrieval.clone());

    let prompt = composer.compose(role, &args.query).await;
    let mut placeholders: Vec<String> = placeholders_in(&prompt)
        .into_iter()
        .map(ToString::to_string)
        .collect();
    placeholders.sort();
    placeholders.dedup();

    output(
        &PromptOutput {
            role,
            agent: role.agent_name(),
            query: args.query,
            placeholders,
            prompt,
        },
        json_mode,
    );
    Ok(())
}
