//! Command-line interface.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

use commands::{ask::AskArgs, index::IndexArgs, prompt::PromptArgs};

/// Command line entry point.
#[derive(Parser)]
#[command(name = "stevedore")]
#[command(about = "Stevedore - retrieval-grounded platform assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .stevedore/config.yaml and local.yaml)
    #[arg(short, long, global = true, env = "STEVEDORE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Build, rebuild, inspect, or query the context index
    Index(IndexArgs),

    /// Preview the composed system prompt of a specialist
    Prompt(PromptArgs),

    /// Send one message through the supervisor
    Ask(AskArgs),
}

impl Cli {
    /// Load the configuration selected on the command line.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }
}

/// Print `err` and exit.
///
/// Index errors exit with status 2 so scripts can tell them from other failures.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let fatal_index = err
        .chain()
        .any(|cause| cause.downcast_ref::<DomainError>().is_some_and(DomainError::is_fatal));

    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
        if fatal_index {
            eprintln!("Hint: run `stevedore index rebuild` after checking the documentation directory.");
        }
    }

    std::process::exit(if fatal_index { 2 } else { 1 });
}
