use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".stevedore";

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "STEVEDORE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `logging.level` is not a tracing level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// `logging.format` is neither `json` nor `pretty`.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// `logging.rotation` is not `daily`, `hourly` or `never`.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// `docs_dir` is empty.
    #[error("Documentation directory cannot be empty")]
    EmptyDocsDir,

    /// `index.dir` is empty.
    #[error("Index directory cannot be empty")]
    EmptyIndexDir,

    /// Chunk size and overlap do not fit together.
    #[error("Invalid chunking: {0}")]
    InvalidChunking(String),

    /// Unknown `embedding.provider`.
    #[error("Unknown embedding provider: {0}. Must be one of: hashing, openai")]
    UnknownEmbeddingProvider(String),

    /// Zero embedding dimension.
    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    /// Unknown `model.provider`.
    #[error("Unknown model provider: {0}. Must be one of: anthropic, scripted")]
    UnknownModelProvider(String),

    /// A retrieval depth of zero.
    #[error("Invalid retrieval depth for {0}: must be at least 1")]
    InvalidRetrievalDepth(&'static str),

    /// Zero iteration cap.
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    /// Zero turn timeout.
    #[error("Invalid turn_timeout_secs: {0}. Must be at least 1")]
    InvalidTurnTimeout(u64),

    /// Wrapped extraction error from figment.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .stevedore/config.yaml (project config)
    /// 3. .stevedore/local.yaml (project local overrides, optional)
    /// 4. Environment variables (`STEVEDORE_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(Path::new(CONFIG_DIR), ENV_PREFIX)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The layered figment for a config directory and env prefix.
    pub fn figment(config_dir: &Path, env_prefix: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(env_prefix).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.docs_dir.trim().is_empty() {
            return Err(ConfigError::EmptyDocsDir);
        }

        if config.index.dir.trim().is_empty() {
            return Err(ConfigError::EmptyIndexDir);
        }

        config
            .index
            .chunking()
            .validate()
            .map_err(ConfigError::InvalidChunking)?;

        if !["hashing", "openai"].contains(&config.embedding.provider.as_str()) {
            return Err(ConfigError::UnknownEmbeddingProvider(
                config.embedding.provider.clone(),
            ));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(config.embedding.dimension));
        }

        if !["anthropic", "scripted"].contains(&config.model.provider.as_str()) {
            return Err(ConfigError::UnknownModelProvider(config.model.provider.clone()));
        }

        if !(0.0..=1.0).contains(&config.model.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "temperature {} must be between 0.0 and 1.0",
                config.model.temperature
            )));
        }

        // Retrieval depth
        for (name, k) in [
            ("helper", config.retrieval.helper_k),
            ("analytics", config.retrieval.analytics_k),
            ("optimizer", config.retrieval.optimizer_k),
        ] {
            if k == 0 {
                return Err(ConfigError::InvalidRetrievalDepth(name));
            }
        }

        if config.agents.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(config.agents.max_iterations));
        }

        if config.agents.turn_timeout_secs == 0 {
            return Err(ConfigError::InvalidTurnTimeout(config.agents.turn_timeout_secs));
        }

        if config.tools.allowed_entities.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "tools.allowed_entities cannot be empty".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
