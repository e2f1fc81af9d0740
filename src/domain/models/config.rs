use serde::{Deserialize, Serialize};

use super::chunking::ChunkingConfig;
use super::role::SpecialistRole;

/// Main configuration structure for Stevedore
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding the documentation sources
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Persisted context index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Retrieval depth per role
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Specialist turn limits
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Tool layer backends
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            model: ModelConfig::default(),
            retrieval: RetrievalConfig::default(),
            agents: AgentsConfig::default(),
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Persisted context index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexConfig {
    /// Directory where the index is persisted
    #[serde(default = "default_index_dir")]
    pub dir: String,

    /// Chunk size in tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in tokens
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// How long to wait for another process holding the build lock
    #[serde(default = "default_lock_wait_secs")]
    pub lock_wait_secs: u64,
}

fn default_index_dir() -> String {
    ".stevedore/index".to_string()
}

const fn default_chunk_size() -> usize {
    400
}

const fn default_chunk_overlap() -> usize {
    40
}

const fn default_lock_wait_secs() -> u64 {
    30
}

impl IndexConfig {
    /// Chunking parameters of the `index` section.
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            respect_boundaries: true,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            lock_wait_secs: default_lock_wait_secs(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Provider: hashing or openai
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model identifier recorded in the index manifest
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// API key (can also be set via `OPENAI_API_KEY` env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_embedding_provider() -> String {
    "hashing".to_string()
}

fn default_embedding_model() -> String {
    "token-hash-v1".to_string()
}

const fn default_embedding_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelConfig {
    /// Provider: anthropic or scripted
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// Model to use
    #[serde(default = "default_model_id")]
    pub model: String,

    /// API key (can also be set via `ANTHROPIC_API_KEY` env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Upper bound on tokens per model reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Replies cycled by the scripted provider
    #[serde(default)]
    pub scripted_replies: Vec<String>,
}

fn default_model_provider() -> String {
    "anthropic".to_string()
}

fn default_model_id() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_temperature() -> f32 {
    1.0
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            model: default_model_id(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            scripted_replies: Vec::new(),
        }
    }
}

/// Number of chunks retrieved per role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Chunks retrieved for the helper prompt
    #[serde(default = "default_k")]
    pub helper_k: usize,

    /// Chunks retrieved for the analytics prompt
    #[serde(default = "default_k")]
    pub analytics_k: usize,

    /// Chunks retrieved for the optimizer prompt
    #[serde(default = "default_k")]
    pub optimizer_k: usize,

    /// Ask the supervisor model when no routing rule matches
    #[serde(default = "default_true")]
    pub model_fallback: bool,
}

const fn default_k() -> usize {
    8
}

const fn default_true() -> bool {
    true
}

impl RetrievalConfig {
    /// Retrieval depth for `role`.
    pub const fn k_for(&self, role: SpecialistRole) -> usize {
        match role {
            SpecialistRole::Helper => self.helper_k,
            SpecialistRole::Analytics => self.analytics_k,
            SpecialistRole::Optimizer => self.optimizer_k,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            helper_k: default_k(),
            analytics_k: default_k(),
            optimizer_k: default_k(),
            model_fallback: true,
        }
    }
}

/// Specialist turn limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentsConfig {
    /// Maximum model calls per specialist turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Deadline for one specialist turn
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,

    /// Recompose the system prompt from the user's message on every turn
    #[serde(default = "default_true")]
    pub per_turn_retrieval: bool,
}

const fn default_max_iterations() -> u32 {
    6
}

const fn default_turn_timeout_secs() -> u64 {
    120
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            turn_timeout_secs: default_turn_timeout_secs(),
            per_turn_retrieval: true,
        }
    }
}

/// Tool layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolsConfig {
    /// Platform API base URL; the in-memory store is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_base_url: Option<String>,

    /// Entities the record tool may touch
    #[serde(default = "default_allowed_entities")]
    pub allowed_entities: Vec<String>,

    /// Timeout for a single platform request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_allowed_entities() -> Vec<String> {
    ["cliente", "navio", "plano", "frete", "porto", "produto", "venda"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            platform_base_url: None,
            allowed_entities: default_allowed_entities(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly, or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
