//! Common test utilities for integration tests
//!
//! Provides a temporary documentation directory, a test configuration that
//! uses the hashing embedder and the scripted model, and a runtime wired to
//! an in-memory platform.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use stevedore::adapters::embeddings::HashingEmbeddingProvider;
use stevedore::adapters::models::ScriptedChatModel;
use stevedore::adapters::platform::InMemoryPlatform;
use stevedore::adapters::tools::ToolBackends;
use stevedore::application::AssistantRuntime;
use stevedore::domain::models::{Config, SessionContext, SourceId};

pub const DIMENSION: usize = 256;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn source_text(source: SourceId) -> &'static str {
    match source {
        SourceId::Glossary => {
            "Cliente: empresa contratante do frete. Campos: nome, cnpj, email.\n\
             Navio: embarcação graneleira. Campos: nome, capacidade, calado.\n\
             Plano: sequência de carregamento de um navio em um porto."
        }
        SourceId::Methodology => {
            "Gráficos de barras comparam valores entre meses.\n\
             Gráficos de linha mostram a evolução de vendas ao longo do tempo.\n\
             Gráficos de pizza mostram a participação de cada produto."
        }
        SourceId::Manual => {
            "Para cadastrar um cliente, acesse o menu Clientes e clique em Novo.\n\
             Para otimizar um plano, abra o plano e clique em Otimizar sequenciamento."
        }
        SourceId::Documentation => {
            "A otimização calcula a duração total do plano em horas e o número de sequências.\n\
             O sequenciamento respeita o calado do navio e a capacidade dos porões."
        }
        SourceId::LinkMap => {
            "Clientes: /clientes\nPlanos: /planos\nNavios: /navios\nRelatórios: /relatorios"
        }
    }
}

/// Write every documentation source into `dir`.
pub fn write_docs(dir: &Path) {
    std::fs::create_dir_all(dir).expect("Failed to create docs dir");
    for source in SourceId::ALL {
        std::fs::write(dir.join(source.file_name()), source_text(source))
            .expect("Failed to write doc");
    }
}

/// Configuration rooted in `root`, with documentation already written.
pub fn test_config(root: &Path) -> Config {
    write_docs(&root.join("docs"));

    let mut config = Config::default();
    config.docs_dir = root.join("docs").display().to_string();
    config.index.dir = root.join("index").display().to_string();
    config.index.chunk_size = 200;
    config.index.chunk_overlap = 20;
    config.index.lock_wait_secs = 5;
    config.embedding.provider = "hashing".to_string();
    config.embedding.dimension = DIMENSION;
    config.model.provider = "scripted".to_string();
    config.retrieval.helper_k = 3;
    config.retrieval.analytics_k = 3;
    config.retrieval.optimizer_k = 3;
    config.retrieval.model_fallback = false;
    config.agents.turn_timeout_secs = 10;
    config
}

/// Runtime over `config` using `model` and `platform`.
pub async fn runtime(
    config: &Config,
    model: ScriptedChatModel,
    platform: &InMemoryPlatform,
) -> AssistantRuntime {
    let backends = ToolBackends::single(
        Arc::new(platform.clone()),
        config.tools.allowed_entities.clone(),
    );
    AssistantRuntime::assemble(
        config,
        Arc::new(HashingEmbeddingProvider::new(config.embedding.dimension)),
        Arc::new(model),
        backends,
    )
    .await
    .expect("Failed to assemble runtime")
}

pub fn session() -> SessionContext {
    SessionContext::new("42", "7", "Ana", "tok-123")
}
