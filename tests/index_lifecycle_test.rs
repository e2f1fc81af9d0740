//! Context index lifecycle against a real documentation directory.

mod common;

use std::sync::Arc;

use stevedore::adapters::embeddings::HashingEmbeddingProvider;
use stevedore::application::{index_service_from_config, load_retriever};
use stevedore::domain::errors::DomainError;
use stevedore::domain::models::SourceId;
use stevedore::domain::ports::EmbeddingProvider;
use stevedore::services::IndexService;

fn service(config: &stevedore::Config, dimension: usize) -> IndexService {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::new(dimension));
    index_service_from_config(config, embedder).expect("index service")
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());
    let svc = service(&config, common::DIMENSION);

    let first = svc.rebuild().await.unwrap();
    let second = svc.rebuild().await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(
        first.manifest().content_fingerprint,
        second.manifest().content_fingerprint
    );
    for (a, b) in first.chunks().iter().zip(second.chunks()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.text, b.text);
        assert_eq!(a.embedding, b.embedding);
    }

    // Every source contributed at least one chunk
    for source in SourceId::ALL {
        assert!(first.chunks().iter().any(|c| c.source == source), "{source}");
    }
}

#[tokio::test]
async fn test_existing_index_is_loaded_not_rebuilt() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());
    let svc = service(&config, common::DIMENSION);

    let built = svc.load_or_build().await.unwrap();

    // Documentation edits do not trigger a silent rebuild
    std::fs::write(
        dir.path().join("docs").join(SourceId::LinkMap.file_name()),
        "Portos: /portos",
    )
    .unwrap();
    let loaded = svc.load_or_build().await.unwrap();
    assert_eq!(loaded.manifest().built_at, built.manifest().built_at);
    assert_eq!(svc.status().await.unwrap().stale, Some(true));

    let rebuilt = svc.rebuild().await.unwrap();
    assert!(rebuilt.chunks().iter().any(|c| c.text.contains("/portos")));
    assert_eq!(svc.status().await.unwrap().stale, Some(false));
}

#[tokio::test]
async fn test_embedding_mismatch_is_refused() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());
    service(&config, common::DIMENSION).load_or_build().await.unwrap();

    let err = service(&config, 64).load_or_build().await.unwrap_err();
    assert!(matches!(err, DomainError::IndexVersionMismatch { .. }), "{err}");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_format_version_mismatch_is_refused() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());
    let svc = service(&config, common::DIMENSION);
    svc.load_or_build().await.unwrap();

    let manifest_path = dir.path().join("index").join("manifest.json");
    let mut manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    manifest["format_version"] = serde_json::json!(999);
    std::fs::write(&manifest_path, manifest.to_string()).unwrap();

    let err = svc.load().await.unwrap_err();
    assert!(matches!(err, DomainError::IndexVersionMismatch { .. }), "{err}");
}

#[tokio::test]
async fn test_corrupt_index_is_unavailable() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());
    let svc = service(&config, common::DIMENSION);
    svc.load_or_build().await.unwrap();

    std::fs::write(dir.path().join("index").join("chunks.json"), "{not json").unwrap();
    let err = svc.load_or_build().await.unwrap_err();
    assert!(matches!(err, DomainError::IndexUnavailable(_)), "{err}");

    // An explicit rebuild recovers
    svc.rebuild().await.unwrap();
    svc.load().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_first_boot_builds_once() {
    let dir = common::temp_dir();
    let config = common::test_config(dir.path());

    let a = service(&config, common::DIMENSION);
    let b = service(&config, common::DIMENSION);
    let (first, second) = tokio::join!(a.load_or_build(), b.load_or_build());
    let (first, second) = (first.unwrap(), second.unwrap());

    // The loser of the lock loads what the winner saved
    assert_eq!(first.manifest().built_at, second.manifest().built_at);
    assert!(!dir.path().join("index").join(".build.lock").exists());
}

#[tokio::test]
async fn test_missing_documentation_aborts_startup() {
    let dir = common::temp_dir();
    let mut config = common::test_config(dir.path());
    config.docs_dir = dir.path().join("nowhere").display().to_string();

    let err = load_retriever(&config).await.err().expect("startup must fail");
    let domain = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<DomainError>())
        .expect("domain error in chain");
    assert!(matches!(domain, DomainError::IndexUnavailable(_)));
}
