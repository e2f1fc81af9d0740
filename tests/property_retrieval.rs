//! Property tests for retrieval ordering and the `k` bound.

use proptest::prelude::*;
use std::sync::Arc;

use stevedore::adapters::embeddings::HashingEmbeddingProvider;
use stevedore::domain::models::{DocumentChunk, SourceId};
use stevedore::infrastructure::vector::{ContextIndex, IndexManifest, INDEX_FORMAT_VERSION};
use stevedore::services::ContextRetriever;

const DIMENSION: usize = 64;

fn retriever(texts: &[String]) -> ContextRetriever {
    let embedder = HashingEmbeddingProvider::new(DIMENSION);
    let chunks: Vec<DocumentChunk> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            DocumentChunk::new(SourceId::Manual, i, text.clone(), 1, embedder.embed_text(text))
        })
        .collect();
    let manifest = IndexManifest {
        format_version: INDEX_FORMAT_VERSION,
        embedding_provider: "hashing".into(),
        embedding_model: "token-hash-v1".into(),
        dimension: DIMENSION,
        chunk_size: 400,
        chunk_overlap: 40,
        chunk_count: chunks.len(),
        built_at: chrono::Utc::now(),
        content_fingerprint: String::new(),
    };
    ContextRetriever::new(
        Arc::new(ContextIndex::new(manifest, chunks).expect("valid index")),
        Arc::new(embedder),
    )
}

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "navio", "porto", "plano", "cliente", "gráfico", "vendas", "carga", "porão", "frete",
        "relatório", "sequência", "calado",
    ])
    .prop_map(ToString::to_string)
}

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..8).prop_map(|words| words.join(" "))
}

proptest! {
    /// Property: at most `k` results, in non-increasing score order
    #[test]
    fn prop_results_bounded_and_ordered(
        texts in prop::collection::vec(sentence(), 0..20),
        query in sentence(),
        k in 1usize..10,
    ) {
        let hits = tokio_test::block_on(retriever(&texts).search(&query, k)).unwrap();

        prop_assert!(hits.len() <= k);
        prop_assert!(hits.len() <= texts.len());
        prop_assert_eq!(hits.len(), k.min(texts.len()));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    /// Property: an exact copy of the query is ranked first
    #[test]
    fn prop_exact_match_ranks_first(
        mut texts in prop::collection::vec(sentence(), 0..15),
        query in word(),
    ) {
        texts.push(query.clone());
        let hits = tokio_test::block_on(retriever(&texts).search(&query, 1)).unwrap();

        prop_assert_eq!(hits.len(), 1);
        let top = &hits[0];
        // Ties with identical bags of words are allowed
        prop_assert!((top.score - 1.0).abs() < 1e-4, "top score {}", top.score);
    }

    /// Property: the empty query returns the leading chunks in index order
    #[test]
    fn prop_empty_query_is_index_order(
        texts in prop::collection::vec(sentence(), 1..15),
        k in 1usize..10,
    ) {
        let hits = tokio_test::block_on(retriever(&texts).search("", k)).unwrap();

        let expected: Vec<&String> = texts.iter().take(k).collect();
        let actual: Vec<&String> = hits.iter().map(|h| &h.text).collect();
        prop_assert_eq!(actual, expected);
    }
}
