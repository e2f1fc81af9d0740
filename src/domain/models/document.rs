//! Documentation corpus models
//!
//! The assistant is grounded in five fixed documentation sources. Each source is
//! loaded whole, split into chunks, and embedded once when the context index is built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one of the fixed documentation sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Domain glossary and data model of the platform
    Glossary,
    /// Chart and reporting methodology notes
    Methodology,
    /// End-user manual
    Manual,
    /// System documentation
    Documentation,
    /// Map of application pages and their links
    LinkMap,
}

impl SourceId {
    /// All sources, in the order they are indexed.
    pub const ALL: [Self; 5] = [
        Self::Glossary,
        Self::Methodology,
        Self::Manual,
        Self::Documentation,
        Self::LinkMap,
    ];

    /// File name of the source inside the documentation directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Glossary => "banco.txt",
            Self::Methodology => "graficos.txt",
            Self::Manual => "manual_do_usuario.txt",
            Self::Documentation => "documentacao.txt",
            Self::LinkMap => "links.txt",
        }
    }

    /// File stem used in ids and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glossary => "glossary",
            Self::Methodology => "methodology",
            Self::Manual => "manual",
            Self::Documentation => "documentation",
            Self::LinkMap => "link_map",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text of one documentation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Which source file this is
    pub source: SourceId,
    /// Full UTF-8 contents
    pub text: String,
}

impl SourceDocument {
    /// Whole-file document for `source`.
    pub fn new(source: SourceId, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }
}

/// A chunk of source text stored with its embedding.
///
/// Immutable once the index is built; only a full rebuild replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier: `<source>:chunk:<index>`
    pub id: String,

    /// Source the chunk was cut from
    pub source: SourceId,

    /// Position of this chunk within its source (0-based)
    pub chunk_index: usize,

    /// Chunk text as retrieved
    pub text: String,

    /// Number of tokens in `text`
    pub token_count: usize,

    /// Embedding of `text` under the index's provider
    pub embedding: Vec<f32>,
}

impl DocumentChunk {
    /// Chunk with its id derived from source and position.
    pub fn new(
        source: SourceId,
        chunk_index: usize,
        text: String,
        token_count: usize,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: format!("{source}:chunk:{chunk_index}"),
            source,
            chunk_index,
            text,
            token_count,
            embedding,
        }
    }
}

/// A chunk of text before it has been embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Source the piece was cut from
    pub source: SourceId,
    /// Position within the source, from zero
    pub chunk_index: usize,
    /// Chunk text
    pub text: String,
    /// Size in tokenizer tokens
    pub token_count: usize,
}

/// A retrieval hit: a chunk and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// Chunk id (`source:chunk:n`)
    pub id: String,
    /// Source the chunk was cut from
    pub source: SourceId,
    /// Chunk text
    pub text: String,
    /// Cosine similarity in `[-1, 1]`; higher is more similar
    pub score: f32,
}
