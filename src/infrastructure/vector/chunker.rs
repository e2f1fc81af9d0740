//! Text chunking implementation
//!
//! Token-aware chunking using tiktoken. Text is split into sentence (or word)
//! segments first and segments are packed into chunks, so chunk edges always
//! fall on segment edges and no multi-byte character is ever cut.

use tiktoken_rs::CoreBPE;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChunkingConfig, SourceDocument, TextChunk};

/// Token-aware text chunker
pub struct Chunker {
    config: ChunkingConfig,
    tokenizer: CoreBPE,
}

impl Chunker {
    /// Create a new chunker with default configuration
    pub fn new() -> DomainResult<Self> {
        Self::with_config(ChunkingConfig::default())
    }

    /// Create a new chunker with custom configuration
    pub fn with_config(config: ChunkingConfig) -> DomainResult<Self> {
        config
            .validate()
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid chunking config: {e}")))?;

        // cl100k_base is used by GPT-4 and most embedding models
        let tokenizer = tiktoken_rs::cl100k_base()
            .map_err(|e| DomainError::ValidationFailed(format!("Failed to load tokenizer: {e}")))?;

        Ok(Self { config, tokenizer })
    }

    /// Active chunking settings.
    pub const fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Count tokens in text
    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.encode_with_special_tokens(text).len()
    }

    /// Split a document into ordered chunks.
    pub fn chunk(&self, document: &SourceDocument) -> Vec<TextChunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let segments = self.segments(&document.text);
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut window_tokens = 0;

        for (segment, tokens) in segments {
            if window_tokens + tokens > self.config.chunk_size && !window.is_empty() {
                self.emit(document, &window, &mut chunks);

                // Carry the trailing segments that fit in the overlap
                let mut carried = 0;
                let mut keep_from = window.len();
                while keep_from > 0 {
                    let candidate = window[keep_from - 1].1;
                    if carried + candidate > self.config.chunk_overlap
                        || carried + candidate + tokens > self.config.chunk_size
                    {
                        break;
                    }
                    carried += candidate;
                    keep_from -= 1;
                }
                window.drain(..keep_from);
                window_tokens = carried;
            }
            window.push((segment, tokens));
            window_tokens += tokens;
        }

        if !window.is_empty() {
            self.emit(document, &window, &mut chunks);
        }

        chunks
    }

    fn emit(&self, document: &SourceDocument, window: &[(&str, usize)], out: &mut Vec<TextChunk>) {
        let text: String = window.iter().map(|(s, _)| *s).collect();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        out.push(TextChunk {
            source: document.source,
            chunk_index: out.len(),
            text: text.to_string(),
            token_count: self.count_tokens(text),
        });
    }

    /// Segments with their token counts; oversized sentences fall back to words.
    fn segments<'a>(&self, text: &'a str) -> Vec<(&'a str, usize)> {
        let primary = if self.config.respect_boundaries {
            split_after(text, |c| matches!(c, '.' | '!' | '?' | '\n'))
        } else {
            split_after(text, char::is_whitespace)
        };

        let mut segments = Vec::with_capacity(primary.len());
        for segment in primary {
            let tokens = self.count_tokens(segment);
            if tokens > self.config.chunk_size && self.config.respect_boundaries {
                for word in split_after(segment, char::is_whitespace) {
                    segments.push((word, self.count_tokens(word)));
                }
            } else {
                segments.push((segment, tokens));
            }
        }
        segments
    }
}

/// Split `text` right after every char matching `is_boundary`.
fn split_after(text: &str, is_boundary: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if is_boundary(c) {
            let end = i + c.len_utf8();
            parts.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SourceId;

    fn doc(text: &str) -> SourceDocument {
        SourceDocument::new(SourceId::Manual, text)
    }

    #[test]
    fn test_new_chunker() {
        assert!(Chunker::new().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 150,
            respect_boundaries: true,
        };
        assert!(Chunker::with_config(config).is_err());
    }

    #[test]
    fn test_chunk_empty_text() {
        let chunker = Chunker::new().unwrap();
        assert!(chunker.chunk(&doc("   \n")).is_empty());
    }

    #[test]
    fn test_chunk_short_text() {
        let chunker = Chunker::new().unwrap();
        let chunks = chunker.chunk(&doc("Para cadastrar um navio, acesse Cadastros."));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].source, SourceId::Manual);
        assert!(chunks[0].token_count > 0);
    }

    #[test]
    fn test_chunk_long_text_respects_size() {
        let chunker = Chunker::with_config(ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 10,
            respect_boundaries: true,
        })
        .unwrap();

        let text = "O plano de carregamento define a sequência dos porões. ".repeat(20);
        let chunks = chunker.chunk(&doc(&text));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert!(chunk.text.ends_with('.'), "chunk should end on a sentence");
        }
    }

    #[test]
    fn test_chunk_with_overlap_repeats_tail() {
        let chunker = Chunker::with_config(ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 5,
            respect_boundaries: false,
        })
        .unwrap();

        let text: String = (0..40).map(|i| format!("w{i} ")).collect();
        let chunks = chunker.chunk(&doc(&text));

        assert!(chunks.len() > 1);
        let first_tail = chunks[0].text.split_whitespace().last().unwrap();
        assert!(chunks[1].text.split_whitespace().any(|w| w == first_tail));
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let chunker = Chunker::with_config(ChunkingConfig {
            chunk_size: 8,
            chunk_overlap: 0,
            respect_boundaries: true,
        })
        .unwrap();

        let text = "Operação de descarregamento concluída. Atenção à programação.";
        let joined: String = chunker
            .chunk(&doc(text))
            .iter()
            .map(|c| c.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        for word in text.split_whitespace() {
            assert!(joined.contains(word), "missing {word}");
        }
    }

    #[test]
    fn test_split_after() {
        assert_eq!(
            split_after("Um. Dois! Três", |c| matches!(c, '.' | '!')),
            vec!["Um.", " Dois!", " Três"]
        );
    }
}
