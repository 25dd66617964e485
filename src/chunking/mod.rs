//! Clause-aware segmentation of page-indexed standard text into retrieval chunks.
//!
//! Data flows one way: line stream -> [`segmenter`] (driven by [`matcher`]) ->
//! raw chunks -> [`normalizer`] -> canonical chunks -> [`splitter`].

mod error;
mod matcher;
mod normalizer;
mod segmenter;
mod splitter;
mod stream;
mod types;

use tracing::info;

pub use error::{ChunkingError, ChunkingResult};
pub use matcher::ClauseMatcher;
pub use normalizer::{chunk_id, normalize};
pub use segmenter::{FlushPolicy, segment};
pub use splitter::{DEFAULT_MAX_WORDS, split};
pub use stream::{lines_from_marked_text, lines_from_pages, render_marked_text};
pub use types::{CanonicalChunk, ChunkSummary, SourceLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Document identifier, e.g. `IS 456:2000`.
    pub code: String,
    pub max_words: usize,
    pub flush_policy: FlushPolicy,
}

impl ChunkingConfig {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            max_words: DEFAULT_MAX_WORDS,
            flush_policy: FlushPolicy::default(),
        }
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    pub fn with_flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.flush_policy = flush_policy;
        self
    }

    pub fn validate(&self) -> ChunkingResult<()> {
        if self.max_words == 0 {
            return Err(ChunkingError::InvalidConfiguration(
                "max_words must be a positive integer".to_string(),
            ));
        }
        if self.code.trim().is_empty() {
            return Err(ChunkingError::InvalidConfiguration(
                "document code must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the full pipeline over one document's line stream.
pub fn chunk_document<'a, I>(lines: I, config: &ChunkingConfig) -> ChunkingResult<Vec<CanonicalChunk>>
where
    I: IntoIterator<Item = &'a SourceLine>,
{
    config.validate()?;

    let matcher = ClauseMatcher::new()?;
    let raw_chunks = segment(lines, &matcher, config.flush_policy);
    let canonical = raw_chunks
        .iter()
        .map(|raw| normalize(raw, &config.code))
        .collect::<Vec<CanonicalChunk>>();
    let chunks = split(canonical, config.max_words)?;

    let summary = ChunkSummary::from_chunks(&chunks);
    info!(
        code = %config.code,
        raw_chunks = raw_chunks.len(),
        chunks = summary.chunk_count,
        headless = summary.headless_chunk_count,
        split_parts = summary.split_part_count,
        average_words = summary.average_words,
        "chunked document"
    );

    Ok(chunks)
}
