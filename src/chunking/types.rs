use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One row of the incoming line stream.
///
/// `page` is optional: callers that already know the page of every line set it,
/// callers that feed a page-marked text blob leave it empty and let the
/// `[PAGE n]` markers drive the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub page: Option<u32>,
    pub text: String,
}

impl SourceLine {
    pub fn new(page: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }

    pub fn unpaged(text: impl Into<String>) -> Self {
        Self::new(None, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    Clause,
    Section,
    Annex,
}

impl HeadingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingKind::Clause => "clause",
            HeadingKind::Section => "section",
            HeadingKind::Annex => "annex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    pub kind: HeadingKind,
    pub identifier: String,
    pub title: String,
    pub depth: u32,
}

/// A structural unit while it is still being accumulated by the segmenter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChunk {
    pub clause: Option<String>,
    pub title: Option<String>,
    pub depth: u32,
    pub lines: Vec<String>,
    pub pages: BTreeSet<u32>,
}

impl RawChunk {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_headless(&self) -> bool {
        self.clause.is_none()
    }

    pub(crate) fn seeded(heading: &HeadingMatch, line: &str, page: Option<u32>) -> Self {
        let mut chunk = Self {
            clause: Some(heading.identifier.clone()),
            title: Some(heading.title.clone()),
            depth: heading.depth,
            lines: vec![line.to_string()],
            pages: BTreeSet::new(),
        };
        chunk.pages.extend(page);
        chunk
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalChunk {
    pub id: String,
    pub code: String,
    pub clause: Option<String>,
    pub title: Option<String>,
    pub depth: u32,
    pub pages: Vec<u32>,
    pub content: String,
    pub char_count: usize,
    pub word_count: usize,
    #[serde(default)]
    pub part: Option<String>,
}

impl CanonicalChunk {
    pub fn is_headless(&self) -> bool {
        self.clause.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_count: usize,
    pub headless_chunk_count: usize,
    pub clause_chunk_count: usize,
    pub split_part_count: usize,
    pub total_chars: usize,
    pub total_words: usize,
    pub average_words: usize,
}

impl ChunkSummary {
    pub fn from_chunks(chunks: &[CanonicalChunk]) -> Self {
        let chunk_count = chunks.len();
        let headless_chunk_count = chunks.iter().filter(|chunk| chunk.is_headless()).count();
        let total_words = chunks.iter().map(|chunk| chunk.word_count).sum::<usize>();

        Self {
            chunk_count,
            headless_chunk_count,
            clause_chunk_count: chunk_count - headless_chunk_count,
            split_part_count: chunks.iter().filter(|chunk| chunk.part.is_some()).count(),
            total_chars: chunks.iter().map(|chunk| chunk.char_count).sum(),
            total_words,
            average_words: total_words.checked_div(chunk_count).unwrap_or(0),
        }
    }
}
