use tracing::debug;

use super::error::{ChunkingError, ChunkingResult};
use super::types::CanonicalChunk;

pub const DEFAULT_MAX_WORDS: usize = 500;

/// Splits every chunk above `max_words` into consecutive word windows.
///
/// Parts inherit the parent's metadata including its full page set; only the
/// content, counts, id suffix and part label differ.
pub fn split(chunks: Vec<CanonicalChunk>, max_words: usize) -> ChunkingResult<Vec<CanonicalChunk>> {
    if max_words == 0 {
        return Err(ChunkingError::InvalidConfiguration(
            "max_words must be a positive integer".to_string(),
        ));
    }

    let mut expanded = Vec::<CanonicalChunk>::with_capacity(chunks.len());

    for chunk in chunks {
        if chunk.word_count <= max_words {
            expanded.push(chunk);
            continue;
        }

        let segments = split_words(&chunk.content, max_words);
        let part_count = segments.len();
        debug!(
            id = %chunk.id,
            words = chunk.word_count,
            parts = part_count,
            "splitting oversized chunk"
        );

        for (index, segment) in segments.into_iter().enumerate() {
            let ordinal = index + 1;
            expanded.push(CanonicalChunk {
                id: format!("{}_part{}", chunk.id, ordinal),
                code: chunk.code.clone(),
                clause: chunk.clause.clone(),
                title: chunk.title.clone(),
                depth: chunk.depth,
                pages: chunk.pages.clone(),
                char_count: segment.chars().count(),
                word_count: segment.split_whitespace().count(),
                content: segment,
                part: Some(format!("{ordinal}/{part_count}")),
            });
        }
    }

    Ok(expanded)
}

fn split_words(text: &str, max_words: usize) -> Vec<String> {
    text.split_whitespace()
        .collect::<Vec<&str>>()
        .chunks(max_words)
        .map(|window| window.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with_words(count: usize) -> CanonicalChunk {
        let content = (1..=count)
            .map(|index| format!("w{index}"))
            .collect::<Vec<String>>()
            .join(" ");

        CanonicalChunk {
            id: "IS_456_26.4".to_string(),
            code: "IS 456".to_string(),
            clause: Some("26.4".to_string()),
            title: Some("Nominal Cover".to_string()),
            depth: 2,
            pages: vec![46, 47, 49],
            char_count: content.chars().count(),
            word_count: count,
            content,
            part: None,
        }
    }

    #[test]
    fn oversized_chunk_splits_into_labelled_parts() {
        let parts = split(vec![chunk_with_words(1200)], 500).expect("split succeeds");

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts.iter().map(|part| part.part.as_deref()).collect::<Vec<_>>(),
            vec![Some("1/3"), Some("2/3"), Some("3/3")]
        );
        assert_eq!(
            parts.iter().map(|part| part.word_count).collect::<Vec<usize>>(),
            vec![500, 500, 200]
        );
        assert_eq!(parts[0].id, "IS_456_26.4_part1");
        assert_eq!(parts[2].id, "IS_456_26.4_part3");
        assert!(parts.iter().all(|part| part.pages == vec![46, 47, 49]));
        assert!(parts.iter().all(|part| part.clause.as_deref() == Some("26.4")));
        assert!(
            parts
                .iter()
                .all(|part| part.char_count == part.content.chars().count())
        );
    }

    #[test]
    fn split_conserves_token_sequence() {
        let original = chunk_with_words(1003);
        let expected = original
            .content
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect::<Vec<String>>();

        let parts = split(vec![original], 250).expect("split succeeds");
        let rejoined = parts
            .iter()
            .map(|part| part.content.as_str())
            .collect::<Vec<&str>>()
            .join(" ");

        assert_eq!(parts.len(), 5);
        assert_eq!(
            rejoined
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect::<Vec<String>>(),
            expected
        );
    }

    #[test]
    fn chunks_at_the_limit_pass_through_unchanged() {
        let chunk = chunk_with_words(500);
        let parts = split(vec![chunk.clone()], 500).expect("split succeeds");
        assert_eq!(parts, vec![chunk]);
    }

    #[test]
    fn zero_max_words_is_rejected() {
        let error = split(vec![chunk_with_words(3)], 0).expect_err("zero limit is invalid");
        assert!(matches!(error, ChunkingError::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(split(Vec::new(), 500).expect("split succeeds").is_empty());
    }
}
