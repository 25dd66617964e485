use super::types::{CanonicalChunk, RawChunk};

const HEADLESS_ID_TOKEN: &str = "intro";

/// Converts a finalized raw chunk into its canonical form.
pub fn normalize(raw: &RawChunk, code: &str) -> CanonicalChunk {
    let content = canonical_body(&raw.lines);

    CanonicalChunk {
        id: chunk_id(code, raw.clause.as_deref()),
        code: code.to_string(),
        clause: raw.clause.clone(),
        title: raw.title.clone(),
        depth: raw.depth,
        pages: raw.pages.iter().copied().collect(),
        char_count: content.chars().count(),
        word_count: content.split_whitespace().count(),
        content,
        part: None,
    }
}

/// Stable, storage-safe id for a chunk of document `code`.
pub fn chunk_id(code: &str, clause: Option<&str>) -> String {
    format!("{}_{}", code, clause.unwrap_or(HEADLESS_ID_TOKEN))
        .replace(' ', "_")
        .replace(':', "_")
}

fn canonical_body(lines: &[String]) -> String {
    collapse_blank_runs(&lines.join("\n")).trim().to_string()
}

/// Collapses every run of three or more newlines into exactly two.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0usize;

    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
            continue;
        }

        newline_run = 0;
        out.push(ch);
    }

    out
}
