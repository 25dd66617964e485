use regex::{Captures, Regex};

use super::error::ChunkingResult;
use super::types::{HeadingKind, HeadingMatch};

const ANNEX_DEFAULT_TITLE: &str = "Annex";

/// Outcome of classifying a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    NumericClause(HeadingMatch),
    SectionHeading(HeadingMatch),
    AnnexHeading(HeadingMatch),
    BodyLine,
}

impl LineClass {
    pub fn into_heading(self) -> Option<HeadingMatch> {
        match self {
            LineClass::NumericClause(heading)
            | LineClass::SectionHeading(heading)
            | LineClass::AnnexHeading(heading) => Some(heading),
            LineClass::BodyLine => None,
        }
    }
}

/// Recognizes clause, section and annex headings at the start of a line.
///
/// Every pattern is anchored on both ends, so a line is either a heading in
/// its entirety or body text. Numeric clauses are capped at four components;
/// deeper dotted runs are usually measurements or table values.
#[derive(Debug, Clone)]
pub struct ClauseMatcher {
    numeric_clause: Regex,
    section_heading: Regex,
    annex_heading: Regex,
}

impl ClauseMatcher {
    pub fn new() -> ChunkingResult<Self> {
        Ok(Self {
            numeric_clause: Regex::new(r"^(\d+(?:\.\d+){0,3})\s+([A-Z][^0-9\n]{3,})$")?,
            section_heading: Regex::new(r"^(SECTION\s+\d+)\s+(.+)$")?,
            annex_heading: Regex::new(r"^(ANNEX\s+[A-Z](?:-\d+)?)\b\s*(.*)$")?,
        })
    }

    pub fn classify(&self, line: &str) -> LineClass {
        let line = line.trim();
        if line.is_empty() {
            return LineClass::BodyLine;
        }

        if let Some(captures) = self.numeric_clause.captures(line) {
            let identifier = capture_text(&captures, 1);
            let depth = identifier.split('.').count() as u32;
            return LineClass::NumericClause(HeadingMatch {
                kind: HeadingKind::Clause,
                title: capture_text(&captures, 2),
                identifier,
                depth,
            });
        }

        if let Some(captures) = self.section_heading.captures(line) {
            return LineClass::SectionHeading(HeadingMatch {
                kind: HeadingKind::Section,
                identifier: capture_text(&captures, 1),
                title: capture_text(&captures, 2),
                depth: 0,
            });
        }

        if let Some(captures) = self.annex_heading.captures(line) {
            let title = capture_text(&captures, 2);
            return LineClass::AnnexHeading(HeadingMatch {
                kind: HeadingKind::Annex,
                identifier: capture_text(&captures, 1),
                title: if title.is_empty() {
                    ANNEX_DEFAULT_TITLE.to_string()
                } else {
                    title
                },
                depth: 0,
            });
        }

        LineClass::BodyLine
    }

    pub fn match_heading(&self, line: &str) -> Option<HeadingMatch> {
        self.classify(line).into_heading()
    }
}

fn capture_text(captures: &Captures<'_>, index: usize) -> String {
    captures
        .get(index)
        .map(|value| value.as_str().trim().to_string())
        .unwrap_or_default()
}
