use tracing::{debug, trace};

use super::matcher::ClauseMatcher;
use super::stream::parse_page_marker;
use super::types::{HeadingMatch, RawChunk, SourceLine};

pub const DEFAULT_MIN_BODY_CHARS: usize = 50;

/// Decides whether a newly recognized heading closes the open chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Close the open chunk on every heading as long as it holds a line.
    EveryHeading,
    /// Close the open chunk only once it is substantial: its lines, joined with
    /// newlines, exceed `min_body_chars`, or it carries a heading followed by
    /// running text. Until then further headings refine the open chunk instead
    /// of producing one-line chunks, which keeps dense heading runs (contents
    /// pages, stacked headings) together.
    BodyThreshold { min_body_chars: usize },
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::BodyThreshold {
            min_body_chars: DEFAULT_MIN_BODY_CHARS,
        }
    }
}

#[derive(Debug, Default)]
struct OpenChunk {
    raw: RawChunk,
    joined_chars: usize,
    body_lines_since_heading: usize,
}

impl OpenChunk {
    fn seeded(heading: &HeadingMatch, line: &str, page: Option<u32>) -> Self {
        Self {
            raw: RawChunk::seeded(heading, line, page),
            joined_chars: line.chars().count(),
            body_lines_since_heading: 0,
        }
    }

    fn append(&mut self, line: &str, page: Option<u32>) {
        // lines are joined with a single newline
        if !self.raw.is_empty() {
            self.joined_chars += 1;
        }
        self.joined_chars += line.chars().count();
        self.raw.lines.push(line.to_string());
        self.raw.pages.extend(page);
    }

    fn push_body(&mut self, line: &str, page: Option<u32>) {
        if is_running_text(line) {
            self.body_lines_since_heading += 1;
        }
        self.append(line, page);
    }

    fn promote(&mut self, heading: HeadingMatch, line: &str, page: Option<u32>) {
        self.raw.clause = Some(heading.identifier);
        self.raw.title = Some(heading.title);
        self.raw.depth = heading.depth;
        self.append(line, page);
        self.body_lines_since_heading = 0;
    }

    fn is_substantial(&self, policy: FlushPolicy) -> bool {
        if self.raw.is_empty() {
            return false;
        }

        match policy {
            FlushPolicy::EveryHeading => true,
            FlushPolicy::BodyThreshold { min_body_chars } => {
                self.joined_chars > min_body_chars
                    || (!self.raw.is_headless() && self.body_lines_since_heading > 0)
            }
        }
    }
}

/// Blank lines and bare page numbers (contents pages, running footers) are not
/// body text of the heading above them.
fn is_running_text(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Running state of one forward pass over a line stream.
///
/// The context is owned by a single `segment` call; nothing is shared between
/// documents, so independent documents can be segmented concurrently.
#[derive(Debug)]
pub struct SegmenterContext<'m> {
    matcher: &'m ClauseMatcher,
    policy: FlushPolicy,
    current_page: Option<u32>,
    open: OpenChunk,
    emitted: Vec<RawChunk>,
}

impl<'m> SegmenterContext<'m> {
    pub fn new(matcher: &'m ClauseMatcher, policy: FlushPolicy) -> Self {
        Self {
            matcher,
            policy,
            current_page: None,
            open: OpenChunk::default(),
            emitted: Vec::new(),
        }
    }

    pub fn feed(&mut self, line: &SourceLine) {
        if let Some(page) = line.page {
            self.current_page = Some(page);
        }

        if let Some(page) = parse_page_marker(&line.text) {
            self.current_page = Some(page);
            return;
        }

        if self.open.raw.is_empty() && line.text.trim().is_empty() {
            return;
        }

        let Some(heading) = self.matcher.match_heading(&line.text) else {
            self.open.push_body(&line.text, self.current_page);
            return;
        };

        if self.open.is_substantial(self.policy) {
            let previous = std::mem::replace(
                &mut self.open,
                OpenChunk::seeded(&heading, &line.text, self.current_page),
            );
            self.emit(previous.raw);
        } else {
            trace!(
                kind = heading.kind.as_str(),
                clause = %heading.identifier,
                previous = ?self.open.raw.clause,
                "refining open chunk heading"
            );
            self.open.promote(heading, &line.text, self.current_page);
        }
    }

    pub fn finish(mut self) -> Vec<RawChunk> {
        if self.open.is_substantial(self.policy) {
            let last = std::mem::take(&mut self.open);
            self.emit(last.raw);
        } else if !self.open.raw.is_empty() {
            debug!(
                clause = ?self.open.raw.clause,
                lines = self.open.raw.lines.len(),
                "dropping trivial trailing chunk"
            );
        }

        self.emitted
    }

    fn emit(&mut self, chunk: RawChunk) {
        debug!(
            clause = ?chunk.clause,
            lines = chunk.lines.len(),
            pages = chunk.pages.len(),
            "finalized chunk"
        );
        self.emitted.push(chunk);
    }
}

pub fn segment<'a, I>(lines: I, matcher: &ClauseMatcher, policy: FlushPolicy) -> Vec<RawChunk>
where
    I: IntoIterator<Item = &'a SourceLine>,
{
    let mut context = SegmenterContext::new(matcher, policy);
    for line in lines {
        context.feed(line);
    }
    context.finish()
}
