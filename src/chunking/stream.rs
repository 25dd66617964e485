use super::types::SourceLine;

/// Returns the page number carried by a `[PAGE n]` marker line.
pub fn parse_page_marker(text: &str) -> Option<u32> {
    text.trim()
        .strip_prefix("[PAGE ")?
        .strip_suffix(']')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()))?
        .parse::<u32>()
        .ok()
}

pub fn page_marker(page: u32) -> String {
    format!("[PAGE {page}]")
}

/// Splits a page-marked text blob into unpaged lines; markers stay in the stream.
pub fn lines_from_marked_text(text: &str) -> Vec<SourceLine> {
    text.lines().map(SourceLine::unpaged).collect()
}

/// Tags every line of every page with its page number, starting at `first_page`.
pub fn lines_from_pages(pages: &[String], first_page: u32) -> Vec<SourceLine> {
    pages
        .iter()
        .zip(first_page..)
        .flat_map(|(page_text, page)| {
            page_text
                .lines()
                .map(move |line| SourceLine::new(Some(page), line))
        })
        .collect()
}

/// Renders pages into the marker format consumed by `lines_from_marked_text`.
///
/// Pages without any visible text are skipped but still consume a page number.
pub fn render_marked_text(pages: &[String], first_page: u32) -> String {
    let mut out = String::new();

    for (page_text, page) in pages.iter().zip(first_page..) {
        if page_text.trim().is_empty() {
            continue;
        }

        out.push('\n');
        out.push_str(&page_marker(page));
        out.push('\n');
        out.push_str(page_text.trim_end());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_page_marker_accepts_exact_marker_only() {
        assert_eq!(parse_page_marker("[PAGE 4]"), Some(4));
        assert_eq!(parse_page_marker("  [PAGE 117]  "), Some(117));
        assert_eq!(parse_page_marker("[PAGE ]"), None);
        assert_eq!(parse_page_marker("[PAGE four]"), None);
        assert_eq!(parse_page_marker("[PAGE 4] trailing"), None);
        assert_eq!(parse_page_marker("see [PAGE 4]"), None);
        assert_eq!(parse_page_marker("[page 4]"), None);
    }

    #[test]
    fn render_marked_text_skips_blank_pages_but_keeps_numbering() {
        let pages = vec![
            "Cover".to_string(),
            "   \n".to_string(),
            "1.1 Scope\nBody\n".to_string(),
        ];

        let rendered = render_marked_text(&pages, 4);
        let lines = lines_from_marked_text(&rendered);
        let markers = lines
            .iter()
            .filter_map(|line| parse_page_marker(&line.text))
            .collect::<Vec<u32>>();

        assert_eq!(markers, vec![4, 6]);
        assert!(rendered.contains("[PAGE 6]\n1.1 Scope\nBody"));
        assert!(lines.iter().all(|line| line.page.is_none()));
    }

    #[test]
    fn lines_from_pages_tags_each_line() {
        let pages = vec!["a\nb".to_string(), "c".to_string()];
        let lines = lines_from_pages(&pages, 10);

        assert_eq!(
            lines,
            vec![
                SourceLine::new(Some(10), "a"),
                SourceLine::new(Some(10), "b"),
                SourceLine::new(Some(11), "c"),
            ]
        );
    }
}
