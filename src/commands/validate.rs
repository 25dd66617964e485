use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::chunking::{CanonicalChunk, ChunkSummary, chunk_id};
use crate::cli::ValidateArgs;
use crate::model::{CheckResult, ValidationReport};
use crate::util::{now_utc_string, read_json, write_json_pretty};

const SAMPLE_LIMIT: usize = 5;

pub fn run(args: ValidateArgs) -> Result<()> {
    let chunks: Vec<CanonicalChunk> = read_json(&args.chunks_path)?;
    let checks = validate_chunks(&chunks, args.max_words);
    let failed = checks.iter().filter(|check| !check.passed()).count();

    let mut warnings = Vec::<String>::new();
    let repeated = repeated_ids(&chunks);
    if !repeated.is_empty() {
        warn!(
            count = repeated.len(),
            samples = %repeated.iter().take(SAMPLE_LIMIT).cloned().collect::<Vec<String>>().join(","),
            "chunk ids repeat; clause numbers recur in this document"
        );
        warnings.push(format!("{} chunk ids occur more than once", repeated.len()));
    }

    for check in &checks {
        if check.passed() {
            info!(check = %check.name, "check passed");
        } else {
            warn!(
                check = %check.name,
                violations = check.violation_count,
                samples = %check.sample_ids.join(","),
                "check failed"
            );
        }
    }

    let status = if failed == 0 { "passed" } else { "failed" };
    let report = ValidationReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        chunks_path: args.chunks_path.display().to_string(),
        max_words: args.max_words,
        summary: ChunkSummary::from_chunks(&chunks),
        checks,
        warnings,
        status: status.to_string(),
    };

    if let Some(path) = &args.report_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote validation report");
    }

    if failed > 0 {
        bail!(
            "{} of {} checks failed for {}",
            failed,
            report.checks.len(),
            args.chunks_path.display()
        );
    }

    info!(chunks = report.summary.chunk_count, "validation passed");
    Ok(())
}

pub fn validate_chunks(chunks: &[CanonicalChunk], max_words: usize) -> Vec<CheckResult> {
    vec![
        check("pages_sorted_unique", chunks, |chunk| {
            chunk.pages.windows(2).all(|pair| pair[0] < pair[1])
        }),
        check("counts_match_content", chunks, |chunk| {
            chunk.char_count == chunk.content.chars().count()
                && chunk.word_count == chunk.content.split_whitespace().count()
        }),
        check("ids_derived_from_clause", chunks, |chunk| {
            chunk.id == expected_id(chunk)
        }),
        check("part_labels_well_formed", chunks, |chunk| {
            chunk.part.as_deref().is_none_or(|label| parse_part(label).is_some())
        }),
        check("within_word_limit", chunks, |chunk| chunk.word_count <= max_words),
        check_part_groups(chunks),
    ]
}

fn check<'a, F>(name: &str, chunks: &'a [CanonicalChunk], mut passes: F) -> CheckResult
where
    F: FnMut(&'a CanonicalChunk) -> bool,
{
    let failing = chunks
        .iter()
        .filter(|chunk| !passes(*chunk))
        .map(|chunk| chunk.id.clone())
        .collect::<Vec<String>>();

    result(name, failing)
}

/// Parts of one parent must be adjacent, numbered `1..=n` in order, and share pages.
fn check_part_groups(chunks: &[CanonicalChunk]) -> CheckResult {
    let mut groups = BTreeMap::<String, Vec<(usize, &CanonicalChunk)>>::new();
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.part.is_some() {
            groups
                .entry(parent_id(&chunk.id).to_string())
                .or_default()
                .push((index, chunk));
        }
    }

    let mut failing = Vec::<String>::new();
    for (parent, members) in groups {
        let total = members.len();
        let ordered = members.iter().enumerate().all(|(offset, (index, chunk))| {
            *index == members[0].0 + offset
                && chunk.part.as_deref().and_then(parse_part) == Some((offset + 1, total))
        });
        let same_pages = members
            .iter()
            .all(|(_, chunk)| chunk.pages == members[0].1.pages);

        if !ordered || !same_pages {
            failing.push(parent);
        }
    }

    result("part_groups_contiguous", failing)
}

/// Ids are derived from clause numbers, which legitimately recur (contents
/// pages, annexes restarting at 1), so repeats are reported but never fail.
fn repeated_ids(chunks: &[CanonicalChunk]) -> Vec<String> {
    let mut seen = HashSet::<&str>::new();
    let mut repeated = BTreeSet::<&str>::new();
    for chunk in chunks {
        if !seen.insert(chunk.id.as_str()) {
            repeated.insert(chunk.id.as_str());
        }
    }
    repeated.into_iter().map(str::to_string).collect()
}

fn result(name: &str, failing: Vec<String>) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        violation_count: failing.len(),
        sample_ids: failing.into_iter().take(SAMPLE_LIMIT).collect(),
    }
}

fn expected_id(chunk: &CanonicalChunk) -> String {
    let base = chunk_id(&chunk.code, chunk.clause.as_deref());
    match chunk.part.as_deref().and_then(parse_part) {
        Some((ordinal, _)) => format!("{base}_part{ordinal}"),
        None => base,
    }
}

fn parent_id(id: &str) -> &str {
    id.rsplit_once("_part").map(|(parent, _)| parent).unwrap_or(id)
}

fn parse_part(label: &str) -> Option<(usize, usize)> {
    let (ordinal, total) = label.split_once('/')?;
    let ordinal = ordinal.parse::<usize>().ok()?;
    let total = total.parse::<usize>().ok()?;
    (ordinal >= 1 && ordinal <= total).then_some((ordinal, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{ChunkingConfig, SourceLine, chunk_document};

    fn long_document() -> Vec<CanonicalChunk> {
        let body = (0..130)
            .map(|index| format!("word{index}"))
            .collect::<Vec<String>>()
            .join(" ");
        let lines = vec![
            SourceLine::new(Some(2), "Foreword material long enough to stand as front matter on its own."),
            SourceLine::new(Some(3), "5.1 General"),
            SourceLine::new(Some(3), body),
            SourceLine::new(Some(4), "5.2 Workmanship"),
            SourceLine::new(Some(4), "Work shall be carried out by skilled labour."),
        ];

        chunk_document(&lines, &ChunkingConfig::new("IS 456:2000").with_max_words(50))
            .expect("chunking succeeds")
    }

    fn failing(checks: &[CheckResult]) -> Vec<&str> {
        checks
            .iter()
            .filter(|check| !check.passed())
            .map(|check| check.name.as_str())
            .collect()
    }

    #[test]
    fn pipeline_output_passes_every_check() {
        let chunks = long_document();
        assert_eq!(chunks.iter().filter(|chunk| chunk.part.is_some()).count(), 3);

        let checks = validate_chunks(&chunks, 50);
        assert!(failing(&checks).is_empty(), "unexpected failures: {:?}", failing(&checks));
    }

    #[test]
    fn tampered_chunks_are_reported() {
        let mut chunks = long_document();
        chunks[0].pages = vec![3, 2];
        chunks[1].word_count -= 1;
        chunks[2].pages.push(99);
        let duplicate = chunks[4].clone();
        chunks.push(duplicate);

        let checks = validate_chunks(&chunks, 50);
        assert_eq!(
            failing(&checks),
            vec![
                "pages_sorted_unique",
                "counts_match_content",
                "part_groups_contiguous"
            ]
        );
    }

    #[test]
    fn repeated_clause_ids_do_not_fail_validation() {
        let lines = vec![
            SourceLine::new(Some(1), "1 SCOPE"),
            SourceLine::new(Some(1), "This standard deals with plain and reinforced concrete."),
            SourceLine::new(Some(40), "ANNEX A"),
            SourceLine::new(Some(40), "List of referred standards cited in this code."),
            SourceLine::new(Some(40), "1 SCOPE"),
            SourceLine::new(Some(40), "The annex covers the referred standards only."),
        ];
        let chunks = chunk_document(&lines, &ChunkingConfig::new("IS 456")).expect("chunking succeeds");

        let checks = validate_chunks(&chunks, 500);
        assert!(failing(&checks).is_empty(), "unexpected failures: {:?}", failing(&checks));
        assert_eq!(repeated_ids(&chunks), vec!["IS_456_1".to_string()]);
    }

    #[test]
    fn word_limit_uses_requested_maximum() {
        let chunks = long_document();
        let checks = validate_chunks(&chunks, 10);
        assert!(failing(&checks).contains(&"within_word_limit"));
    }

    #[test]
    fn parse_part_rejects_out_of_range_labels() {
        assert_eq!(parse_part("2/3"), Some((2, 3)));
        assert_eq!(parse_part("0/3"), None);
        assert_eq!(parse_part("4/3"), None);
        assert_eq!(parse_part("two/3"), None);
        assert_eq!(parent_id("IS_456_5.1_part2"), "IS_456_5.1");
        assert_eq!(parent_id("IS_456_5.1"), "IS_456_5.1");
    }
}
