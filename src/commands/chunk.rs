use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::chunking::{
    CanonicalChunk, ChunkSummary, ChunkingConfig, FlushPolicy, SourceLine, chunk_document,
    lines_from_marked_text, lines_from_pages,
};
use crate::cli::ChunkArgs;
use crate::commands::extract::{extract_pages, pdftotext_version};
use crate::model::{ChunkConfigRecord, ChunkPaths, ChunkRunManifest, SourceEntry, ToolVersions};
use crate::util::{
    ensure_directory, file_slug, now_utc_string, sha256_file, utc_compact_string,
    write_json_pretty,
};

mod store;

pub use store::{configure_connection, count_rows};

pub fn run(args: ChunkArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("chunk_run_{}.json", utc_compact_string(started_ts)))
    });
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(&cache_root, &args.code));

    info!(
        input = %args.input_path.display(),
        code = %args.code,
        run_id = %run_id,
        "starting chunk run"
    );

    let mut warnings = Vec::<String>::new();
    let (lines, kind) = load_source_lines(&args, &mut warnings)?;

    let config = chunking_config(&args);
    let mut chunks = chunk_document(&lines, &config)
        .with_context(|| format!("failed to chunk {}", args.input_path.display()))?;

    let headless_dropped = if args.drop_headless {
        drop_headless_chunks(&mut chunks)
    } else {
        0
    };
    if headless_dropped > 0 {
        warn!(count = headless_dropped, "dropped headless front-matter chunks");
    }

    write_json_pretty(&output_path, &chunks)?;
    info!(path = %output_path.display(), chunks = chunks.len(), "wrote chunk list");

    let source_hash = sha256_file(&args.input_path)?;
    if let Some(db_path) = &args.db_path {
        persist_to_store(db_path, &args, &source_hash, &chunks)?;
    }

    let summary = ChunkSummary::from_chunks(&chunks);
    if summary.chunk_count == 0 {
        warnings.push(format!("no chunks produced from {}", args.input_path.display()));
    }

    let manifest = ChunkRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_chunk_command(&args),
        tool_versions: ToolVersions {
            iscode: env!("CARGO_PKG_VERSION").to_string(),
            pdftotext: if kind == SourceKind::Pdf {
                pdftotext_version()
            } else {
                None
            },
        },
        paths: ChunkPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            output_path: output_path.display().to_string(),
            db_path: args.db_path.as_ref().map(|path| path.display().to_string()),
        },
        source: SourceEntry {
            path: args.input_path.display().to_string(),
            kind: kind.as_str().to_string(),
            sha256: source_hash,
            line_count: lines.len(),
        },
        config: config_record(&args, &config),
        summary,
        headless_dropped,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote chunk run manifest");
    info!(
        chunks = manifest.summary.chunk_count,
        clauses = manifest.summary.clause_chunk_count,
        split_parts = manifest.summary.split_part_count,
        total_chars = manifest.summary.total_chars,
        average_words = manifest.summary.average_words,
        "chunk run completed"
    );

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    MarkedText,
    Pdf,
}

impl SourceKind {
    fn for_path(path: &Path) -> Self {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            SourceKind::Pdf
        } else {
            SourceKind::MarkedText
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SourceKind::MarkedText => "marked_text",
            SourceKind::Pdf => "pdf",
        }
    }
}

fn load_source_lines(
    args: &ChunkArgs,
    warnings: &mut Vec<String>,
) -> Result<(Vec<SourceLine>, SourceKind)> {
    let kind = SourceKind::for_path(&args.input_path);

    let lines = match kind {
        SourceKind::Pdf => {
            let (pages, first_page) = extract_pages(&args.input_path, args.skip_pages, None)?;
            lines_from_pages(&pages, first_page)
        }
        SourceKind::MarkedText => {
            if args.skip_pages > 0 {
                warnings.push(
                    "--skip-pages only applies to PDF input; page-marked text is used as-is"
                        .to_string(),
                );
            }
            let text = fs::read_to_string(&args.input_path)
                .with_context(|| format!("failed to read {}", args.input_path.display()))?;
            lines_from_marked_text(&text)
        }
    };

    Ok((lines, kind))
}

fn chunking_config(args: &ChunkArgs) -> ChunkingConfig {
    let flush_policy = if args.flush_every_heading {
        FlushPolicy::EveryHeading
    } else {
        FlushPolicy::BodyThreshold {
            min_body_chars: args.min_body_chars,
        }
    };

    ChunkingConfig::new(args.code.clone())
        .with_max_words(args.max_words)
        .with_flush_policy(flush_policy)
}

fn config_record(args: &ChunkArgs, config: &ChunkingConfig) -> ChunkConfigRecord {
    let (flush_policy, min_body_chars) = match config.flush_policy {
        FlushPolicy::EveryHeading => ("every_heading", None),
        FlushPolicy::BodyThreshold { min_body_chars } => ("body_threshold", Some(min_body_chars)),
    };

    ChunkConfigRecord {
        code: config.code.clone(),
        max_words: config.max_words,
        flush_policy: flush_policy.to_string(),
        min_body_chars,
        drop_headless: args.drop_headless,
        skip_pages: args.skip_pages,
    }
}

fn drop_headless_chunks(chunks: &mut Vec<CanonicalChunk>) -> usize {
    let before = chunks.len();
    chunks.retain(|chunk| !chunk.is_headless());
    before - chunks.len()
}

fn default_output_path(cache_root: &Path, code: &str) -> PathBuf {
    cache_root
        .join("chunks")
        .join(format!("{}_chunks.json", file_slug(code)))
}

fn persist_to_store(
    db_path: &Path,
    args: &ChunkArgs,
    source_hash: &str,
    chunks: &[CanonicalChunk],
) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let mut connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    store::ensure_schema(&connection)?;

    let doc_id = file_slug(&args.code);
    let document = store::DocumentRecord {
        doc_id: &doc_id,
        code: &args.code,
        source_path: &args.input_path.display().to_string(),
        sha256: source_hash,
    };
    let inserted = store::replace_document_chunks(&mut connection, &document, chunks)?;

    let chunks_total = count_rows(&connection, "SELECT COUNT(*) FROM chunks")?;
    info!(
        path = %db_path.display(),
        doc_id = %doc_id,
        inserted,
        chunks_total,
        "persisted chunks"
    );

    Ok(())
}

fn render_chunk_command(args: &ChunkArgs) -> String {
    let mut command = vec![
        "iscode".to_string(),
        "chunk".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--input-path".to_string(),
        args.input_path.display().to_string(),
        "--code".to_string(),
        format!("{:?}", args.code),
        "--max-words".to_string(),
        args.max_words.to_string(),
    ];

    if let Some(path) = &args.output_path {
        command.push("--output-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if args.flush_every_heading {
        command.push("--flush-every-heading".to_string());
    } else {
        command.push("--min-body-chars".to_string());
        command.push(args.min_body_chars.to_string());
    }
    if args.drop_headless {
        command.push("--drop-headless".to_string());
    }
    if args.skip_pages > 0 {
        command.push("--skip-pages".to_string());
        command.push(args.skip_pages.to_string());
    }

    command.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ChunkArgs {
        ChunkArgs {
            cache_root: PathBuf::from(".cache/iscode"),
            input_path: PathBuf::from("docs/IS_456_2000.pages.txt"),
            code: "IS 456:2000".to_string(),
            output_path: None,
            manifest_path: None,
            db_path: None,
            max_words: 500,
            min_body_chars: 50,
            flush_every_heading: false,
            drop_headless: false,
            skip_pages: 0,
        }
    }

    #[test]
    fn chunking_config_maps_flush_flags() {
        let mut args = args();
        assert_eq!(
            chunking_config(&args).flush_policy,
            FlushPolicy::BodyThreshold { min_body_chars: 50 }
        );

        args.flush_every_heading = true;
        let config = chunking_config(&args);
        assert_eq!(config.flush_policy, FlushPolicy::EveryHeading);

        let record = config_record(&args, &config);
        assert_eq!(record.flush_policy, "every_heading");
        assert!(record.min_body_chars.is_none());
    }

    #[test]
    fn default_output_path_uses_code_slug() {
        assert_eq!(
            default_output_path(Path::new(".cache/iscode"), "IS 456:2000"),
            PathBuf::from(".cache/iscode/chunks/is_456_2000_chunks.json")
        );
    }

    #[test]
    fn source_kind_detects_pdf_extension() {
        assert_eq!(SourceKind::for_path(Path::new("a/IS_456.PDF")), SourceKind::Pdf);
        assert_eq!(
            SourceKind::for_path(Path::new("a/IS_456.pages.txt")),
            SourceKind::MarkedText
        );
    }

    #[test]
    fn drop_headless_chunks_keeps_clause_chunks() {
        let lines = lines_from_marked_text(
            "Foreword material that is long enough to be kept as its own front-matter chunk.\n1.1 Scope\nCovers plain concrete.",
        );
        let mut chunks =
            chunk_document(&lines, &ChunkingConfig::new("IS 456")).expect("chunking succeeds");
        assert_eq!(chunks.len(), 2);

        assert_eq!(drop_headless_chunks(&mut chunks), 1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].clause.as_deref(), Some("1.1"));
    }

    #[test]
    fn render_chunk_command_includes_non_default_flags() {
        let mut args = args();
        args.drop_headless = true;
        args.skip_pages = 3;

        let command = render_chunk_command(&args);
        assert!(command.starts_with("iscode chunk --cache-root .cache/iscode"));
        assert!(command.contains("--code \"IS 456:2000\""));
        assert!(command.contains("--min-body-chars 50"));
        assert!(command.contains("--drop-headless"));
        assert!(command.contains("--skip-pages 3"));
        assert!(!command.contains("--db-path"));
    }
}
