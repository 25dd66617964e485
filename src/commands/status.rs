use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::chunking::{CanonicalChunk, ChunkSummary};
use crate::cli::StatusArgs;
use crate::commands::chunk::count_rows;
use crate::model::ChunkRunManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");

    info!(cache_root = %args.cache_root.display(), "status requested");

    let latest_manifest = latest_run_manifest(&manifest_dir)?;
    let mut chunks_path = args.chunks_path.clone();
    let mut db_path = args.db_path.clone();

    if let Some(path) = &latest_manifest {
        let manifest: ChunkRunManifest = read_json(path)?;

        info!(
            path = %path.display(),
            run_id = %manifest.run_id,
            status = %manifest.status,
            started_at = %manifest.started_at,
            updated_at = %manifest.updated_at,
            source = %manifest.source.path,
            source_kind = %manifest.source.kind,
            code = %manifest.config.code,
            max_words = manifest.config.max_words,
            flush_policy = %manifest.config.flush_policy,
            chunks = manifest.summary.chunk_count,
            headless_dropped = manifest.headless_dropped,
            warnings = manifest.warnings.len(),
            "loaded latest chunk run manifest"
        );

        if chunks_path.is_none() {
            chunks_path = Some(PathBuf::from(&manifest.paths.output_path));
        }
        if db_path.is_none() {
            db_path = manifest.paths.db_path.as_ref().map(PathBuf::from);
        }
    } else {
        warn!(path = %manifest_dir.display(), "no chunk run manifest found");
    }

    match chunks_path {
        Some(path) if path.exists() => {
            let chunks: Vec<CanonicalChunk> = read_json(&path)?;
            let summary = ChunkSummary::from_chunks(&chunks);
            info!(
                path = %path.display(),
                chunks = summary.chunk_count,
                clause_chunks = summary.clause_chunk_count,
                headless_chunks = summary.headless_chunk_count,
                split_parts = summary.split_part_count,
                total_chars = summary.total_chars,
                total_words = summary.total_words,
                average_words = summary.average_words,
                "chunk file summary"
            );
        }
        Some(path) => warn!(path = %path.display(), "chunk file missing"),
        None => warn!("no chunk file known"),
    }

    match db_path {
        Some(path) if path.exists() => {
            let conn = Connection::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let docs_count = count_rows(&conn, "SELECT COUNT(*) FROM docs").unwrap_or(0);
            let chunks_count = count_rows(&conn, "SELECT COUNT(*) FROM chunks").unwrap_or(0);

            info!(
                path = %path.display(),
                docs = docs_count,
                chunks = chunks_count,
                "database status"
            );
        }
        Some(path) => warn!(path = %path.display(), "database file missing"),
        None => {}
    }

    Ok(())
}

fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();

        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("chunk_run_") && name.ends_with(".json"))
            .unwrap_or(false);
        if !is_run_manifest {
            continue;
        }

        if latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
