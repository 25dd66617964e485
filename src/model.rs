use serde::{Deserialize, Serialize};

use crate::chunking::ChunkSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub iscode: String,
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub output_path: String,
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfigRecord {
    pub code: String,
    pub max_words: usize,
    pub flush_policy: String,
    pub min_body_chars: Option<usize>,
    pub drop_headless: bool,
    pub skip_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ChunkPaths,
    pub source: SourceEntry,
    pub config: ChunkConfigRecord,
    pub summary: ChunkSummary,
    pub headless_dropped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub violation_count: usize,
    pub sample_ids: Vec<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.violation_count == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub chunks_path: String,
    pub max_words: usize,
    pub summary: ChunkSummary,
    pub checks: Vec<CheckResult>,
    pub warnings: Vec<String>,
    pub status: String,
}
