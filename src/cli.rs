use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "iscode",
    version,
    about = "Clause-aware chunking of numbered engineering standards"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub pdf_path: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub skip_pages: usize,

    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long, default_value = ".cache/iscode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub input_path: PathBuf,

    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 500)]
    pub max_words: usize,

    #[arg(long, default_value_t = 50)]
    pub min_body_chars: usize,

    #[arg(long, default_value_t = false)]
    pub flush_every_heading: bool,

    #[arg(long, default_value_t = false)]
    pub drop_headless: bool,

    #[arg(long, default_value_t = 0)]
    pub skip_pages: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/iscode")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub chunks_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub chunks_path: PathBuf,

    #[arg(long, default_value_t = 500)]
    pub max_words: usize,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
