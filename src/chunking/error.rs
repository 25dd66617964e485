use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkingError {
    #[error("invalid chunking configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to compile heading pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ChunkingResult<T> = std::result::Result<T, ChunkingError>;
