use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("invalid quality '{0}'. Use 0-5 or again, hard, good, easy, perfect")]
    InvalidQuality(String),
}

pub type Result<T> = std::result::Result<T, VocabError>;
