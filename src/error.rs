use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error in {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid kingdom coordinates: {0}")]
    InvalidKingdom(String),

    #[error("Invalid noise pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, NewsError>;
