//! Custom error types for newsdb

use thiserror::Error;

/// Main error type for newsdb operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Taxonomy error: {0}")]
    Taxonomy(String),

    #[error("Database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("BSON encoding error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    #[error("Search error: {0}")]
    Search(#[from] elasticsearch::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Not initialized: run 'newsdb init' first")]
    NotInitialized,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Result type alias for newsdb
pub type Result<T> = std::result::Result<T, Error>;
