use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A translation backend answered but produced nothing usable.
    #[error("{provider}: {message}")]
    Backend { provider: String, message: String },

    #[error("path not found: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("cannot set value at `{path}`: {reason}")]
    JsonPath { path: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CoreError {
    pub fn backend(provider: &str, message: impl Into<String>) -> Self {
        CoreError::Backend {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
