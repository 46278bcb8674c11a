use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl ChatError {
    pub fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ChatError::StorageUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
