use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch tool could not be spawned or an IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The fetch tool ran but reported a failure
    #[error("Download failed: {0}")]
    Failed(String),

    /// The fetch tool exited successfully but produced no output file
    #[error("No output file at {0}")]
    MissingOutput(PathBuf),
}

impl FetchError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
