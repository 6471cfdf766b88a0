use std::path::PathBuf;

use thiserror::Error;

use recommendation_client::ClientError;
use recsync_common::RepositoryError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Export already in progress: lock file {} exists", .0.display())]
    InProgress(PathBuf),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Export notification failed: {0}")]
    Dispatch(#[from] ClientError),
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
