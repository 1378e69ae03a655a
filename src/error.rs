// Error module: every failure the pipeline can hit. None of them are
// retried; the binary turns them into a message and a non-zero exit.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("not enough images found for '{keyword}': got {found}, need {required}")]
    InsufficientImages {
        keyword: String,
        found: usize,
        required: usize,
    },
    #[error("image search failed: {0}")]
    Search(String),
    #[error("failed to download image {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("error uploading to object storage: {0}")]
    Upload(String),
    #[error("authorization failed: {0}")]
    OAuth(String),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
