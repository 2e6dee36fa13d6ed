//! Error types for vs-backend

use thiserror::Error;

/// Model inference failure
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend returned unusable audio: {0}")]
    InvalidOutput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BackendError>;
