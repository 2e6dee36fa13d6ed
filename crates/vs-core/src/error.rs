//! Error types for vs-core

use thiserror::Error;

/// Main error type for vs-core
///
/// Cipher failures keep their own [`crate::CryptoError`] so callers can tell
/// a bad key at boot from a bad token inside a job.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for vs-core
pub type Result<T> = std::result::Result<T, Error>;
