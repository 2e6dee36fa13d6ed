//! Error types for vs-audio

use thiserror::Error;

/// vs-audio error type
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio decoding error: {0}")]
    Decode(String),

    #[error("Audio resampling error: {0}")]
    Resample(String),

    #[error("Audio encoding error: {0}")]
    Encode(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid waveform: {0}")]
    InvalidWaveform(String),
}

impl AudioError {
    /// Generic remediation hint safe to show to callers
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Resample(_) => "check the sample rate",
            _ => "check if format is supported",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AudioError>;
