//! Job result returned to the runner

use serde::{Deserialize, Serialize};
use vs_audio::AudioFormat;

const SUCCESS_STATUS: &str = "success";

/// Outcome of one job
///
/// Serialized without a tag: a success carries `status`, an error carries
/// `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobResult {
    Success {
        status: String,
        /// Encrypted encoded audio
        encrypted_audio: String,
        format: AudioFormat,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        available_modes: Option<Vec<String>>,
    },
}

impl JobResult {
    pub fn success(encrypted_audio: impl Into<String>, format: AudioFormat) -> Self {
        Self::Success {
            status: SUCCESS_STATUS.to_string(),
            encrypted_audio: encrypted_audio.into(),
            format,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            details: None,
            available_modes: None,
        }
    }

    /// Attach details to an error result; no-op on success
    pub fn with_details(mut self, text: impl Into<String>) -> Self {
        if let Self::Error { details, .. } = &mut self {
            *details = Some(text.into());
        }
        self
    }

    /// Attach the list of accepted modes; no-op on success
    pub fn with_available_modes(mut self, modes: Vec<String>) -> Self {
        if let Self::Error { available_modes, .. } = &mut self {
            *available_modes = Some(modes);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error message, if this is an error result
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error, .. } => Some(error),
            Self::Success { .. } => None,
        }
    }
}
