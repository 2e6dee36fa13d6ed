//! Error types for vs-handler

use thiserror::Error;
use vs_audio::AudioError;
use vs_backend::BackendError;
use vs_core::CryptoError;

use crate::request::{Mode, ValidationError};
use crate::result::JobResult;

/// Pipeline step a failure happened in
///
/// `Display` is the message returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DecryptText,
    ReferenceAudio,
    TtsGeneration,
    DecryptSource,
    ProcessSource,
    DecryptTarget,
    ProcessTarget,
    VoiceConversion,
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::DecryptText => "Failed to decrypt text",
            Self::ReferenceAudio => "Failed to process reference audio",
            Self::TtsGeneration => "TTS generation failed",
            Self::DecryptSource => "Failed to decrypt source audio",
            Self::ProcessSource => "Failed to process source audio",
            Self::DecryptTarget => "Failed to decrypt target voice",
            Self::ProcessTarget => "Failed to process target voice",
            Self::VoiceConversion => "Voice conversion failed",
            Self::Output => "Failed to encode/encrypt output audio",
        };
        f.write_str(message)
    }
}

/// Per-request failure; converted into a [`JobResult`] at the handler boundary
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{stage}")]
    Crypto {
        stage: Stage,
        #[source]
        source: CryptoError,
    },

    #[error("{stage}")]
    Audio {
        stage: Stage,
        #[source]
        source: AudioError,
    },

    #[error("{stage}")]
    Backend {
        stage: Stage,
        #[source]
        source: BackendError,
    },
}

impl HandlerError {
    pub fn crypto(stage: Stage, source: CryptoError) -> Self {
        Self::Crypto { stage, source }
    }

    pub fn audio(stage: Stage, source: AudioError) -> Self {
        Self::Audio { stage, source }
    }

    pub fn backend(stage: Stage, source: BackendError) -> Self {
        Self::Backend { stage, source }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Validation(_) => None,
            Self::Crypto { stage, .. } | Self::Audio { stage, .. } | Self::Backend { stage, .. } => {
                Some(*stage)
            }
        }
    }

    /// Caller-facing detail text
    ///
    /// Built from error kinds only: crypto failures collapse to one fixed
    /// message and codec failures carry a generic hint.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Validation(e) => e.details(),
            Self::Crypto { source, .. } => Some(source.to_string()),
            Self::Audio { source, .. } => Some(format!("{}; {}", source, source.hint())),
            Self::Backend { source, .. } => Some(source.to_string()),
        }
    }
}

impl From<HandlerError> for JobResult {
    fn from(err: HandlerError) -> Self {
        let mut result = JobResult::error(err.to_string());
        if let Some(details) = err.details() {
            result = result.with_details(details);
        }
        if let HandlerError::Validation(ValidationError::UnknownMode(_)) = err {
            result = result.with_available_modes(Mode::available());
        }
        result
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crypto_failure_result() {
        let result: JobResult = HandlerError::crypto(Stage::DecryptText, CryptoError::Authentication).into();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "Failed to decrypt text", "details": "invalid or tampered token"})
        );
    }

    #[test]
    fn test_audio_failure_carries_hint() {
        let err = HandlerError::audio(
            Stage::ProcessSource,
            AudioError::Decode("unrecognized container".to_string()),
        );
        assert_eq!(err.to_string(), "Failed to process source audio");
        assert_eq!(err.stage(), Some(Stage::ProcessSource));
        let details = err.details().unwrap();
        assert!(details.contains("check if format is supported"), "{}", details);
    }

    #[test]
    fn test_unknown_mode_lists_available_modes() {
        let result: JobResult = HandlerError::from(ValidationError::UnknownMode("bogus".to_string())).into();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "Unknown mode 'bogus'", "available_modes": ["tts", "vc"]})
        );
    }

    #[test]
    fn test_validation_failure_result() {
        let err = HandlerError::from(ValidationError::MissingFields {
            mode: Mode::Tts,
            fields: vec!["encrypted_text", "language_id"],
        });
        assert!(err.stage().is_none());
        let result: JobResult = err.into();
        assert_eq!(
            result.error_message(),
            Some("TTS mode requires 'encrypted_text' and 'language_id'")
        );
    }

    #[test]
    fn test_backend_failure_result() {
        let result: JobResult = HandlerError::backend(
            Stage::VoiceConversion,
            BackendError::Inference("model crashed".to_string()),
        )
        .into();
        assert_eq!(result.error_message(), Some("Voice conversion failed"));
        assert_eq!(
            serde_json::to_value(&result).unwrap()["details"],
            json!("Inference failed: model crashed")
        );
    }
}
