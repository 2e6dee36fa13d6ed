//! Request validation
//!
//! Turns an untrusted [`JobInput`] into a typed request for one mode.
//! Validation only checks presence and JSON types; it never decrypts.

use serde_json::Value;
use thiserror::Error;
use vs_audio::AudioFormat;

use crate::job::JobInput;

/// Field names accepted in a job input
pub mod fields {
    pub const MODE: &str = "mode";
    pub const ENCRYPTED_TEXT: &str = "encrypted_text";
    pub const LANGUAGE_ID: &str = "language_id";
    pub const ENCRYPTED_REFERENCE_AUDIO: &str = "encrypted_reference_audio_b64";
    pub const ENCRYPTED_SOURCE_AUDIO: &str = "encrypted_source_audio";
    pub const ENCRYPTED_TARGET_VOICE: &str = "encrypted_target_voice";
    pub const OUTPUT_FORMAT: &str = "output_format";
}

/// Operation selected by a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Tts,
    Vc,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Tts, Mode::Vc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts => "tts",
            Self::Vc => "vc",
        }
    }

    /// Names listed back to callers that send an unknown mode
    pub fn available() -> Vec<String> {
        Self::ALL.iter().map(|m| m.as_str().to_string()).collect()
    }

    /// Read the `mode` field; absent means TTS
    pub fn parse(value: Option<&Value>) -> Result<Self, ValidationError> {
        let raw = match value {
            None | Some(Value::Null) => return Ok(Self::Tts),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(ValidationError::UnknownMode(other.to_string())),
        };

        match raw.trim().to_lowercase().as_str() {
            "tts" => Ok(Self::Tts),
            "vc" => Ok(Self::Vc),
            _ => Err(ValidationError::UnknownMode(raw.to_string())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed job input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Job is missing its 'input' object")]
    MissingInput,

    #[error("Unknown mode '{0}'")]
    UnknownMode(String),

    #[error("{}", missing_fields_message(.mode))]
    MissingFields { mode: Mode, fields: Vec<&'static str> },

    #[error("Field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unsupported output format '{0}'")]
    UnsupportedFormat(String),
}

fn missing_fields_message(mode: &Mode) -> &'static str {
    match mode {
        Mode::Tts => "TTS mode requires 'encrypted_text' and 'language_id'",
        Mode::Vc => "VC mode requires 'encrypted_source_audio' and 'encrypted_target_voice'",
    }
}

impl ValidationError {
    /// Extra context for the caller, if any
    pub fn details(&self) -> Option<String> {
        match self {
            Self::MissingFields { fields, .. } => Some(format!("missing: {}", fields.join(", "))),
            Self::UnsupportedFormat(_) => Some(format!(
                "supported formats: {}",
                AudioFormat::ALL.map(|f| f.as_str()).join(", ")
            )),
            _ => None,
        }
    }
}

/// Typed TTS job
#[derive(Debug, Clone, PartialEq)]
pub struct TtsRequest<'a> {
    pub encrypted_text: &'a str,
    pub language_id: &'a str,
    pub encrypted_reference_audio: Option<&'a str>,
    pub output_format: Option<AudioFormat>,
}

impl<'a> TtsRequest<'a> {
    pub fn from_input(input: &'a JobInput) -> Result<Self, ValidationError> {
        let encrypted_text = optional_str(input, fields::ENCRYPTED_TEXT)?;
        let language_id = optional_str(input, fields::LANGUAGE_ID)?;

        let (encrypted_text, language_id) = match (encrypted_text, language_id) {
            (Some(text), Some(language)) => (text, language),
            (text, language) => {
                let mut missing = Vec::new();
                if text.is_none() {
                    missing.push(fields::ENCRYPTED_TEXT);
                }
                if language.is_none() {
                    missing.push(fields::LANGUAGE_ID);
                }
                return Err(ValidationError::MissingFields {
                    mode: Mode::Tts,
                    fields: missing,
                });
            }
        };

        Ok(Self {
            encrypted_text,
            language_id,
            encrypted_reference_audio: optional_str(input, fields::ENCRYPTED_REFERENCE_AUDIO)?,
            output_format: output_format(input)?,
        })
    }
}

/// Typed voice conversion job
#[derive(Debug, Clone, PartialEq)]
pub struct VcRequest<'a> {
    pub encrypted_source_audio: &'a str,
    pub encrypted_target_voice: &'a str,
    pub output_format: Option<AudioFormat>,
}

impl<'a> VcRequest<'a> {
    pub fn from_input(input: &'a JobInput) -> Result<Self, ValidationError> {
        let source = optional_str(input, fields::ENCRYPTED_SOURCE_AUDIO)?;
        let target = optional_str(input, fields::ENCRYPTED_TARGET_VOICE)?;

        let (encrypted_source_audio, encrypted_target_voice) = match (source, target) {
            (Some(source), Some(target)) => (source, target),
            (source, target) => {
                let mut missing = Vec::new();
                if source.is_none() {
                    missing.push(fields::ENCRYPTED_SOURCE_AUDIO);
                }
                if target.is_none() {
                    missing.push(fields::ENCRYPTED_TARGET_VOICE);
                }
                return Err(ValidationError::MissingFields {
                    mode: Mode::Vc,
                    fields: missing,
                });
            }
        };

        Ok(Self {
            encrypted_source_audio,
            encrypted_target_voice,
            output_format: output_format(input)?,
        })
    }
}

/// A string field; absent, null and empty all read as `None`
fn optional_str<'a>(input: &'a JobInput, field: &'static str) -> Result<Option<&'a str>, ValidationError> {
    match input.get(field) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn output_format(input: &JobInput) -> Result<Option<AudioFormat>, ValidationError> {
    optional_str(input, fields::OUTPUT_FORMAT)?
        .map(|raw| {
            raw.parse::<AudioFormat>()
                .map_err(|_| ValidationError::UnsupportedFormat(raw.to_string()))
        })
        .transpose()
}
