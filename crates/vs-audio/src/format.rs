//! Output container formats

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Audio container produced by [`crate::encode`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 16-bit PCM WAV
    #[default]
    Wav,
    /// MPEG-1/2 Layer III
    Mp3,
}

impl AudioFormat {
    /// All formats the encoder can produce
    pub const ALL: [AudioFormat; 2] = [AudioFormat::Wav, AudioFormat::Mp3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wav" | "wave" => Ok(Self::Wav),
            "mp3" | "mpeg" => Ok(Self::Mp3),
            other => Err(AudioError::UnsupportedFormat(other.to_string())),
        }
    }
}
