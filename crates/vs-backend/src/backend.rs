//! Model capability traits
//!
//! Backends are built once at boot and shared read-only between concurrent
//! jobs, so every method takes `&self`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vs_audio::{ScopedAudio, Waveform};
use vs_core::GenerationConfig;

use crate::error::Result;

/// Sample rate the TTS model expects for its reference clip
pub const TTS_REFERENCE_RATE: u32 = 24_000;

/// Sample rate the VC model expects for its source clip
pub const VC_SOURCE_RATE: u32 = 16_000;

/// Sampling knobs passed to the TTS model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.8,
        }
    }
}

impl From<GenerationConfig> for GenerationParams {
    fn from(config: GenerationConfig) -> Self {
        Self {
            exaggeration: config.exaggeration,
            cfg_weight: config.cfg_weight,
            temperature: config.temperature,
        }
    }
}

/// One TTS generation request
#[derive(Clone, Copy)]
pub struct TtsInput<'a> {
    pub text: &'a str,
    pub language_id: &'a str,
    /// Voice prompt, already at [`TtsBackend::reference_rate`]
    pub reference: Option<&'a ScopedAudio>,
    pub params: GenerationParams,
}

impl std::fmt::Debug for TtsInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsInput")
            .field("text_chars", &self.text.chars().count())
            .field("language_id", &self.language_id)
            .field("reference", &self.reference)
            .field("params", &self.params)
            .finish()
    }
}

/// One voice conversion request
#[derive(Debug, Clone, Copy)]
pub struct VcInput<'a> {
    /// Speech to convert, already at [`VcBackend::source_rate`]
    pub source: &'a ScopedAudio,
    /// Voice to convert into, at its original rate
    pub target: &'a ScopedAudio,
}

/// Text-to-speech capability
#[async_trait]
pub trait TtsBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Native output sample rate
    fn sample_rate(&self) -> u32;

    fn reference_rate(&self) -> u32 {
        TTS_REFERENCE_RATE
    }

    async fn generate(&self, input: TtsInput<'_>) -> Result<Waveform>;
}

/// Voice conversion capability
#[async_trait]
pub trait VcBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Native output sample rate
    fn sample_rate(&self) -> u32;

    fn source_rate(&self) -> u32 {
        VC_SOURCE_RATE
    }

    async fn generate(&self, input: VcInput<'_>) -> Result<Waveform>;
}
