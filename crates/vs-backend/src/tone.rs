//! Built-in tone generator
//!
//! Stands in for real models when the worker runs without an inference
//! server. Output length follows the input (text length for TTS, source
//! duration for VC) so the whole transport path is exercised.

use async_trait::async_trait;
use tracing::debug;
use vs_audio::Waveform;

use crate::backend::{TtsBackend, TtsInput, VcBackend, VcInput};
use crate::error::{BackendError, Result};

const SECONDS_PER_CHAR: f32 = 0.06;
const MIN_SECONDS: f32 = 0.25;
const AMPLITUDE: f32 = 0.3;
const FREQUENCY: f32 = 220.0;

/// Sine-wave backend for smoke tests and local runs
#[derive(Debug, Clone)]
pub struct ToneBackend {
    tts_sample_rate: u32,
    vc_sample_rate: u32,
}

impl ToneBackend {
    pub fn new(tts_sample_rate: u32, vc_sample_rate: u32) -> Self {
        Self {
            tts_sample_rate,
            vc_sample_rate,
        }
    }

    fn tone(&self, sample_rate: u32, seconds: f32) -> Result<Waveform> {
        if sample_rate == 0 {
            return Err(BackendError::Inference("sample rate is zero".to_string()));
        }
        let frames = (sample_rate as f32 * seconds.max(MIN_SECONDS)).round() as usize;
        let rate = sample_rate as f32;
        let samples = (0..frames)
            .map(|i| {
                let t = i as f32 / rate;
                (2.0 * std::f32::consts::PI * FREQUENCY * t).sin() * AMPLITUDE
            })
            .collect();
        Ok(Waveform::mono(samples, sample_rate))
    }
}

impl Default for ToneBackend {
    fn default() -> Self {
        Self::new(24_000, 24_000)
    }
}

#[async_trait]
impl TtsBackend for ToneBackend {
    fn name(&self) -> &str {
        "tone"
    }

    fn sample_rate(&self) -> u32 {
        self.tts_sample_rate
    }

    async fn generate(&self, input: TtsInput<'_>) -> Result<Waveform> {
        let chars = input.text.chars().count();
        debug!("Tone TTS for {} chars", chars);
        self.tone(self.tts_sample_rate, chars as f32 * SECONDS_PER_CHAR)
    }
}

#[async_trait]
impl VcBackend for ToneBackend {
    fn name(&self) -> &str {
        "tone"
    }

    fn sample_rate(&self) -> u32 {
        self.vc_sample_rate
    }

    async fn generate(&self, input: VcInput<'_>) -> Result<Waveform> {
        let seconds = input.source.waveform().duration_secs() as f32;
        debug!("Tone VC for {:.2}s of source audio", seconds);
        self.tone(self.vc_sample_rate, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationParams;
    use vs_audio::AudioLedger;

    #[tokio::test]
    async fn test_tts_length_follows_text() {
        let backend = ToneBackend::default();
        let input = TtsInput {
            text: "Hello world, this is a longer sentence.",
            language_id: "en",
            reference: None,
            params: GenerationParams::default(),
        };
        let waveform = TtsBackend::generate(&backend, input).await.unwrap();
        assert_eq!(waveform.sample_rate(), 24_000);
        assert!(waveform.duration_secs() > 2.0);
    }

    #[tokio::test]
    async fn test_tts_minimum_length() {
        let backend = ToneBackend::new(16_000, 16_000);
        let input = TtsInput {
            text: "",
            language_id: "en",
            reference: None,
            params: GenerationParams::default(),
        };
        let waveform = TtsBackend::generate(&backend, input).await.unwrap();
        assert_eq!(waveform.frames(), 4_000);
    }

    #[tokio::test]
    async fn test_vc_matches_source_duration() {
        let ledger = AudioLedger::new();
        let source = ledger.scope(Waveform::mono(vec![0.1; 16_000], 16_000)).unwrap();
        let target = ledger.scope(Waveform::mono(vec![0.1; 4_410], 44_100)).unwrap();

        let backend = ToneBackend::new(24_000, 22_050);
        let waveform = VcBackend::generate(
            &backend,
            VcInput {
                source: &source,
                target: &target,
            },
        )
        .await
        .unwrap();
        assert_eq!(waveform.sample_rate(), 22_050);
        assert_eq!(waveform.frames(), 22_050);
    }

    #[tokio::test]
    async fn test_zero_rate_is_inference_error() {
        let backend = ToneBackend::new(0, 0);
        let input = TtsInput {
            text: "Hi",
            language_id: "en",
            reference: None,
            params: GenerationParams::default(),
        };
        assert!(matches!(
            TtsBackend::generate(&backend, input).await,
            Err(BackendError::Inference(_))
        ));
    }
}
