//! Test fixtures: fake backends and sealed inputs

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vs_audio::{AudioFormat, Waveform, encode};
use vs_backend::{
    BackendError, Backends, ToneBackend, TtsBackend, TtsInput, VcBackend, VcInput,
};
use vs_core::PayloadCipher;

use crate::context::WorkerContext;

/// Backend whose every call fails
pub(crate) struct FailingBackend;

#[async_trait]
impl TtsBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }

    async fn generate(&self, _input: TtsInput<'_>) -> vs_backend::Result<Waveform> {
        Err(BackendError::Inference("model crashed".to_string()))
    }
}

#[async_trait]
impl VcBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }

    async fn generate(&self, _input: VcInput<'_>) -> vs_backend::Result<Waveform> {
        Err(BackendError::Unavailable("inference server down".to_string()))
    }
}

/// Sample rates of the clips a backend was handed
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct SeenRates {
    pub reference: Option<u32>,
    pub source: Option<u32>,
    pub target: Option<u32>,
}

/// Tone backend that records what it receives and answers at 22.05 kHz
pub(crate) struct RecordingBackend {
    inner: ToneBackend,
    pub seen: Mutex<SeenRates>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            inner: ToneBackend::new(22_050, 22_050),
            seen: Mutex::new(SeenRates::default()),
        }
    }
}

#[async_trait]
impl TtsBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }

    async fn generate(&self, input: TtsInput<'_>) -> vs_backend::Result<Waveform> {
        self.seen.lock().unwrap().reference = input.reference.map(|r| r.sample_rate());
        TtsBackend::generate(&self.inner, input).await
    }
}

#[async_trait]
impl VcBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }

    async fn generate(&self, input: VcInput<'_>) -> vs_backend::Result<Waveform> {
        {
            let mut seen = self.seen.lock().unwrap();
            seen.source = Some(input.source.sample_rate());
            seen.target = Some(input.target.sample_rate());
        }
        VcBackend::generate(&self.inner, input).await
    }
}

fn cipher() -> PayloadCipher {
    PayloadCipher::new(&PayloadCipher::generate_key()).unwrap()
}

/// Context over the tone backend
pub(crate) fn context() -> WorkerContext {
    context_with(ToneBackend::default())
}

/// Context over a custom backend serving both modes
pub(crate) fn context_with<B>(backend: B) -> WorkerContext
where
    B: TtsBackend + VcBackend + 'static,
{
    context_with_arc(Arc::new(backend))
}

pub(crate) fn context_with_arc<B>(backend: Arc<B>) -> WorkerContext
where
    B: TtsBackend + VcBackend + 'static,
{
    WorkerContext::new(
        cipher(),
        Backends {
            tts: backend.clone(),
            vc: backend,
        },
    )
}

/// Encrypted WAV of a short tone
pub(crate) fn sealed_tone(ctx: &WorkerContext, rate: u32, frames: usize) -> String {
    let samples = (0..frames)
        .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 330.0 / rate as f32).sin() * 0.4)
        .collect();
    let wav = encode(&Waveform::mono(samples, rate), AudioFormat::Wav).unwrap();
    ctx.cipher().encrypt(&wav).unwrap()
}
