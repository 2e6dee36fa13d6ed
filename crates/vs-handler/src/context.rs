//! Per-process worker state
//!
//! Built once at boot and shared by every job. Cloning is cheap: all heavy
//! members sit behind `Arc`.

use std::sync::Arc;

use vs_audio::{AudioFormat, AudioLedger};
use vs_backend::{Backends, GenerationParams, TtsBackend, VcBackend};
use vs_core::{Config, PayloadCipher};

/// Everything a job handler needs
#[derive(Clone)]
pub struct WorkerContext {
    cipher: Arc<PayloadCipher>,
    tts: Arc<dyn TtsBackend>,
    vc: Arc<dyn VcBackend>,
    ledger: AudioLedger,
    output_format: AudioFormat,
    params: GenerationParams,
}

impl WorkerContext {
    /// Create a context with default output format and generation parameters
    pub fn new(cipher: PayloadCipher, backends: Backends) -> Self {
        Self {
            cipher: Arc::new(cipher),
            tts: backends.tts,
            vc: backends.vc,
            ledger: AudioLedger::new(),
            output_format: AudioFormat::default(),
            params: GenerationParams::default(),
        }
    }

    /// Create a context from loaded configuration
    pub fn from_config(
        config: &Config,
        cipher: PayloadCipher,
        backends: Backends,
    ) -> vs_core::Result<Self> {
        let output_format = config
            .output
            .format
            .parse::<AudioFormat>()
            .map_err(|e| vs_core::Error::Config(e.to_string()))?;

        Ok(Self::new(cipher, backends)
            .with_output_format(output_format)
            .with_params(config.generation.into()))
    }

    /// Set the default output format
    pub fn with_output_format(mut self, format: AudioFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the TTS generation parameters
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Share an existing ledger (tests observe buffer release through it)
    pub fn with_ledger(mut self, ledger: AudioLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn cipher(&self) -> &PayloadCipher {
        &self.cipher
    }

    pub fn tts(&self) -> &dyn TtsBackend {
        self.tts.as_ref()
    }

    pub fn vc(&self) -> &dyn VcBackend {
        self.vc.as_ref()
    }

    pub fn ledger(&self) -> &AudioLedger {
        &self.ledger
    }

    pub fn output_format(&self) -> AudioFormat {
        self.output_format
    }

    pub fn params(&self) -> GenerationParams {
        self.params
    }
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("tts", &self.tts.name())
            .field("vc", &self.vc.name())
            .field("output_format", &self.output_format)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
