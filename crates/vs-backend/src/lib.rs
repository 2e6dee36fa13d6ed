//! vs-backend: model backends for voxseal
//!
//! The TTS and VC models are opaque capabilities behind [`TtsBackend`] and
//! [`VcBackend`]. Two implementations ship with the worker:
//!
//! - **[`RemoteBackend`]**: HTTP client for an inference server hosting the models
//! - **[`ToneBackend`]**: sine generator for smoke tests without model weights
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vs_backend::{from_config, TtsInput, GenerationParams};
//!
//! let backends = from_config(&config.backend)?;
//! let waveform = backends.tts.generate(TtsInput {
//!     text: "Hello",
//!     language_id: "en",
//!     reference: None,
//!     params: GenerationParams::default(),
//! }).await?;
//! ```

pub mod backend;
pub mod error;
pub mod remote;
pub mod tone;

use std::sync::Arc;

use vs_core::{BackendConfig, BackendKind};

pub use backend::{
    GenerationParams, TTS_REFERENCE_RATE, TtsBackend, TtsInput, VC_SOURCE_RATE, VcBackend, VcInput,
};
pub use error::{BackendError, Result};
pub use remote::RemoteBackend;
pub use tone::ToneBackend;

/// The pair of model capabilities a worker serves
#[derive(Clone)]
pub struct Backends {
    pub tts: Arc<dyn TtsBackend>,
    pub vc: Arc<dyn VcBackend>,
}

/// Build the configured backends once, at boot
pub fn from_config(config: &BackendConfig) -> Result<Backends> {
    match config.kind {
        BackendKind::Remote => {
            let remote = Arc::new(RemoteBackend::new(config)?);
            Ok(Backends {
                tts: remote.clone(),
                vc: remote,
            })
        }
        BackendKind::Tone => {
            let tone = Arc::new(ToneBackend::new(config.tts_sample_rate, config.vc_sample_rate));
            Ok(Backends {
                tts: tone.clone(),
                vc: tone,
            })
        }
    }
}
