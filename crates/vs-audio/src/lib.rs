//! vs-audio: audio codec adapter for voxseal
//!
//! Turns arbitrary encoded audio into a uniform in-memory [`Waveform`],
//! converts it between sample rates, and encodes it back into a transport
//! container. Every step is a single in-memory pass; there is no streaming.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vs_audio::{decode, encode, resample, AudioFormat};
//!
//! let waveform = decode(&bytes)?;              // container auto-detected
//! let waveform = resample(waveform, 16_000)?;  // no-op when already 16 kHz
//! let wav = encode(&waveform, AudioFormat::Wav)?;
//! ```
//!
//! Buffers that hold request audio for the length of a pipeline step are
//! wrapped in [`ScopedAudio`], which reports to an [`AudioLedger`] and wipes
//! its samples when dropped.

pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod resample;
pub mod scoped;
pub mod waveform;

pub use decode::decode;
pub use encode::encode;
pub use error::{AudioError, Result};
pub use format::AudioFormat;
pub use resample::resample;
pub use scoped::{AudioLedger, ScopedAudio};
pub use waveform::Waveform;
