//! Request-scoped audio buffers
//!
//! A [`ScopedAudio`] holds decrypted request audio for one pipeline step.
//! It is registered with an [`AudioLedger`] when acquired and released in
//! `Drop`, so the release happens on success, on early `?` returns and when
//! the request future is cancelled. Released samples are zeroed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zeroize::Zeroize;

use crate::encode::encode;
use crate::error::Result;
use crate::format::AudioFormat;
use crate::waveform::Waveform;

#[derive(Debug, Default)]
struct LedgerCounters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Counts scoped buffers handed out and released
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct AudioLedger {
    counters: Arc<LedgerCounters>,
}

impl AudioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a waveform for the current request step
    ///
    /// The waveform is also encoded as WAV, the transport form model
    /// backends accept. If encoding fails the buffer is released before
    /// the error is returned.
    pub fn scope(&self, waveform: Waveform) -> Result<ScopedAudio> {
        self.counters.acquired.fetch_add(1, Ordering::AcqRel);
        let mut scoped = ScopedAudio {
            waveform,
            wav: Vec::new(),
            ledger: self.clone(),
        };
        scoped.wav = encode(&scoped.waveform, AudioFormat::Wav)?;
        Ok(scoped)
    }

    /// Buffers acquired so far
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::Acquire)
    }

    /// Buffers released so far
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::Acquire)
    }

    /// Buffers currently alive
    pub fn open(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

/// Decoded request audio plus its WAV encoding, released on drop
pub struct ScopedAudio {
    waveform: Waveform,
    wav: Vec<u8>,
    ledger: AudioLedger,
}

impl ScopedAudio {
    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// The buffer encoded as 16-bit WAV
    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }

    pub fn sample_rate(&self) -> u32 {
        self.waveform.sample_rate()
    }
}

impl Drop for ScopedAudio {
    fn drop(&mut self) {
        self.waveform.samples.zeroize();
        self.wav.zeroize();
        self.ledger.counters.released.fetch_add(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for ScopedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedAudio")
            .field("frames", &self.waveform.frames())
            .field("channels", &self.waveform.channels())
            .field("sample_rate", &self.waveform.sample_rate())
            .field("wav_bytes", &self.wav.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;

    fn short_tone() -> Waveform {
        Waveform::mono((0..480).map(|i| (i as f32 / 12.0).sin() * 0.2).collect(), 24_000)
    }

    #[test]
    fn test_scope_and_release() {
        let ledger = AudioLedger::new();
        {
            let scoped = ledger.scope(short_tone()).unwrap();
            assert_eq!(ledger.open(), 1);
            assert_eq!(scoped.sample_rate(), 24_000);
            assert_eq!(&scoped.wav_bytes()[0..4], b"RIFF");
        }
        assert_eq!(ledger.acquired(), 1);
        assert_eq!(ledger.released(), 1);
        assert_eq!(ledger.open(), 0);
    }

    #[test]
    fn test_failed_scope_is_released() {
        let ledger = AudioLedger::new();
        let result = ledger.scope(Waveform::mono(Vec::new(), 24_000));
        assert!(matches!(result, Err(AudioError::Encode(_))));
        assert_eq!(ledger.acquired(), 1);
        assert_eq!(ledger.open(), 0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn step(ledger: &AudioLedger) -> std::result::Result<(), &'static str> {
            let _reference = ledger.scope(short_tone()).map_err(|_| "scope")?;
            Err("backend failed")
        }

        let ledger = AudioLedger::new();
        assert!(step(&ledger).is_err());
        assert_eq!(ledger.open(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let ledger = AudioLedger::new();
        let clone = ledger.clone();
        let scoped = clone.scope(short_tone()).unwrap();
        assert_eq!(ledger.open(), 1);
        drop(scoped);
        assert_eq!(ledger.open(), 0);
    }

    #[test]
    fn test_debug_omits_samples() {
        let ledger = AudioLedger::new();
        let scoped = ledger.scope(short_tone()).unwrap();
        let debug = format!("{:?}", scoped);
        assert!(debug.contains("frames: 480"));
        assert!(!debug.contains("0."));
    }
}
