//! In-memory PCM representation

use crate::error::{AudioError, Result};

/// Decoded audio: interleaved `f32` samples in `[-1.0, 1.0]`
///
/// `Debug` prints shape only, never samples.
#[derive(Clone, PartialEq)]
pub struct Waveform {
    pub(crate) samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from interleaved samples
    ///
    /// The sample count must be a whole number of frames.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidWaveform("channel count must be positive".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::InvalidWaveform(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a single-channel waveform
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Split into one buffer per channel
    pub(crate) fn to_planar(&self) -> Vec<Vec<f32>> {
        let channels = self.channels as usize;
        let mut planar = vec![Vec::with_capacity(self.frames()); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (channel, sample) in planar.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        planar
    }

    /// Rebuild from per-channel buffers of equal length
    pub(crate) fn from_planar(planar: &[Vec<f32>], sample_rate: u32) -> Self {
        let channels = planar.len().max(1);
        let frames = planar.first().map(Vec::len).unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for channel in planar {
                samples.push(channel[i]);
            }
        }
        Self {
            samples,
            channels: channels as u16,
            sample_rate,
        }
    }
}

impl std::fmt::Debug for Waveform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waveform")
            .field("frames", &self.frames())
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
