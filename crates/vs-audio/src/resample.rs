//! Sample-rate conversion
//!
//! Single resampling path for the worker. Channel count is preserved, the
//! resampler's own delay is trimmed, and the output length is the input
//! length scaled by the rate ratio (rounded to the nearest frame).

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::error::{AudioError, Result};
use crate::waveform::Waveform;

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Highest rate accepted on either side of a conversion
///
/// Decoded headers are caller-controlled and rubato sizes its filters from
/// the rates, so anything above this is refused before allocation.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Resample a waveform to `target_rate`
///
/// Returns the input untouched when it is already at `target_rate`.
pub fn resample(waveform: Waveform, target_rate: u32) -> Result<Waveform> {
    let source_rate = waveform.sample_rate();
    let valid = |rate: u32| rate > 0 && rate <= MAX_SAMPLE_RATE;
    if !valid(source_rate) || !valid(target_rate) {
        return Err(AudioError::Resample(format!(
            "invalid rate conversion {} Hz -> {} Hz",
            source_rate, target_rate
        )));
    }
    if source_rate == target_rate {
        return Ok(waveform);
    }

    let channels = waveform.channels() as usize;
    let frames = waveform.frames();
    let expected = expected_frames(frames, source_rate, target_rate);

    if frames == 0 {
        return Waveform::new(Vec::new(), waveform.channels(), target_rate);
    }

    let planar = waveform.to_planar();
    drop(waveform);

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK,
        SUB_CHUNKS,
        channels,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let wanted = expected + delay;
    let mut out: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(wanted + CHUNK))
        .collect();

    let mut pos = 0;
    while frames - pos >= resampler.input_frames_next() {
        let n = resampler.input_frames_next();
        let block: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + n]).collect();
        let produced = resampler
            .process(&block, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append(&mut out, produced);
        pos += n;
    }

    if pos < frames {
        let block: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let produced = resampler
            .process_partial(Some(block.as_slice()), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append(&mut out, produced);
    }

    // Flush the delay line until every expected frame has come out
    while out[0].len() < wanted {
        let produced = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if produced.first().is_none_or(Vec::is_empty) {
            break;
        }
        append(&mut out, produced);
    }

    for channel in out.iter_mut() {
        let skip = delay.min(channel.len());
        channel.drain(..skip);
        channel.resize(expected, 0.0);
    }

    debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        frames, source_rate, expected, target_rate
    );

    Ok(Waveform::from_planar(&out, target_rate))
}

fn expected_frames(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    let source = source_rate as u64;
    ((frames as u64 * target_rate as u64 + source / 2) / source) as usize
}

fn append(out: &mut [Vec<f32>], produced: Vec<Vec<f32>>) {
    for (channel, block) in out.iter_mut().zip(produced) {
        channel.extend_from_slice(&block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, freq: f32, frames: usize) -> Waveform {
        let samples = (0..frames)
            .map(|i| (i as f32 * freq * 2.0 * std::f32::consts::PI / rate as f32).sin() * 0.5)
            .collect();
        Waveform::mono(samples, rate)
    }

    #[test]
    fn test_same_rate_is_identity() {
        let wf = sine(24_000, 440.0, 1_000);
        let out = resample(wf.clone(), 24_000).unwrap();
        assert_eq!(out, wf);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let wf = sine(24_000, 440.0, 100);
        assert!(matches!(resample(wf, 0), Err(AudioError::Resample(_))));

        let silent = Waveform::mono(vec![0.0; 10], 0);
        assert!(matches!(resample(silent, 16_000), Err(AudioError::Resample(_))));
    }

    #[test]
    fn test_extreme_rate_rejected() {
        let forged = Waveform::mono(vec![0.1; 64], 2_147_483_647);
        assert!(matches!(resample(forged, 16_000), Err(AudioError::Resample(_))));

        let wf = sine(16_000, 440.0, 64);
        assert!(matches!(resample(wf, 1_000_003), Err(AudioError::Resample(_))));

        let highest = Waveform::mono(vec![0.1; 3_840], MAX_SAMPLE_RATE);
        assert_eq!(resample(highest, 16_000).unwrap().frames(), 160);
    }

    #[test]
    fn test_downsample_frame_count() {
        let out = resample(sine(44_100, 440.0, 44_100), 16_000).unwrap();
        assert_eq!(out.sample_rate(), 16_000);
        assert_eq!(out.frames(), 16_000);
    }

    #[test]
    fn test_round_trip_preserves_duration() {
        let original = sine(44_100, 440.0, 30_000);
        let down = resample(original.clone(), 24_000).unwrap();
        let back = resample(down, 44_100).unwrap();

        let diff = back.frames() as i64 - original.frames() as i64;
        assert!(diff.abs() <= 1, "frame count drifted by {}", diff);
    }

    #[test]
    fn test_preserves_channels() {
        let samples: Vec<f32> = (0..4_800).flat_map(|i| {
            let s = (i as f32 / 10.0).sin() * 0.3;
            [s, -s]
        }).collect();
        let wf = Waveform::new(samples, 2, 48_000).unwrap();

        let out = resample(wf, 16_000).unwrap();
        assert_eq!(out.channels(), 2);
        assert_eq!(out.frames(), 1_600);
    }

    #[test]
    fn test_signal_survives_resampling() {
        let out = resample(sine(16_000, 200.0, 16_000), 24_000).unwrap();
        let rms = (out.samples().iter().map(|s| s * s).sum::<f32>() / out.samples().len() as f32).sqrt();
        // 0.5 amplitude sine has RMS of ~0.354
        assert!(rms > 0.25 && rms < 0.45, "unexpected rms {}", rms);
    }

    #[test]
    fn test_short_input() {
        let out = resample(sine(22_050, 440.0, 10), 16_000).unwrap();
        assert_eq!(out.frames(), 7);
    }
}
