//! In-memory encoding to transport containers

use std::io::Cursor;

use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm};
use tracing::debug;

use crate::error::{AudioError, Result};
use crate::format::AudioFormat;
use crate::waveform::Waveform;

/// Encode a waveform into `format`
pub fn encode(waveform: &Waveform, format: AudioFormat) -> Result<Vec<u8>> {
    if waveform.is_empty() {
        return Err(AudioError::Encode("waveform has no samples".to_string()));
    }
    if waveform.sample_rate() == 0 {
        return Err(AudioError::Encode("waveform has no sample rate".to_string()));
    }

    let bytes = match format {
        AudioFormat::Wav => encode_wav(waveform)?,
        AudioFormat::Mp3 => encode_mp3(waveform)?,
    };

    debug!(
        "Encoded {} frames at {} Hz as {}: {} bytes",
        waveform.frames(),
        waveform.sample_rate(),
        format,
        bytes.len()
    );

    Ok(bytes)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: waveform.channels(),
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + waveform.samples().len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::Encode(format!("wav header: {}", e)))?;
        for &sample in waveform.samples() {
            writer
                .write_sample(to_i16(sample))
                .map_err(|e| AudioError::Encode(format!("wav write: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(format!("wav finalize: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

fn encode_mp3(waveform: &Waveform) -> Result<Vec<u8>> {
    let channels = waveform.channels();
    if channels > 2 {
        return Err(AudioError::Encode(format!(
            "mp3 supports at most 2 channels, got {}",
            channels
        )));
    }

    let mut builder = Builder::new()
        .ok_or_else(|| AudioError::Encode("failed to initialise LAME".to_string()))?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| AudioError::Encode(format!("mp3 channels: {:?}", e)))?;
    builder
        .set_sample_rate(waveform.sample_rate())
        .map_err(|e| AudioError::Encode(format!("mp3 sample rate: {:?}", e)))?;
    builder
        .set_brate(Bitrate::Kbps128)
        .map_err(|e| AudioError::Encode(format!("mp3 bitrate: {:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| AudioError::Encode(format!("mp3 init: {:?}", e)))?;

    let pcm: Vec<i16> = waveform.samples().iter().map(|&s| to_i16(s)).collect();
    let frames = waveform.frames();

    // The *_to_vec calls write into spare capacity only
    let mut out: Vec<u8> = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));

    if channels == 1 {
        encoder.encode_to_vec(MonoPcm(pcm.as_slice()), &mut out)
    } else {
        let (left, right): (Vec<i16>, Vec<i16>) =
            pcm.chunks_exact(2).map(|frame| (frame[0], frame[1])).unzip();
        encoder.encode_to_vec(
            DualPcm {
                left: left.as_slice(),
                right: right.as_slice(),
            },
            &mut out,
        )
    }
    .map_err(|e| AudioError::Encode(format!("mp3 encode: {:?}", e)))?;

    out.reserve(mp3lame_encoder::max_required_buffer_size(0));
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| AudioError::Encode(format!("mp3 flush: {:?}", e)))?;

    Ok(out)
}
