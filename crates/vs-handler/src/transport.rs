//! Sealed audio in and out of the worker
//!
//! Inbound: decrypt → decode → resample → scope.
//! Outbound: resample → encode → encrypt.
//! Intermediate plaintext buffers are wiped when they go out of scope.

use tracing::debug;
use vs_audio::{AudioFormat, ScopedAudio, Waveform, decode, encode, resample};
use zeroize::{Zeroize, Zeroizing};

use crate::context::WorkerContext;
use crate::error::{HandlerError, Result, Stage};

/// Open an encrypted audio field as a scoped buffer
///
/// `target_rate` of `None` keeps the clip at its own rate.
pub(crate) fn open_audio(
    ctx: &WorkerContext,
    token: &str,
    target_rate: Option<u32>,
    decrypt_stage: Stage,
    process_stage: Stage,
) -> Result<ScopedAudio> {
    let bytes = Zeroizing::new(
        ctx.cipher()
            .decrypt(token)
            .map_err(|e| HandlerError::crypto(decrypt_stage, e))?,
    );

    let waveform = decode(&bytes).map_err(|e| HandlerError::audio(process_stage, e))?;
    drop(bytes);

    let source_rate = waveform.sample_rate();
    let waveform = match target_rate {
        Some(rate) => resample(waveform, rate).map_err(|e| HandlerError::audio(process_stage, e))?,
        None => waveform,
    };

    debug!(
        "Opened audio: {:.2}s, {} ch, {} Hz -> {} Hz",
        waveform.duration_secs(),
        waveform.channels(),
        source_rate,
        waveform.sample_rate()
    );

    ctx.ledger()
        .scope(waveform)
        .map_err(|e| HandlerError::audio(process_stage, e))
}

/// Encode generated audio at `native_rate` and encrypt it
pub(crate) fn seal_waveform(
    ctx: &WorkerContext,
    waveform: Waveform,
    native_rate: u32,
    format: AudioFormat,
) -> Result<String> {
    let waveform =
        resample(waveform, native_rate).map_err(|e| HandlerError::audio(Stage::Output, e))?;

    let encoded = encode(&waveform, format).map(Zeroizing::new);
    waveform.into_samples().zeroize();
    let encoded = encoded.map_err(|e| HandlerError::audio(Stage::Output, e))?;

    let sealed = ctx
        .cipher()
        .encrypt(&encoded)
        .map_err(|e| HandlerError::crypto(Stage::Output, e))?;

    debug!(
        "Sealed {} bytes of {} audio at {} Hz",
        encoded.len(),
        format,
        native_rate
    );

    Ok(sealed)
}
