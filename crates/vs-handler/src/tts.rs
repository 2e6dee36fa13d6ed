//! Text-to-speech jobs

use tracing::{info, warn};
use vs_backend::TtsInput;

use crate::context::WorkerContext;
use crate::error::{HandlerError, Result, Stage};
use crate::job::JobInput;
use crate::request::TtsRequest;
use crate::result::JobResult;
use crate::transport::{open_audio, seal_waveform};

/// Run one TTS job; every failure becomes an error result
pub async fn handle(ctx: &WorkerContext, input: &JobInput) -> JobResult {
    match run(ctx, input).await {
        Ok(result) => result,
        Err(e) => {
            warn!(stage = ?e.stage(), "TTS job failed: {}", e);
            e.into()
        }
    }
}

async fn run(ctx: &WorkerContext, input: &JobInput) -> Result<JobResult> {
    let request = TtsRequest::from_input(input)?;
    let backend = ctx.tts();

    let text = ctx
        .cipher()
        .decrypt_text(request.encrypted_text)
        .map_err(|e| HandlerError::crypto(Stage::DecryptText, e))?;
    info!(
        "Text decrypted: {} chars, language {}",
        text.char_count(),
        request.language_id
    );

    let waveform = {
        let reference = request
            .encrypted_reference_audio
            .map(|token| {
                open_audio(
                    ctx,
                    token,
                    Some(backend.reference_rate()),
                    Stage::ReferenceAudio,
                    Stage::ReferenceAudio,
                )
            })
            .transpose()?;

        backend
            .generate(TtsInput {
                text: text.as_str(),
                language_id: request.language_id,
                reference: reference.as_ref(),
                params: ctx.params(),
            })
            .await
            .map_err(|e| HandlerError::backend(Stage::TtsGeneration, e))?
    };
    drop(text);

    let format = request.output_format.unwrap_or(ctx.output_format());
    info!(
        "Generated {:.2}s with {} backend, encoding as {}",
        waveform.duration_secs(),
        backend.name(),
        format
    );

    let encrypted_audio = seal_waveform(ctx, waveform, backend.sample_rate(), format)?;
    Ok(JobResult::success(encrypted_audio, format))
}
