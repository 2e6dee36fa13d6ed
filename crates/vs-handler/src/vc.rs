//! Voice conversion jobs

use tracing::{info, warn};
use vs_backend::VcInput;

use crate::context::WorkerContext;
use crate::error::{HandlerError, Result, Stage};
use crate::job::JobInput;
use crate::request::VcRequest;
use crate::result::JobResult;
use crate::transport::{open_audio, seal_waveform};

/// Run one VC job; every failure becomes an error result
pub async fn handle(ctx: &WorkerContext, input: &JobInput) -> JobResult {
    match run(ctx, input).await {
        Ok(result) => result,
        Err(e) => {
            warn!(stage = ?e.stage(), "VC job failed: {}", e);
            e.into()
        }
    }
}

async fn run(ctx: &WorkerContext, input: &JobInput) -> Result<JobResult> {
    let request = VcRequest::from_input(input)?;
    let backend = ctx.vc();

    let waveform = {
        let source = open_audio(
            ctx,
            request.encrypted_source_audio,
            Some(backend.source_rate()),
            Stage::DecryptSource,
            Stage::ProcessSource,
        )?;
        let target = open_audio(
            ctx,
            request.encrypted_target_voice,
            None,
            Stage::DecryptTarget,
            Stage::ProcessTarget,
        )?;

        info!(
            "Converting {:.2}s of source audio toward a {:.2}s target voice",
            source.waveform().duration_secs(),
            target.waveform().duration_secs()
        );

        backend
            .generate(VcInput {
                source: &source,
                target: &target,
            })
            .await
            .map_err(|e| HandlerError::backend(Stage::VoiceConversion, e))?
    };

    let format = request.output_format.unwrap_or(ctx.output_format());
    info!(
        "Converted {:.2}s with {} backend, encoding as {}",
        waveform.duration_secs(),
        backend.name(),
        format
    );

    let encrypted_audio = seal_waveform(ctx, waveform, backend.sample_rate(), format)?;
    Ok(JobResult::success(encrypted_audio, format))
}
