//! Mode dispatch
//!
//! Entry point for every job. Reads the declared mode, routes to the TTS or
//! VC handler and always answers with a [`JobResult`].

use std::time::Instant;

use serde_json::Value;
use tracing::{Instrument, info, info_span, warn};

use crate::context::WorkerContext;
use crate::error::HandlerError;
use crate::job::{Job, JobInput};
use crate::request::{Mode, fields};
use crate::result::JobResult;
use crate::{tts, vc};

/// Routes jobs to the handler for their mode
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: WorkerContext,
}

impl Dispatcher {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Handle a full job envelope `{ "id"?, "input": {...} }`
    pub async fn dispatch(&self, job: &Value) -> JobResult {
        match Job::from_value(job) {
            Ok(job) => self.run(job.id.as_deref(), &job.input).await,
            Err(e) => {
                warn!("Rejected job envelope: {}", e);
                HandlerError::from(e).into()
            }
        }
    }

    /// Handle a bare job input
    pub async fn dispatch_input(&self, input: &JobInput) -> JobResult {
        self.run(None, input).await
    }

    async fn run(&self, job_id: Option<&str>, input: &JobInput) -> JobResult {
        let span = info_span!("job", job_id = job_id.unwrap_or("-"), mode = tracing::field::Empty);

        async {
            let mode = match Mode::parse(input.get(fields::MODE)) {
                Ok(mode) => mode,
                Err(e) => {
                    warn!("{}", e);
                    return HandlerError::from(e).into();
                }
            };
            tracing::Span::current().record("mode", mode.as_str());

            info!("Job started with fields {:?}", input.field_names());
            let started = Instant::now();

            let result = match mode {
                Mode::Tts => tts::handle(&self.ctx, input).await,
                Mode::Vc => vc::handle(&self.ctx, input).await,
            };

            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                success = result.is_success(),
                "Job finished"
            );
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, context, context_with, sealed_tone};
    use serde_json::json;
    use vs_audio::decode;

    #[tokio::test]
    async fn test_dispatch_tts_end_to_end() {
        let dispatcher = Dispatcher::new(context());
        let cipher = dispatcher.context().cipher();
        let token = cipher.encrypt(b"Hello").unwrap();

        let result = dispatcher
            .dispatch(&json!({
                "id": "job-1",
                "input": {"encrypted_text": token, "language_id": "en"}
            }))
            .await;

        let JobResult::Success { encrypted_audio, .. } = result else {
            panic!("expected success, got {:?}", result);
        };
        let audio = decode(&cipher.decrypt(&encrypted_audio).unwrap()).unwrap();
        assert!(!audio.is_empty());
        assert_eq!(audio.sample_rate(), dispatcher.context().tts().sample_rate());
    }

    #[tokio::test]
    async fn test_dispatch_vc() {
        let dispatcher = Dispatcher::new(context());
        let ctx = dispatcher.context();
        let source = sealed_tone(ctx, 16_000, 16_000);
        let target = sealed_tone(ctx, 22_050, 22_050);

        let result = dispatcher
            .dispatch(&json!({
                "input": {
                    "mode": "VC",
                    "encrypted_source_audio": source,
                    "encrypted_target_voice": target,
                }
            }))
            .await;
        assert!(result.is_success(), "{:?}", result);
        assert_eq!(ctx.ledger().open(), 0);
    }

    #[tokio::test]
    async fn test_unknown_mode() {
        let dispatcher = Dispatcher::new(context());
        let result = dispatcher
            .dispatch(&json!({"input": {"mode": "bogus"}}))
            .await;
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "Unknown mode 'bogus'", "available_modes": ["tts", "vc"]})
        );
    }

    #[tokio::test]
    async fn test_missing_mode_defaults_to_tts() {
        let dispatcher = Dispatcher::new(context());
        let result = dispatcher.dispatch(&json!({"input": {}})).await;
        assert_eq!(
            result.error_message(),
            Some("TTS mode requires 'encrypted_text' and 'language_id'")
        );
    }

    #[tokio::test]
    async fn test_envelope_without_input() {
        let dispatcher = Dispatcher::new(context());
        let result = dispatcher.dispatch(&json!({"id": "job-2"})).await;
        assert_eq!(result.error_message(), Some("Job is missing its 'input' object"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_a_result() {
        let dispatcher = Dispatcher::new(context_with(FailingBackend));
        let token = dispatcher.context().cipher().encrypt(b"Hello").unwrap();
        let input: JobInput =
            serde_json::from_value(json!({"encrypted_text": token, "language_id": "en"})).unwrap();

        let result = dispatcher.dispatch_input(&input).await;
        assert_eq!(result.error_message(), Some("TTS generation failed"));
    }

    #[test]
    fn test_jobs_share_context() {
        let dispatcher = Dispatcher::new(context());
        let cipher = dispatcher.context().cipher();
        let jobs: Vec<Value> = ["one", "two", "three"]
            .iter()
            .map(|text| {
                json!({"input": {
                    "encrypted_text": cipher.encrypt(text.as_bytes()).unwrap(),
                    "language_id": "en",
                }})
            })
            .collect();

        let results = tokio_test::block_on(async {
            let mut results = Vec::new();
            for job in &jobs {
                results.push(dispatcher.clone().dispatch(job).await);
            }
            results
        });

        assert!(results.iter().all(JobResult::is_success));
        assert_eq!(dispatcher.context().ledger().open(), 0);
    }
}
