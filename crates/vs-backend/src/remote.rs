//! Inference-server backend
//!
//! Talks to an HTTP server hosting the TTS and VC models:
//! - `POST {base}/tts` with text, language and an optional base64 WAV prompt
//! - `POST {base}/vc` with base64 WAV source and target clips
//!
//! Both endpoints answer with encoded audio in any container the codec
//! adapter can probe. Replies are resampled to the configured native rate.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info};
use vs_audio::{Waveform, decode, resample};
use vs_core::BackendConfig;

use crate::backend::{GenerationParams, TtsBackend, TtsInput, VcBackend, VcInput};
use crate::error::{BackendError, Result};

const ERROR_PREVIEW_BYTES: usize = 256;

#[derive(Serialize)]
struct TtsRequestBody<'a> {
    text: &'a str,
    language_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_audio_b64: Option<String>,
    #[serde(flatten)]
    params: GenerationParams,
}

#[derive(Serialize)]
struct VcRequestBody {
    source_audio_b64: String,
    target_voice_b64: String,
}

/// HTTP client for a model inference server
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tts_sample_rate: u32,
    vc_sample_rate: u32,
}

impl RemoteBackend {
    /// Build the client once; it is reused for every job
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Remote backend at {} (tts {} Hz, vc {} Hz)",
            config.base_url, config.tts_sample_rate, config.vc_sample_rate
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            tts_sample_rate: config.tts_sample_rate,
            vc_sample_rate: config.vc_sample_rate,
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B, native_rate: u32) -> Result<Waveform> {
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                BackendError::Unavailable(format!("{}: {}", url, e))
            } else {
                BackendError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            // The body may echo the request, so it only reaches debug logs
            debug!("{} failed with {}: {}", path, status, error_preview(response).await);
            let message = format!("API error {}", status.as_u16());
            return Err(if status == StatusCode::SERVICE_UNAVAILABLE {
                BackendError::Unavailable(message)
            } else {
                BackendError::Inference(message)
            });
        }

        let audio_data = response.bytes().await?;
        debug!("{} returned {} bytes", path, audio_data.len());

        let waveform = decode(&audio_data).map_err(|e| BackendError::InvalidOutput(e.to_string()))?;
        let waveform =
            resample(waveform, native_rate).map_err(|e| BackendError::InvalidOutput(e.to_string()))?;

        info!(
            "{} complete: {:.2}s at {} Hz",
            path,
            waveform.duration_secs(),
            waveform.sample_rate()
        );

        Ok(waveform)
    }
}

/// First bytes of an error body, read without buffering the rest
async fn error_preview(mut response: Response) -> String {
    let mut body = Vec::new();
    while body.len() < ERROR_PREVIEW_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            _ => break,
        }
    }
    body.truncate(ERROR_PREVIEW_BYTES);
    String::from_utf8_lossy(&body).into_owned()
}

#[async_trait]
impl TtsBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn sample_rate(&self) -> u32 {
        self.tts_sample_rate
    }

    async fn generate(&self, input: TtsInput<'_>) -> Result<Waveform> {
        info!(
            "Synthesizing speech: {} chars, language {}, reference: {}",
            input.text.chars().count(),
            input.language_id,
            input.reference.is_some()
        );

        let body = TtsRequestBody {
            text: input.text,
            language_id: input.language_id,
            reference_audio_b64: input.reference.map(|r| STANDARD.encode(r.wav_bytes())),
            params: input.params,
        };

        self.post("tts", &body, self.tts_sample_rate).await
    }
}

#[async_trait]
impl VcBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn sample_rate(&self) -> u32 {
        self.vc_sample_rate
    }

    async fn generate(&self, input: VcInput<'_>) -> Result<Waveform> {
        info!(
            "Converting voice: source {:.2}s, target {:.2}s",
            input.source.waveform().duration_secs(),
            input.target.waveform().duration_secs()
        );

        let body = VcRequestBody {
            source_audio_b64: STANDARD.encode(input.source.wav_bytes()),
            target_voice_b64: STANDARD.encode(input.target.wav_bytes()),
        };

        self.post("vc", &body, self.vc_sample_rate).await
    }
}
