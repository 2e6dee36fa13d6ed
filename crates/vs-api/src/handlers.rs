//! HTTP API handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use vs_handler::JobResult;

use crate::error::Result;
use crate::server::AppState;

/// Status reported for every finished job
pub const COMPLETED: &str = "COMPLETED";

/// Job response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub id: String,
    pub status: String,
    pub output: JobResult,
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Run a job and wait for its output
pub async fn runsync(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<RunResponse>> {
    run_job(&state, body).await
}

/// Run a job; processed inline, same reply shape as `/runsync`
pub async fn run(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<RunResponse>> {
    run_job(&state, body).await
}

async fn run_job(
    state: &AppState,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<RunResponse>> {
    let Json(mut job) = body?;

    let id = job_id(&job);
    if let Some(envelope) = job.as_object_mut() {
        envelope.insert("id".to_string(), Value::String(id.clone()));
    }
    debug!("Accepted job {}", id);

    let output = state.dispatcher.dispatch(&job).await;
    info!("Job {} completed (success: {})", id, output.is_success());

    Ok(Json(RunResponse {
        id,
        status: COMPLETED.to_string(),
        output,
    }))
}

/// Caller-supplied id, or a fresh one
fn job_id(job: &Value) -> String {
    match job.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use http::{Request, StatusCode, header};
    use serde_json::json;
    use tower::ServiceExt;
    use vs_backend::{Backends, ToneBackend};
    use vs_core::PayloadCipher;
    use vs_handler::{Dispatcher, WorkerContext};

    use crate::server::router;

    fn dispatcher() -> Dispatcher {
        let tone = Arc::new(ToneBackend::default());
        let cipher = PayloadCipher::new(&PayloadCipher::generate_key()).unwrap();
        Dispatcher::new(WorkerContext::new(
            cipher,
            Backends {
                tts: tone.clone(),
                vc: tone,
            },
        ))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::new(dispatcher(), Some("secret".to_string())), 1024);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_runsync_success() {
        let dispatcher = dispatcher();
        let token = dispatcher.context().cipher().encrypt(b"Hello").unwrap();
        let app = router(AppState::new(dispatcher, None), 1 << 20);

        let response = app
            .oneshot(post(
                "/runsync",
                json!({"id": "abc", "input": {"encrypted_text": token, "language_id": "en"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "abc");
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["output"]["status"], "success");
        assert_eq!(body["output"]["format"], "wav");
    }

    #[tokio::test]
    async fn test_run_assigns_id_and_reports_errors_in_output() {
        let app = router(AppState::new(dispatcher(), None), 1 << 20);

        let response = app
            .oneshot(post("/run", json!({"input": {"mode": "bogus"}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(!body["id"].as_str().unwrap().is_empty());
        assert_eq!(
            body["output"],
            json!({"error": "Unknown mode 'bogus'", "available_modes": ["tts", "vc"]})
        );
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let app = router(AppState::new(dispatcher(), Some("secret".to_string())), 1 << 20);

        let response = app
            .clone()
            .oneshot(post("/runsync", json!({"input": {}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = post("/runsync", json!({"input": {}}));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let app = router(AppState::new(dispatcher(), None), 1 << 20);
        let request = Request::builder()
            .method("POST")
            .uri("/runsync")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let app = router(AppState::new(dispatcher(), None), 64);
        let response = app
            .oneshot(post("/runsync", json!({"input": {"encrypted_text": "x".repeat(512)}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_job_id() {
        assert_eq!(job_id(&json!({"id": "given"})), "given");
        assert_eq!(job_id(&json!({"id": 7})), "7");
        assert_eq!(job_id(&json!({"id": ""})).len(), 36);
        assert_eq!(job_id(&json!({})).len(), 36);
    }
}
