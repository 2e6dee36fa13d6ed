//! voxseal: encrypted TTS / voice-conversion worker
//!
//! Usage:
//!   voxseal                        - Start the job runner (HTTP)
//!   voxseal --test-input '<json>'  - Run one job and print its result
//!   voxseal --help                 - Show help

use std::process::ExitCode;

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use vs_core::{Config, PayloadCipher};
use vs_handler::{Dispatcher, WorkerContext};

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// HTTP job runner
    Server,
    /// Run a single job given on the command line
    TestInput(String),
    /// Show help
    Help,
    /// Show version
    Version,
    /// Bad arguments
    Usage(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        RunMode::Version => {
            println!("voxseal {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        RunMode::Usage(message) => {
            eprintln!("voxseal: {}", message);
            eprintln!("Try 'voxseal --help'");
            return ExitCode::from(2);
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    match run(mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mode: RunMode) -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    let dispatcher = build_dispatcher(&config)?;

    match mode {
        RunMode::TestInput(json) => run_test_input(&dispatcher, &json).await,
        _ => run_server(&config, dispatcher).await,
    }
}

/// Parse command line arguments
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> RunMode {
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            "--test-input" | "-t" => {
                return match args.next() {
                    Some(json) => RunMode::TestInput(json),
                    None => RunMode::Usage("--test-input requires a JSON argument".to_string()),
                };
            }
            other => {
                if let Some(json) = other.strip_prefix("--test-input=") {
                    return RunMode::TestInput(json.to_string());
                }
                return RunMode::Usage(format!("unknown argument '{}'", other));
            }
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("voxseal - encrypted TTS / voice-conversion worker");
    println!();
    println!("Usage:");
    println!("  voxseal                        Start the job runner (POST /runsync, /run)");
    println!("  voxseal --test-input '<json>'  Run one job and print the JSON result");
    println!("  voxseal --help                 Show this help message");
    println!("  voxseal --version              Show version");
    println!();
    println!("Environment Variables:");
    println!("  ENCRYPTION_KEY        Payload key, url-safe base64 of 32 bytes (required)");
    println!("  VOXSEAL_CONFIG        TOML config file (default: ./voxseal.toml if present)");
    println!("  BACKEND_KIND          remote or tone (default: remote)");
    println!("  BACKEND_URL           Inference server URL (default: http://127.0.0.1:8001)");
    println!("  BACKEND_API_KEY       Bearer key for the inference server");
    println!("  BACKEND_TIMEOUT_SECS  Inference request timeout (default: 300)");
    println!("  TTS_SAMPLE_RATE       TTS model output rate (default: 24000)");
    println!("  VC_SAMPLE_RATE        VC model output rate (default: 24000)");
    println!("  TTS_EXAGGERATION      Generation exaggeration (default: 0.5)");
    println!("  TTS_CFG_WEIGHT        Generation cfg weight (default: 0.5)");
    println!("  TTS_TEMPERATURE       Generation temperature (default: 0.8)");
    println!("  OUTPUT_FORMAT         wav or mp3 (default: wav)");
    println!("  API_PORT              Job runner port (default: 8000)");
    println!("  API_KEY               Bearer key for job routes (optional)");
    println!("  API_MAX_BODY_BYTES    Request body limit (default: 64 MiB)");
    println!("  RUST_LOG              Log filter (default: info)");
}

/// Build the cipher, warm the backends and wire the dispatcher
///
/// A missing or malformed key stops the worker here, before any job is
/// accepted.
fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let cipher = PayloadCipher::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to initialise payload cipher: {}", e))?;

    let backends = vs_backend::from_config(&config.backend)
        .map_err(|e| anyhow::anyhow!("Failed to create model backends: {}", e))?;
    tracing::info!(
        "Backends ready: tts={} ({} Hz), vc={} ({} Hz)",
        backends.tts.name(),
        backends.tts.sample_rate(),
        backends.vc.name(),
        backends.vc.sample_rate()
    );

    let ctx = WorkerContext::from_config(config, cipher, backends)
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    tracing::info!("Default output format: {}", ctx.output_format());

    Ok(Dispatcher::new(ctx))
}

/// Run one job from the command line and print its result
async fn run_test_input(dispatcher: &Dispatcher, json: &str) -> anyhow::Result<()> {
    let job = test_job(json)?;
    let result = dispatcher.dispatch(&job).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Accept either a full envelope or a bare input object
fn test_job(json: &str) -> anyhow::Result<Value> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| anyhow::anyhow!("Invalid --test-input JSON: {}", e))?;

    if value.get("input").is_some() {
        Ok(value)
    } else {
        Ok(serde_json::json!({ "id": "test-input", "input": value }))
    }
}

/// Run the HTTP job runner until Ctrl+C
async fn run_server(config: &Config, dispatcher: Dispatcher) -> anyhow::Result<()> {
    let api_config = config.api.clone();
    let port = api_config.port;

    let handle = tokio::spawn(async move {
        if let Err(e) = vs_api::start_server(&api_config, dispatcher).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });
    let abort = handle.abort_handle();
    tracing::info!("voxseal initialized, job runner on port {}", port);
    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");
            abort.abort();
        }
        joined = handle => {
            joined?;
            anyhow::bail!("job runner stopped unexpectedly");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
