//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. environment variables
//! 2. `voxseal.toml` (or the file named by `VOXSEAL_CONFIG`)
//! 3. defaults
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.
//!
//! The encryption key is not part of `Config`; it is read once by
//! [`crate::PayloadCipher::from_env`] and never leaves the cipher.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "voxseal.toml";

/// Where model inference runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Inference server reached over HTTP
    #[default]
    Remote,
    /// Built-in tone generator (smoke tests without model weights)
    Tone,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "remote" | "http" => Some(Self::Remote),
            "tone" => Some(Self::Tone),
            _ => None,
        }
    }
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Inference server base URL
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token for the inference server
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds (generation can take a while)
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,

    /// Native output rate of the TTS model
    #[serde(default = "default_tts_sample_rate")]
    pub tts_sample_rate: u32,

    /// Native output rate of the VC model
    #[serde(default = "default_vc_sample_rate")]
    pub vc_sample_rate: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_backend_url(),
            api_key: None,
            timeout_secs: default_backend_timeout(),
            tts_sample_rate: default_tts_sample_rate(),
            vc_sample_rate: default_vc_sample_rate(),
        }
    }
}

/// Fixed TTS generation controls, passed through to the model unchanged
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,
    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            exaggeration: default_exaggeration(),
            cfg_weight: default_cfg_weight(),
            temperature: default_temperature(),
        }
    }
}

/// Output audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Container used when a job does not ask for one ("wav" or "mp3")
    #[serde(default = "default_output_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for the job endpoints
    #[serde(skip_serializing)]
    pub key: Option<String>,

    /// Port for the HTTP server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Main configuration for the voxseal worker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_backend_timeout() -> u64 {
    300
}

fn default_tts_sample_rate() -> u32 {
    24_000
}

fn default_vc_sample_rate() -> u32 {
    24_000
}

fn default_exaggeration() -> f32 {
    0.5
}

fn default_cfg_weight() -> f32 {
    0.5
}

fn default_temperature() -> f32 {
    0.8
}

fn default_output_format() -> String {
    "wav".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

impl Config {
    /// Expand `${VAR_NAME}` references from the environment
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;

        Ok(cfg)
    }

    fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);
        toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load from `VOXSEAL_CONFIG`, `./voxseal.toml`, or the environment only
    pub fn load() -> crate::Result<Self> {
        if let Ok(path) = std::env::var("VOXSEAL_CONFIG") {
            if !path.is_empty() {
                return Self::from_toml_file(path);
            }
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override settings with any environment variables that are set
    fn apply_env_overrides(&mut self) -> crate::Result<()> {
        if let Some(kind) = non_empty_env("BACKEND_KIND") {
            self.backend.kind = BackendKind::parse(&kind)
                .ok_or_else(|| Error::Config(format!("Unknown BACKEND_KIND: {}", kind)))?;
        }
        if let Some(url) = non_empty_env("BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(key) = non_empty_env("BACKEND_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(secs) = parse_env("BACKEND_TIMEOUT_SECS")? {
            self.backend.timeout_secs = secs;
        }
        if let Some(rate) = parse_env("TTS_SAMPLE_RATE")? {
            self.backend.tts_sample_rate = rate;
        }
        if let Some(rate) = parse_env("VC_SAMPLE_RATE")? {
            self.backend.vc_sample_rate = rate;
        }

        if let Some(v) = parse_env("TTS_EXAGGERATION")? {
            self.generation.exaggeration = v;
        }
        if let Some(v) = parse_env("TTS_CFG_WEIGHT")? {
            self.generation.cfg_weight = v;
        }
        if let Some(v) = parse_env("TTS_TEMPERATURE")? {
            self.generation.temperature = v;
        }

        if let Some(format) = non_empty_env("OUTPUT_FORMAT") {
            self.output.format = format.to_lowercase();
        }

        if let Some(key) = non_empty_env("API_KEY") {
            self.api.key = Some(key);
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.api.port = port;
        }
        if let Some(limit) = parse_env("API_MAX_BODY_BYTES")? {
            self.api.max_body_bytes = limit;
        }

        Ok(())
    }

    fn validate(&self) -> crate::Result<()> {
        if self.backend.tts_sample_rate == 0 || self.backend.vc_sample_rate == 0 {
            return Err(Error::Config("sample rates must be positive".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend timeout must be positive".to_string()));
        }
        if self.backend.kind == BackendKind::Remote && self.backend.base_url.trim().is_empty() {
            return Err(Error::Config("backend base_url is required".to_string()));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> crate::Result<Option<T>> {
    match non_empty_env(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {}: {}", name, raw))),
        None => Ok(None),
    }
}
