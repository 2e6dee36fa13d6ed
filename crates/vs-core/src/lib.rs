//! vs-core: voxseal core library
//!
//! Worker configuration, the core error type and the payload cipher that
//! seals every audio/text field crossing the job boundary.

pub mod config;
pub mod crypto;
pub mod error;

pub use config::{ApiConfig, BackendConfig, BackendKind, Config, GenerationConfig, OutputConfig};
pub use crypto::{CryptoError, CryptoResult, PayloadCipher, SecureString, ENCRYPTION_KEY_ENV};
pub use error::{Error, Result};
