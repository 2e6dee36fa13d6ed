//! Payload encryption for job fields
//!
//! Tokens follow the Fernet layout so that any client holding the same
//! `ENCRYPTION_KEY` can seal and open payloads with a stock Fernet library:
//!
//! ```text
//! base64url( 0x80 | timestamp u64 BE | IV (16) | AES-128-CBC/PKCS7 ciphertext | HMAC-SHA256 (32) )
//! ```
//!
//! The 32-byte key splits into a signing half and an encryption half. The
//! MAC covers everything before it and is checked before any decryption.

use aes::Aes128;
use base64::{engine::general_purpose::URL_SAFE as BASE64_URL, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Environment variable holding the process-wide key
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";

const TOKEN_VERSION: u8 = 0x80;
const KEY_LEN: usize = 32;
const HALF_KEY_LEN: usize = KEY_LEN / 2;
const IV_LEN: usize = 16;
const MAC_LEN: usize = 32;
const BLOCK_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Encryption error types
///
/// `Authentication` is deliberately the only decrypt failure: a malformed
/// token, a flipped byte and a token sealed under another key all look the
/// same to the caller.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ENCRYPTION_KEY environment variable is required")]
    MissingKey,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid or tampered token")]
    Authentication,

    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8,

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Symmetric cipher for job payloads
///
/// Built once at process start and shared by every request.
pub struct PayloadCipher {
    signing_key: Zeroizing<[u8; HALF_KEY_LEN]>,
    encryption_key: Zeroizing<[u8; HALF_KEY_LEN]>,
}

impl PayloadCipher {
    /// Create a cipher from a url-safe base64 key of 32 bytes
    pub fn new(key: &str) -> CryptoResult<Self> {
        let decoded = Zeroizing::new(BASE64_URL.decode(key.trim()).map_err(|_| {
            CryptoError::InvalidKey("key is not url-safe base64".to_string())
        })?);

        if decoded.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must decode to {} bytes, got {}",
                KEY_LEN,
                decoded.len()
            )));
        }

        let mut signing_key = Zeroizing::new([0u8; HALF_KEY_LEN]);
        let mut encryption_key = Zeroizing::new([0u8; HALF_KEY_LEN]);
        signing_key.copy_from_slice(&decoded[..HALF_KEY_LEN]);
        encryption_key.copy_from_slice(&decoded[HALF_KEY_LEN..]);

        Ok(Self {
            signing_key,
            encryption_key,
        })
    }

    /// Create a cipher from the `ENCRYPTION_KEY` environment variable
    ///
    /// Fails with `MissingKey` when the variable is unset or blank, so a
    /// worker without a key never gets as far as accepting a job.
    pub fn from_env() -> CryptoResult<Self> {
        match std::env::var(ENCRYPTION_KEY_ENV) {
            Ok(key) => {
                let key = Zeroizing::new(key);
                if key.trim().is_empty() {
                    return Err(CryptoError::MissingKey);
                }
                Self::new(&key)
            }
            Err(_) => Err(CryptoError::MissingKey),
        }
    }

    /// Generate a fresh random key in the accepted encoding
    pub fn generate_key() -> String {
        let key = Zeroizing::new(rand::random::<[u8; KEY_LEN]>());
        BASE64_URL.encode(key.as_slice())
    }

    /// Seal raw bytes into a string-safe token
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<String> {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        let iv: [u8; IV_LEN] = rand::random();
        self.encrypt_with(plaintext, timestamp, &iv)
    }

    fn encrypt_with(&self, plaintext: &[u8], timestamp: u64, iv: &[u8; IV_LEN]) -> CryptoResult<String> {
        let ciphertext = Aes128CbcEnc::new_from_slices(self.encryption_key.as_slice(), iv)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + MAC_LEN);
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(iv);
        token.extend_from_slice(&ciphertext);

        let mut mac = self.mac().map_err(|e| CryptoError::Encryption(e.to_string()))?;
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());

        Ok(BASE64_URL.encode(&token))
    }

    /// Open a token produced by `encrypt` (or any Fernet implementation)
    pub fn decrypt(&self, token: &str) -> CryptoResult<Vec<u8>> {
        let data = BASE64_URL
            .decode(token.trim())
            .map_err(|_| CryptoError::Authentication)?;

        if data.len() < HEADER_LEN + BLOCK_LEN + MAC_LEN
            || data[0] != TOKEN_VERSION
            || (data.len() - HEADER_LEN - MAC_LEN) % BLOCK_LEN != 0
        {
            return Err(CryptoError::Authentication);
        }

        let (signed, tag) = data.split_at(data.len() - MAC_LEN);
        let mut mac = self.mac().map_err(|_| CryptoError::Authentication)?;
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| CryptoError::Authentication)?;

        let iv = &signed[HEADER_LEN - IV_LEN..HEADER_LEN];
        let ciphertext = &signed[HEADER_LEN..];

        Aes128CbcDec::new_from_slices(self.encryption_key.as_slice(), iv)
            .map_err(|_| CryptoError::Authentication)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Authentication)
    }

    /// Open a token whose payload is UTF-8 text
    pub fn decrypt_text(&self, token: &str) -> CryptoResult<SecureString> {
        let bytes = self.decrypt(token)?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(SecureString::new(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(CryptoError::InvalidUtf8)
            }
        }
    }

    fn mac(&self) -> Result<HmacSha256, hmac::digest::InvalidLength> {
        HmacSha256::new_from_slice(self.signing_key.as_slice())
    }
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}

/// Secure string holder that zeroizes on drop
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    /// Create a new secure string
    pub fn new(s: String) -> Self {
        Self(Zeroizing::new(s))
    }

    /// Get the string contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (safe to log)
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(<{} chars>)", self.char_count())
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}
