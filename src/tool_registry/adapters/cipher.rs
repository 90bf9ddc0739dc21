//! Encryption of MCP server credentials at rest.
//!
//! Sealed credentials are stored as a JSON string `enc:<base64>`, where the
//! payload is a random 96-bit nonce followed by the AES-256-GCM ciphertext of
//! the credential object. Stored objects without the prefix are read as
//! plaintext.

use crate::tool_registry::domain::McpCredentials;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Marker prefix of sealed credential values.
pub const ENCRYPTED_PREFIX: &str = "enc:";

const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32;

/// Errors raised while sealing or opening credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialCipherError {
    /// The configured key is not 32 bytes of standard base64.
    #[error("credentials key must be {KEY_LENGTH} bytes encoded as base64")]
    InvalidKey,
    /// Encryption failed.
    #[error("failed to encrypt credentials")]
    Seal,
    /// The stored value could not be decrypted with the configured key.
    #[error("failed to decrypt credentials")]
    Open,
    /// A sealed value was read without a configured key.
    #[error("credentials are encrypted but no key is configured")]
    MissingKey,
    /// The stored value has neither the sealed nor the plaintext shape.
    #[error("malformed stored credentials: {0}")]
    Malformed(String),
}

/// AES-256-GCM cipher for credential maps.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Builds a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialCipherError::InvalidKey`] when the key does not
    /// decode to exactly 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CredentialCipherError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CredentialCipherError::InvalidKey)?;
        if key.len() != KEY_LENGTH {
            return Err(CredentialCipherError::InvalidKey);
        }
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| CredentialCipherError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Encrypts `credentials` into their stored form.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialCipherError::Seal`] when encryption fails.
    pub fn seal(&self, credentials: &McpCredentials) -> Result<Value, CredentialCipherError> {
        let plaintext = serde_json::to_vec(credentials)
            .map_err(|err| CredentialCipherError::Malformed(err.to_string()))?;
        let mut nonce = [0_u8; NONCE_LENGTH];
        rand::rng().fill(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| CredentialCipherError::Seal)?;

        let mut payload = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(Value::String(format!(
            "{ENCRYPTED_PREFIX}{}",
            STANDARD.encode(payload)
        )))
    }

    /// Restores credentials from their stored form.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialCipherError::Open`] when a sealed value fails to
    /// decrypt and [`CredentialCipherError::Malformed`] for any other shape
    /// that is not a credential object.
    pub fn open(&self, stored: Value) -> Result<McpCredentials, CredentialCipherError> {
        let Some(sealed) = sealed_payload(&stored) else {
            return read_plaintext(stored);
        };
        let payload = STANDARD
            .decode(sealed)
            .map_err(|err| CredentialCipherError::Malformed(err.to_string()))?;
        let (nonce, ciphertext) = payload
            .split_at_checked(NONCE_LENGTH)
            .ok_or_else(|| CredentialCipherError::Malformed("payload too short".to_owned()))?;
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialCipherError::Open)?;
        serde_json::from_slice(&plaintext)
            .map_err(|err| CredentialCipherError::Malformed(err.to_string()))
    }
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("CredentialCipher").finish_non_exhaustive()
    }
}

/// Returns the base64 payload when `stored` is a sealed value.
#[must_use]
pub(crate) fn sealed_payload(stored: &Value) -> Option<&str> {
    stored.as_str()?.strip_prefix(ENCRYPTED_PREFIX)
}

/// Reads credentials stored without encryption.
///
/// # Errors
///
/// Returns [`CredentialCipherError::Malformed`] when `stored` is not a
/// credential object.
pub(crate) fn read_plaintext(stored: Value) -> Result<McpCredentials, CredentialCipherError> {
    serde_json::from_value(stored).map_err(|err| CredentialCipherError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

    fn credentials() -> McpCredentials {
        McpCredentials::new([("GITHUB_TOKEN".to_owned(), "ghp_secret".to_owned())])
            .expect("valid credentials")
    }

    #[test]
    fn sealed_credentials_hide_values_and_open_again() {
        let cipher = CredentialCipher::from_base64_key(KEY).expect("valid key");

        let stored = cipher.seal(&credentials()).expect("credentials seal");

        let rendered = stored.to_string();
        assert!(rendered.starts_with("\"enc:"));
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("GITHUB_TOKEN"));
        assert_eq!(cipher.open(stored).expect("credentials open"), credentials());
    }

    #[test]
    fn plaintext_objects_are_still_readable() {
        let cipher = CredentialCipher::from_base64_key(KEY).expect("valid key");

        let opened = cipher
            .open(json!({ "GITHUB_TOKEN": "ghp_secret" }))
            .expect("plaintext opens");

        assert_eq!(opened, credentials());
    }

    #[test]
    fn a_different_key_cannot_open_sealed_credentials() {
        let sealing = CredentialCipher::from_base64_key(KEY).expect("valid key");
        let other = CredentialCipher::from_base64_key(&STANDARD.encode([7_u8; KEY_LENGTH]))
            .expect("valid key");

        let stored = sealing.seal(&credentials()).expect("credentials seal");

        assert_eq!(other.open(stored), Err(CredentialCipherError::Open));
    }

    #[test]
    fn short_keys_are_rejected() {
        let short = STANDARD.encode([1_u8; 16]);

        assert!(matches!(
            CredentialCipher::from_base64_key(&short),
            Err(CredentialCipherError::InvalidKey)
        ));
    }
}
