//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types.
//! Callers can distinguish a cryptographic failure (wrong key, tampered
//! ciphertext) from every other condition, including "no PII detected",
//! which is never an error.

use thiserror::Error;

/// Main Rehide error type
#[derive(Debug, Error)]
pub enum RehideError {
    /// Configuration-related errors (empty required field, invalid threshold)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A custom or denylist pattern failed to compile
    #[error("Pattern error in '{name}': {message}")]
    Pattern { name: String, message: String },

    /// Inference provider failure surfaced to the caller
    ///
    /// The anonymization pipeline never raises this itself - inference
    /// failures degrade to regex-only results. It exists for callers that
    /// invoke a provider directly.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Authenticated decryption failed: wrong key or tampered data.
    ///
    /// Deliberately carries no detail beyond the distinction itself, so a
    /// failed tag check can never be confused with an empty map.
    #[error("Invalid key or corrupted map")]
    InvalidKeyOrCorruptedMap,

    /// Encryption could not be performed (malformed key material)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RehideError {
    fn from(err: serde_json::Error) -> Self {
        RehideError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for RehideError {
    fn from(err: toml::de::Error) -> Self {
        RehideError::Configuration(format!("TOML parse error: {err}"))
    }
}
