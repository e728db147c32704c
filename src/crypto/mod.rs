//! Mapping cryptography
//!
//! Builds the plaintext id-to-original table and seals it with
//! AES-256-GCM. The 256-bit key is obtained from an external
//! [`KeyProvider`] at call time and is never cached; the plaintext table's
//! lifetime is scoped strictly to the encryption call. Decryption verifies
//! the authentication tag and fails closed - it never returns truncated or
//! corrupted plaintext.

use crate::domain::{RehideError, Result};
use crate::models::Entity;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use zeroize::Zeroize;

/// AES-256-GCM parameters
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Plaintext mapping from `TYPE:id` keys to original substrings
///
/// A `BTreeMap` so serialization has a stable key ordering.
pub type PiiMap = BTreeMap<String, String>;

/// Encrypted mapping store
///
/// Wire shape: three base64-encoded fields `ciphertext`, `iv`, `authTag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedMap {
    /// Ciphertext without the authentication tag
    #[serde(with = "base64_serde")]
    pub ciphertext: Vec<u8>,
    /// 96-bit initialization vector, fresh per encryption
    #[serde(with = "base64_serde")]
    pub iv: Vec<u8>,
    /// 128-bit GCM authentication tag
    #[serde(with = "base64_serde")]
    pub auth_tag: Vec<u8>,
}

/// External key custody collaborator
///
/// Returns the 256-bit key on demand. Rehide uses the key only for the
/// duration of one encrypt/decrypt operation and retains nothing.
pub trait KeyProvider: Send + Sync {
    /// Obtain the current 256-bit key
    fn encryption_key(&self) -> Result<Secret<[u8; 32]>>;
}

/// Key provider wrapping a fixed in-memory key
///
/// For callers that already hold a key, and for tests. Real deployments
/// should implement [`KeyProvider`] against their key custody mechanism.
pub struct StaticKeyProvider {
    key: Secret<[u8; 32]>,
}

impl StaticKeyProvider {
    /// Wrap a fixed 256-bit key
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Secret::new(key),
        }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn encryption_key(&self) -> Result<Secret<[u8; 32]>> {
        Ok(Secret::new(*self.key.expose_secret()))
    }
}

/// Build the plaintext mapping for a rendered entity list
///
/// One entry per placeholder key; with id reuse enabled, repeated values
/// share a key and therefore a single entry.
pub fn build_map(entities: &[Entity], original_text: &str) -> PiiMap {
    let mut map = PiiMap::new();
    for entity in entities {
        if let Some(value) = original_text.get(entity.start..entity.end) {
            map.insert(entity.map_key(), value.to_string());
        }
    }
    map
}

/// Encrypt a plaintext mapping with a key from the provider
pub fn encrypt_map(map: &PiiMap, keys: &Arc<dyn KeyProvider>) -> Result<EncryptedMap> {
    let mut plaintext = serde_json::to_vec(map)?;
    let key = keys.encryption_key()?;

    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|e| RehideError::Encryption(e.to_string()))?;

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the tag to the ciphertext; split it off for the
    // detached wire shape
    let mut sealed = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|_| RehideError::Encryption("AEAD encryption failed".to_string()))?;
    plaintext.zeroize();
    let auth_tag = sealed.split_off(sealed.len() - TAG_LEN);

    Ok(EncryptedMap {
        ciphertext: sealed,
        iv: iv.to_vec(),
        auth_tag,
    })
}

/// Decrypt an encrypted mapping with a key from the provider
///
/// # Errors
///
/// Returns [`RehideError::InvalidKeyOrCorruptedMap`] on any key mismatch
/// or tampering, including malformed iv/tag lengths.
pub fn decrypt_map(encrypted: &EncryptedMap, keys: &Arc<dyn KeyProvider>) -> Result<PiiMap> {
    if encrypted.iv.len() != IV_LEN || encrypted.auth_tag.len() != TAG_LEN {
        return Err(RehideError::InvalidKeyOrCorruptedMap);
    }

    let key = keys.encryption_key()?;
    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|_| RehideError::InvalidKeyOrCorruptedMap)?;

    let nonce = Nonce::from_slice(&encrypted.iv);
    let mut sealed = encrypted.ciphertext.clone();
    sealed.extend_from_slice(&encrypted.auth_tag);

    let mut plaintext = cipher
        .decrypt(nonce, sealed.as_slice())
        .map_err(|_| RehideError::InvalidKeyOrCorruptedMap)?;

    let map = serde_json::from_slice(&plaintext).map_err(|_| RehideError::InvalidKeyOrCorruptedMap);
    plaintext.zeroize();
    map
}

/// Base64 serialization helpers
mod base64_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
