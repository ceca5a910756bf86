//! AES-256-GCM sealing of file bytes.
//!
//! The ciphertext layout is the raw AES-GCM output: encrypted bytes followed
//! by the 16-byte authentication tag. The IV is not embedded; it is stored
//! separately on the file record.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{fill_random, DerivedKey};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

/// Size of the AES-GCM initialization vector in bytes.
pub const IV_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// AES-GCM initialization vector.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Generates a fresh random IV.
    pub fn random() -> CryptoResult<Self> {
        let mut bytes = [0u8; IV_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; IV_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: IV_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(format!("iv: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iv").field(&self.to_base64()).finish()
    }
}

fn cipher_for(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypts `plaintext` under `key` with `iv`.
///
/// Returns ciphertext with the authentication tag appended, so the output is
/// always `plaintext.len() + TAG_SIZE` bytes.
pub fn encrypt(key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    cipher_for(key)
        .encrypt(Nonce::from_slice(iv.as_bytes()), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))
}

/// Decrypts output of [`encrypt`]. Fails on a wrong key, wrong IV, or any
/// modification of the ciphertext or tag.
pub fn decrypt(key: &DerivedKey, iv: &Iv, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }

    cipher_for(key)
        .decrypt(Nonce::from_slice(iv.as_bytes()), ciphertext)
        .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))
}
