//! Injectable crypto capability.
//!
//! Consumers (the file encryption workflow) depend on
//! `Arc<dyn CryptoProvider>` instead of calling the random source and the
//! cipher directly. `OsCryptoProvider` is the production implementation;
//! tests substitute deterministic or failing providers.

use crate::cipher::{self, Iv, IV_SIZE};
use crate::error::CryptoResult;
use crate::key::{self, fill_random, DerivedKey, KdfParams, Salt, SALT_SIZE};

/// Stateless source of randomness, key derivation, and sealing.
pub trait CryptoProvider: Send + Sync {
    /// Returns `len` bytes from a cryptographically secure source.
    fn random_bytes(&self, len: usize) -> CryptoResult<Vec<u8>>;

    /// Derives a 256-bit key from a passphrase and salt.
    fn derive_key(&self, passphrase: &str, salt: &Salt, params: &KdfParams)
        -> CryptoResult<DerivedKey>;

    /// Seals `plaintext`, returning ciphertext with the tag appended.
    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Fresh salt drawn from [`random_bytes`](Self::random_bytes).
    fn generate_salt(&self) -> CryptoResult<Salt> {
        Salt::from_slice(&self.random_bytes(SALT_SIZE)?)
    }

    /// Fresh IV drawn from [`random_bytes`](Self::random_bytes).
    fn generate_iv(&self) -> CryptoResult<Iv> {
        Iv::from_slice(&self.random_bytes(IV_SIZE)?)
    }
}

/// PBKDF2 + AES-256-GCM backed by the operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsCryptoProvider;

impl CryptoProvider for OsCryptoProvider {
    fn random_bytes(&self, len: usize) -> CryptoResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        fill_random(&mut buf)?;
        Ok(buf)
    }

    fn derive_key(
        &self,
        passphrase: &str,
        salt: &Salt,
        params: &KdfParams,
    ) -> CryptoResult<DerivedKey> {
        key::derive_key(passphrase, salt, params)
    }

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::encrypt(key, iv, plaintext)
    }
}
