//! Encryption layer for RedBox.
//!
//! Provides passphrase-based file encryption using:
//! - PBKDF2-HMAC-SHA256 for key derivation from passphrases
//! - AES-256-GCM for authenticated encryption
//! - Secure key handling with zeroization
//!
//! # Architecture
//!
//! There is a single key tier. Every encryption call generates a fresh
//! 16-byte salt and 12-byte IV, derives a 256-bit key from the passphrase
//! and salt, and seals the file bytes. The salt and IV are stored next to
//! the ciphertext (base64) so the passphrase is the only secret needed to
//! reverse the operation.
//!
//! Callers that want to stay testable depend on [`CryptoProvider`] rather
//! than on the free functions; [`OsCryptoProvider`] wires the provider to
//! the operating system's random source.

mod cipher;
mod error;
mod key;
pub mod provider;

pub use cipher::{decrypt, encrypt, Iv, IV_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use provider::{CryptoProvider, OsCryptoProvider};
