//! Backend client for RedBox.
//!
//! Provides:
//! - Password authentication with a security-answer check
//! - File record listing, upload, and download URLs
//! - Client-side file encryption (PBKDF2 + AES-256-GCM) swapped into the
//!   stored record in a single update
//! - Vault registration

pub mod api_client;
pub mod config;
pub mod encryption;
pub mod error;
pub mod in_flight;
pub mod passphrase;
pub mod store;
pub mod types;
pub mod vaults;

pub use api_client::RedBoxClient;
pub use config::CloudConfig;
pub use encryption::FileEncryptor;
pub use error::{CloudError, CloudResult};
pub use passphrase::{Passphrase, PassphraseSource};
pub use store::FileStore;
pub use types::*;
