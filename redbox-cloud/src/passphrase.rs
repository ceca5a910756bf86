//! Passphrase capture capability.
//!
//! The workflow never prompts on its own; it asks a [`PassphraseSource`].
//! Front ends implement the trait with whatever input surface they have.
//! Any non-empty passphrase is accepted: there is no confirmation step and no
//! strength check.

use async_trait::async_trait;
use zeroize::Zeroizing;

/// A passphrase held in memory only for the duration of one call.
pub type Passphrase = Zeroizing<String>;

/// Source of passphrases for encrypting a file.
#[async_trait]
pub trait PassphraseSource: Send + Sync {
    /// Asks for a passphrase. `None` means the user cancelled.
    async fn request(&self, prompt: &str) -> Option<Passphrase>;
}

/// Returns the same passphrase every time. For scripted use and tests.
pub struct FixedPassphrase(Passphrase);

impl FixedPassphrase {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self(Zeroizing::new(passphrase.into()))
    }
}

#[async_trait]
impl PassphraseSource for FixedPassphrase {
    async fn request(&self, _prompt: &str) -> Option<Passphrase> {
        Some(self.0.clone())
    }
}

/// Always cancels.
pub struct CancelledPassphrase;

#[async_trait]
impl PassphraseSource for CancelledPassphrase {
    async fn request(&self, _prompt: &str) -> Option<Passphrase> {
        None
    }
}
