//! Client-side encryption of a stored file.
//!
//! Fetches the plaintext blob, seals it under a key derived from the user's
//! passphrase, and swaps the ciphertext into the record together with the
//! salt and IV in one update. A record moves `Plaintext → Encrypted` once and
//! never back; there is no automatic retry anywhere in this flow.

use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::in_flight::InFlightRegistry;
use crate::passphrase::PassphraseSource;
use crate::store::FileStore;
use crate::types::*;
use redbox_crypto::{CryptoProvider, CryptoResult, KdfParams};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use zeroize::Zeroizing;

/// Extension given to the sealed blob.
pub const ENCRYPTED_EXTENSION: &str = ".enc";

/// Ciphertext plus the metadata needed to reverse it.
struct Sealed {
    ciphertext: Vec<u8>,
    salt: String,
    iv: String,
}

/// Encrypts stored files in place.
pub struct FileEncryptor {
    store: Arc<dyn FileStore>,
    crypto: Arc<dyn CryptoProvider>,
    in_flight: InFlightRegistry,
    kdf: KdfParams,
    fetch_timeout: Duration,
    persist_timeout: Duration,
}

impl FileEncryptor {
    pub fn new(
        store: Arc<dyn FileStore>,
        crypto: Arc<dyn CryptoProvider>,
        config: &CloudConfig,
    ) -> Self {
        Self {
            store,
            crypto,
            in_flight: InFlightRegistry::new(),
            kdf: KdfParams {
                iterations: config.kdf_iterations,
            },
            fetch_timeout: config.fetch_timeout(),
            persist_timeout: config.persist_timeout(),
        }
    }

    /// Per-record locks held by running encryptions.
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Asks `source` for a passphrase, then encrypts.
    ///
    /// A cancelled or empty prompt is `InvalidInput`. The record is checked
    /// before prompting so an already encrypted file never triggers a prompt.
    pub async fn encrypt_with_prompt(
        &self,
        record: &FileRecord,
        source: &dyn PassphraseSource,
    ) -> CloudResult<EncryptedFile> {
        Self::check_record(record)?;

        let passphrase = source
            .request("Enter a strong passphrase to encrypt this file:")
            .await
            .ok_or_else(|| CloudError::InvalidInput("passphrase prompt cancelled".to_string()))?;

        self.encrypt(record, &passphrase).await
    }

    /// Encrypts `record`'s stored blob with a key derived from `passphrase`.
    ///
    /// Fails without any network call on an empty passphrase, a missing
    /// record, or a record that is already encrypted. On any later failure
    /// the stored record is left exactly as it was.
    pub async fn encrypt(&self, record: &FileRecord, passphrase: &str) -> CloudResult<EncryptedFile> {
        Self::check_record(record)?;
        if passphrase.is_empty() {
            return Err(CloudError::InvalidInput("passphrase must not be empty".to_string()));
        }

        let _guard = self.in_flight.acquire(&record.id).await;
        debug!("encrypting file {}", record.id);

        let plaintext = Zeroizing::new(
            with_timeout(self.fetch_timeout, self.store.fetch_blob(record))
                .await
                .map_err(|e| CloudError::FetchFailed(e.to_string()))?,
        );
        let plaintext_len = plaintext.len();

        // Key derivation and sealing are CPU-bound; keep them off the runtime.
        let crypto = Arc::clone(&self.crypto);
        let kdf = self.kdf;
        let passphrase = Zeroizing::new(passphrase.to_string());
        let sealed = tokio::task::spawn_blocking(move || {
            seal(crypto.as_ref(), &kdf, &passphrase, &plaintext)
        })
        .await
        .map_err(|e| CloudError::CryptoFailure(format!("encryption task failed: {e}")))?
        .map_err(CloudError::from)
        .inspect_err(|e| error!("encryption of file {} failed: {e}", record.id))?;

        let upload = EncryptedUpload {
            file_name: format!("{}{ENCRYPTED_EXTENSION}", record.file_name),
            ciphertext: sealed.ciphertext,
            salt: sealed.salt,
            iv: sealed.iv,
        };
        let ciphertext_len = upload.ciphertext.len();

        // A racing call may have committed while we were sealing.
        let current = match with_timeout(self.persist_timeout, self.store.get_file(&record.id)).await {
            Ok(current) => current,
            Err(CloudError::NotFound(what)) => {
                return Err(CloudError::InvalidInput(format!("missing record: {what}")));
            }
            Err(e) => return Err(CloudError::PersistFailed(e.to_string())),
        };
        if current.is_encrypted {
            return Err(CloudError::AlreadyEncrypted(record.id.clone()));
        }

        let updated = with_timeout(
            self.persist_timeout,
            self.store.commit_encryption(&record.id, upload),
        )
        .await
        .map_err(|e| CloudError::PersistFailed(e.to_string()))?;

        info!(
            "encrypted file {} ({plaintext_len} bytes -> {ciphertext_len} bytes)",
            record.id
        );

        Ok(EncryptedFile {
            display_name: format!("{}{ENCRYPTED_SUFFIX}", record.file_name),
            record: updated,
        })
    }

    fn check_record(record: &FileRecord) -> CloudResult<()> {
        if record.id.is_empty() || record.stored_file_name.is_empty() {
            return Err(CloudError::InvalidInput("missing file record".to_string()));
        }
        if record.state() == FileState::Encrypted {
            return Err(CloudError::AlreadyEncrypted(record.id.clone()));
        }
        Ok(())
    }
}

/// Fresh salt and IV, key derivation, AES-256-GCM. The derived key is
/// zeroized when this returns.
fn seal(
    crypto: &dyn CryptoProvider,
    kdf: &KdfParams,
    passphrase: &str,
    plaintext: &[u8],
) -> CryptoResult<Sealed> {
    let salt = crypto.generate_salt()?;
    let iv = crypto.generate_iv()?;
    let key = crypto.derive_key(passphrase, &salt, kdf)?;
    let ciphertext = crypto.encrypt(&key, &iv, plaintext)?;

    Ok(Sealed {
        ciphertext,
        salt: salt.to_base64(),
        iv: iv.to_base64(),
    })
}

/// Runs `fut`, turning an elapsed deadline into an error naming the limit.
async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = CloudResult<T>>,
) -> CloudResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| CloudError::Api(format!("timed out after {limit:?}")))?
}
