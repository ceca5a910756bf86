//! Backend client and file encryption error types.

use thiserror::Error;

/// Result type for backend operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur talking to the backend or encrypting a file.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file {0} is already encrypted")]
    AlreadyEncrypted(String),

    #[error("could not fetch file for encryption: {0}")]
    FetchFailed(String),

    #[error("encryption failed: {0}")]
    CryptoFailure(String),

    #[error("could not save encrypted file: {0}")]
    PersistFailed(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot create duplicate vaults")]
    DuplicateVaults,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CloudError {
    /// True for errors the user can fix themselves (bad input, a file that
    /// is already encrypted, wrong credentials) as opposed to connectivity
    /// or backend failures.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            CloudError::InvalidInput(_)
                | CloudError::AlreadyEncrypted(_)
                | CloudError::AuthRequired
                | CloudError::AuthFailed(_)
                | CloudError::DuplicateVaults
        )
    }
}

impl From<redbox_crypto::CryptoError> for CloudError {
    fn from(e: redbox_crypto::CryptoError) -> Self {
        CloudError::CryptoFailure(e.to_string())
    }
}
