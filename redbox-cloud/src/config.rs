//! Backend client configuration.

use crate::error::{CloudError, CloudResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the RedBox backend client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:8090").
    pub base_url: String,

    /// Auth collection holding user accounts.
    pub users_collection: String,

    /// Collection holding file records.
    pub files_collection: String,

    /// Collection holding vault records.
    pub vaults_collection: String,

    /// Timeout for ordinary API requests (seconds).
    pub request_timeout_secs: u64,

    /// Timeout for fetching a stored file before encryption (seconds).
    pub fetch_timeout_secs: u64,

    /// Timeout for the record update that commits an encryption (seconds).
    pub persist_timeout_secs: u64,

    /// PBKDF2 iteration count for newly encrypted files.
    pub kdf_iterations: u32,

    /// Records requested per page when listing a collection.
    pub page_size: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            users_collection: "users".to_string(),
            files_collection: "file_info".to_string(),
            vaults_collection: "vaults".to_string(),
            request_timeout_secs: 30,
            fetch_timeout_secs: 30,
            persist_timeout_secs: 30,
            kdf_iterations: 100_000,
            page_size: 500,
        }
    }
}

impl CloudConfig {
    /// Default configuration pointed at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Rejects values that would make the client unusable.
    pub fn validate(&self) -> CloudResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(CloudError::Config("base_url must not be empty".to_string()));
        }
        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("persist_timeout_secs", self.persist_timeout_secs),
        ] {
            if value == 0 {
                return Err(CloudError::Config(format!("{name} must be non-zero")));
            }
        }
        if self.kdf_iterations == 0 {
            return Err(CloudError::Config("kdf_iterations must be non-zero".to_string()));
        }
        if self.page_size == 0 {
            return Err(CloudError::Config("page_size must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_secs(self.persist_timeout_secs)
    }
}
