//! The record-store seam used by the encryption workflow.
//!
//! [`RedBoxClient`](crate::api_client::RedBoxClient) is the HTTP
//! implementation. Tests can substitute an in-memory store.

use crate::error::CloudResult;
use crate::types::{EncryptedUpload, FileRecord};
use async_trait::async_trait;

/// Record and blob operations needed to encrypt a stored file.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Current state of a file record.
    async fn get_file(&self, id: &str) -> CloudResult<FileRecord>;

    /// Raw bytes of the record's stored blob.
    async fn fetch_blob(&self, record: &FileRecord) -> CloudResult<Vec<u8>>;

    /// Replaces the blob and sets `is_encrypted`, `salt`, `iv` in a single
    /// update. Either all of it lands or none of it does.
    async fn commit_encryption(
        &self,
        record_id: &str,
        upload: EncryptedUpload,
    ) -> CloudResult<FileRecord>;
}
