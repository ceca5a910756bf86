//! HTTP client for the RedBox backend.
//!
//! The backend exposes a collection-oriented record API
//! (`/api/collections/{collection}/records`) and a file endpoint
//! (`/api/files/{collection_id}/{record_id}/{file}`). This client handles
//! password authentication, paging through owner-filtered listings, and the
//! multipart create/update calls that carry file blobs.

use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::store::FileStore;
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Content type used for sealed blobs.
pub const ENCRYPTED_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of an uploaded part whose file type isn't a MIME type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP client for the RedBox backend.
pub struct RedBoxClient {
    client: Client,
    config: CloudConfig,
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl RedBoxClient {
    pub fn new(config: CloudConfig) -> CloudResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Sets the session directly (for restoring a saved login).
    pub async fn set_session(&self, session: AuthSession) {
        *self.session.write().await = Some(session);
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.user.id.clone())
    }

    pub async fn logout(&self) {
        *self.session.write().await = None;
    }

    // ── URLs ──

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{collection}/records", self.config.base())
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.records_url(collection))
    }

    /// Direct URL of a record's stored blob.
    pub fn file_url(&self, record: &FileRecord) -> String {
        format!(
            "{}/api/files/{}/{}/{}",
            self.config.base(),
            record.collection_id,
            record.id,
            record.stored_file_name
        )
    }

    /// Inline preview URL, only for plaintext images.
    pub fn preview_url(&self, record: &FileRecord) -> Option<String> {
        (record.is_image() && !record.is_encrypted).then(|| self.file_url(record))
    }

    /// URL that forces a browser download. Encrypted files cannot be
    /// downloaded.
    pub fn download_url(&self, record: &FileRecord) -> CloudResult<String> {
        if record.is_encrypted {
            return Err(CloudError::InvalidInput(format!(
                "the file '{}' is encrypted and cannot be downloaded",
                record.display_name()
            )));
        }
        Ok(format!("{}?download=1", self.file_url(record)))
    }

    // ── Request helpers ──

    async fn token(&self) -> CloudResult<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(CloudError::AuthRequired)
    }

    async fn current_user_id(&self) -> CloudResult<String> {
        self.user_id().await.ok_or(CloudError::AuthRequired)
    }

    /// Attaches the session token to a request.
    async fn authed(&self, req: RequestBuilder) -> CloudResult<RequestBuilder> {
        Ok(req.header(AUTHORIZATION, self.token().await?))
    }

    /// Maps non-2xx responses to errors, keeping the backend's message.
    async fn check(resp: Response, what: &str) -> CloudResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);

        Err(match status {
            StatusCode::NOT_FOUND => CloudError::NotFound(what.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CloudError::AuthFailed(format!("{what}: {status} {message}"))
            }
            _ => CloudError::Api(format!("{what}: {status} {message}")),
        })
    }

    /// Fetches every record of `collection` matching `filter`, page by page.
    async fn list_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &str,
    ) -> CloudResult<Vec<T>> {
        let url = self.records_url(collection);
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            debug!("GET {url} page {page}");
            let req = self.client.get(&url).query(&[
                ("page", page.to_string()),
                ("perPage", self.config.page_size.to_string()),
                ("filter", filter.to_string()),
            ]);
            let resp = self.authed(req).await?.send().await?;
            let data: ListPage<T> = Self::check(resp, collection).await?.json().await?;

            let fetched = data.items.len();
            items.extend(data.items);
            if fetched == 0 || i64::from(page) >= data.total_pages {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    // ── Auth ──

    /// Creates a user account. Does not sign in.
    pub async fn register_user(&self, user: &NewUser) -> CloudResult<UserRecord> {
        let fields = [
            ("email", &user.email),
            ("password", &user.password),
            ("first_name", &user.first_name),
            ("last_name", &user.last_name),
            ("security_question", &user.security_question),
            ("security_answer", &user.security_answer),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CloudError::InvalidInput(format!("{name} is required")));
        }

        let url = self.records_url(&self.config.users_collection);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": user.email,
                "password": user.password,
                "passwordConfirm": user.password,
                "first_name": user.first_name,
                "last_name": user.last_name,
                "security_question": user.security_question,
                "security_answer": user.security_answer,
            }))
            .send()
            .await?;

        let created: UserRecord = Self::check(resp, "register user").await?.json().await?;
        info!("registered user {}", created.id);
        Ok(created)
    }

    /// Signs in with email and password, then checks the security answer
    /// against the one stored on the account.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        security_answer: &str,
    ) -> CloudResult<AuthSession> {
        if email.trim().is_empty() || password.is_empty() || security_answer.is_empty() {
            return Err(CloudError::InvalidInput(
                "email, password and security answer are required".to_string(),
            ));
        }

        let url = format!(
            "{}/api/collections/{}/auth-with-password",
            self.config.base(),
            self.config.users_collection
        );
        let session: AuthSession = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "identity": email, "password": password }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| CloudError::AuthFailed(e.to_string()))?
            .json()
            .await?;

        if session.user.security_answer != security_answer {
            warn!("security answer mismatch for user {}", session.user.id);
            self.logout().await;
            return Err(CloudError::AuthFailed("incorrect security answer".to_string()));
        }

        self.set_session(session.clone()).await;
        info!("signed in as {}", session.user.id);
        Ok(session)
    }

    /// Exchanges the current token for a fresh one.
    pub async fn refresh_session(&self) -> CloudResult<AuthSession> {
        let url = format!(
            "{}/api/collections/{}/auth-refresh",
            self.config.base(),
            self.config.users_collection
        );
        let req = self.authed(self.client.post(&url)).await?;
        let resp = req.send().await?;

        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            self.logout().await;
            return Err(CloudError::AuthFailed(
                "session expired, re-authentication required".to_string(),
            ));
        }

        let mut session: AuthSession = Self::check(resp, "refresh session").await?.json().await?;
        // The refresh response may omit hidden fields; keep what we had.
        if let Some(previous) = self.session().await {
            if session.user.security_answer.is_empty() {
                session.user.security_answer = previous.user.security_answer;
            }
        }
        self.set_session(session.clone()).await;
        Ok(session)
    }

    // ── Files ──

    /// All file records owned by the signed-in user.
    pub async fn list_files(&self) -> CloudResult<Vec<FileRecord>> {
        let owner = self.current_user_id().await?;
        self.list_all(&self.config.files_collection, &format!("owner=\"{owner}\""))
            .await
    }

    pub async fn get_file(&self, id: &str) -> CloudResult<FileRecord> {
        let url = self.record_url(&self.config.files_collection, id);
        debug!("GET {url}");
        let resp = self.authed(self.client.get(&url)).await?.send().await?;
        Ok(Self::check(resp, &format!("file {id}")).await?.json().await?)
    }

    /// Uploads a new plaintext file record owned by the signed-in user.
    pub async fn upload_file(&self, file: &NewFile) -> CloudResult<FileRecord> {
        let owner = self.current_user_id().await?;
        let file_name = if file.file_name.trim().is_empty() {
            "Unnamed File".to_string()
        } else {
            file.file_name.clone()
        };
        let file_type = if file.file_type.trim().is_empty() {
            "unknown".to_string()
        } else {
            file.file_type.clone()
        };
        let part_type = if file_type.contains('/') {
            file_type.as_str()
        } else {
            DEFAULT_CONTENT_TYPE
        };
        let part = Part::bytes(file.bytes.clone())
            .file_name(file_name.clone())
            .mime_str(part_type)
            .map_err(|e| CloudError::InvalidInput(format!("invalid file type {file_type}: {e}")))?;

        let form = Form::new()
            .text("file_name", file_name.clone())
            .text("file_type", file_type)
            .text("is_encrypted", "false")
            .text("salt", "")
            .text("iv", "")
            .text("encryption_id", "N/A")
            .text("encryption_key", "N/A")
            .part("file", part)
            .text("owner", owner);

        let url = self.records_url(&self.config.files_collection);
        debug!("POST {url} ({} bytes)", file.bytes.len());
        let resp = self
            .authed(self.client.post(&url))
            .await?
            .multipart(form)
            .send()
            .await?;

        let created: FileRecord = Self::check(resp, "upload file").await?.json().await?;
        info!("uploaded {file_name} as record {}", created.id);
        Ok(created)
    }

    /// Raw bytes of a record's stored blob.
    pub async fn fetch_blob(&self, record: &FileRecord) -> CloudResult<Vec<u8>> {
        let url = self.file_url(record);
        debug!("GET {url}");
        let mut req = self.client.get(&url);
        if let Ok(token) = self.token().await {
            req = req.header(AUTHORIZATION, token);
        }
        let resp = req.send().await?;
        let bytes = Self::check(resp, &format!("blob of file {}", record.id))
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    /// Swaps the stored blob for ciphertext and writes the encryption flag,
    /// salt and IV in one multipart update.
    pub async fn commit_encryption(
        &self,
        record_id: &str,
        upload: EncryptedUpload,
    ) -> CloudResult<FileRecord> {
        let size = upload.ciphertext.len();
        let part = Part::bytes(upload.ciphertext)
            .file_name(upload.file_name)
            .mime_str(ENCRYPTED_CONTENT_TYPE)?;
        let form = Form::new()
            .part("file", part)
            .text("is_encrypted", "true")
            .text("salt", upload.salt)
            .text("iv", upload.iv);

        let url = self.record_url(&self.config.files_collection, record_id);
        debug!("PATCH {url} ({size} bytes)");
        let resp = self
            .authed(self.client.patch(&url))
            .await?
            .multipart(form)
            .send()
            .await?;

        Ok(Self::check(resp, &format!("update file {record_id}"))
            .await?
            .json()
            .await?)
    }

    // ── Vaults ──

    /// All vault records owned by the signed-in user.
    pub async fn list_vaults(&self) -> CloudResult<Vec<VaultRecord>> {
        let owner = self.current_user_id().await?;
        self.list_all(&self.config.vaults_collection, &format!("owner=\"{owner}\""))
            .await
    }

    pub async fn create_vault(&self, kind: VaultKind) -> CloudResult<VaultRecord> {
        let owner = self.current_user_id().await?;
        let url = self.records_url(&self.config.vaults_collection);
        debug!("POST {url}");
        let resp = self
            .authed(self.client.post(&url))
            .await?
            .json(&serde_json::json!({
                "name": kind.as_str(),
                "type": kind.as_str(),
                "owner": owner,
            }))
            .send()
            .await?;

        Ok(Self::check(resp, "create vault").await?.json().await?)
    }
}

#[async_trait]
impl FileStore for RedBoxClient {
    async fn get_file(&self, id: &str) -> CloudResult<FileRecord> {
        RedBoxClient::get_file(self, id).await
    }

    async fn fetch_blob(&self, record: &FileRecord) -> CloudResult<Vec<u8>> {
        RedBoxClient::fetch_blob(self, record).await
    }

    async fn commit_encryption(
        &self,
        record_id: &str,
        upload: EncryptedUpload,
    ) -> CloudResult<FileRecord> {
        RedBoxClient::commit_encryption(self, record_id, upload).await
    }
}
