//! Shared test helpers: mock-server setup, record fixtures, an in-memory
//! file store, and scripted crypto providers.
#![allow(dead_code)]

use async_trait::async_trait;
use redbox_cloud::{
    AuthSession, CloudConfig, CloudError, CloudResult, EncryptedUpload, FileRecord, FileStore,
    RedBoxClient, UserRecord,
};
use redbox_crypto::{
    derive_key, CryptoError, CryptoProvider, CryptoResult, DerivedKey, Iv, KdfParams,
    OsCryptoProvider, Salt,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::{Request, Respond, ResponseTemplate};

pub const TEST_ITERATIONS: u32 = 1_000;

/// Config pointed at a mock server, with cheap key derivation and short
/// timeouts.
pub fn test_config(base_url: &str) -> CloudConfig {
    CloudConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        fetch_timeout_secs: 1,
        persist_timeout_secs: 1,
        kdf_iterations: TEST_ITERATIONS,
        ..CloudConfig::default()
    }
}

pub fn client_for(base_url: &str) -> RedBoxClient {
    RedBoxClient::new(test_config(base_url)).expect("test config is valid")
}

pub fn test_session() -> AuthSession {
    AuthSession {
        token: "test-token".into(),
        user: UserRecord {
            id: "user1".into(),
            email: "test@example.com".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            security_question: "pet".into(),
            security_answer: "fluffy".into(),
        },
    }
}

/// The plaintext "report.pdf" record used throughout the tests.
pub fn report_record() -> FileRecord {
    FileRecord {
        id: "rec123".into(),
        collection_id: "col456".into(),
        owner: "user1".into(),
        file_name: "report.pdf".into(),
        file_type: "application/pdf".into(),
        stored_file_name: "report_a1b2c3.pdf".into(),
        is_encrypted: false,
        salt: String::new(),
        iv: String::new(),
        created: String::new(),
        updated: String::new(),
    }
}

/// Ten bytes `0x00..0x09`.
pub fn report_bytes() -> Vec<u8> {
    (0u8..10).collect()
}

pub fn record_json(record: &FileRecord) -> serde_json::Value {
    serde_json::to_value(record).expect("record serializes")
}

/// Test-only inverse of the workflow: re-derives the key from the recorded
/// salt and opens the ciphertext with the recorded IV.
pub fn open_with(passphrase: &str, salt_b64: &str, iv_b64: &str, ciphertext: &[u8]) -> Vec<u8> {
    let salt = Salt::from_base64(salt_b64).expect("salt is base64");
    let iv = Iv::from_base64(iv_b64).expect("iv is base64");
    let key = derive_key(passphrase, &salt, &KdfParams { iterations: TEST_ITERATIONS })
        .expect("derivation succeeds");
    redbox_crypto::decrypt(&key, &iv, ciphertext).expect("ciphertext opens")
}

// ── Multipart parsing ──

/// Extracts the value of a multipart field from a raw request body.
pub fn multipart_field(body: &[u8], name: &str) -> Option<Vec<u8>> {
    let marker = format!("name=\"{name}\"");
    let start = find(body, marker.as_bytes())?;
    let headers_end = start + find(&body[start..], b"\r\n\r\n")? + 4;
    let value_len = find(&body[headers_end..], b"\r\n--")?;
    Some(body[headers_end..headers_end + value_len].to_vec())
}

/// Extracts the `filename` of a multipart file field.
pub fn multipart_filename(body: &[u8], name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\"; filename=\"");
    let start = find(body, marker.as_bytes())? + marker.len();
    let len = find(&body[start..], b"\"")?;
    Some(String::from_utf8_lossy(&body[start..start + len]).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Responds to the encryption PATCH with the record updated from the
/// multipart fields actually sent.
pub struct EchoEncryptedUpdate(pub FileRecord);

impl Respond for EchoEncryptedUpdate {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = &request.body;
        let field = |name: &str| {
            multipart_field(body, name)
                .map(|v| String::from_utf8_lossy(&v).into_owned())
                .unwrap_or_default()
        };

        let mut updated = self.0.clone();
        updated.is_encrypted = field("is_encrypted") == "true";
        updated.salt = field("salt");
        updated.iv = field("iv");
        updated.stored_file_name = multipart_filename(body, "file").unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(record_json(&updated))
    }
}

// ── In-memory store ──

/// A record store that keeps one record + blob per id and applies
/// `commit_encryption` atomically.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, (FileRecord, Vec<u8>)>>,
    fail_commit: AtomicBool,
    fail_fetch: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    pub fetches: AtomicUsize,
    pub reads: AtomicUsize,
    pub commits: AtomicUsize,
}

impl MemoryStore {
    pub fn with_record(record: FileRecord, blob: Vec<u8>) -> Self {
        let store = Self::default();
        store.insert(record, blob);
        store
    }

    pub fn insert(&self, record: FileRecord, blob: Vec<u8>) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), (record, blob));
    }

    pub fn snapshot(&self, id: &str) -> (FileRecord, Vec<u8>) {
        self.records.lock().unwrap().get(id).cloned().expect("record exists")
    }

    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn network_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
            + self.reads.load(Ordering::SeqCst)
            + self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn get_file(&self, id: &str) -> CloudResult<FileRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .get(id)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| CloudError::NotFound(format!("file {id}")))
    }

    async fn fetch_blob(&self, record: &FileRecord) -> CloudResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CloudError::Api("simulated fetch failure".into()));
        }
        self.records
            .lock()
            .unwrap()
            .get(&record.id)
            .map(|(_, blob)| blob.clone())
            .ok_or_else(|| CloudError::NotFound(format!("blob of file {}", record.id)))
    }

    async fn commit_encryption(
        &self,
        record_id: &str,
        upload: EncryptedUpload,
    ) -> CloudResult<FileRecord> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(CloudError::Api("simulated transport error".into()));
        }

        let mut records = self.records.lock().unwrap();
        let (record, blob) = records
            .get_mut(record_id)
            .ok_or_else(|| CloudError::NotFound(format!("file {record_id}")))?;
        record.is_encrypted = true;
        record.salt = upload.salt;
        record.iv = upload.iv;
        record.stored_file_name = upload.file_name;
        *blob = upload.ciphertext;
        Ok(record.clone())
    }
}

// ── Crypto providers ──

/// Real key derivation and sealing, but salt and IV bytes come from a fixed
/// pattern so results are reproducible.
pub struct FixedRandomProvider {
    pub fill: u8,
}

impl CryptoProvider for FixedRandomProvider {
    fn random_bytes(&self, len: usize) -> CryptoResult<Vec<u8>> {
        Ok(vec![self.fill; len])
    }

    fn derive_key(&self, passphrase: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
        OsCryptoProvider.derive_key(passphrase, salt, params)
    }

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        OsCryptoProvider.encrypt(key, iv, plaintext)
    }
}

/// A provider whose cipher always fails.
pub struct BrokenCipherProvider;

impl CryptoProvider for BrokenCipherProvider {
    fn random_bytes(&self, len: usize) -> CryptoResult<Vec<u8>> {
        OsCryptoProvider.random_bytes(len)
    }

    fn derive_key(&self, passphrase: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
        OsCryptoProvider.derive_key(passphrase, salt, params)
    }

    fn encrypt(&self, _key: &DerivedKey, _iv: &Iv, _plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        Err(CryptoError::Encryption("simulated cipher failure".into()))
    }
}

/// A provider whose key derivation panics.
pub struct PanickingProvider;

impl CryptoProvider for PanickingProvider {
    fn random_bytes(&self, len: usize) -> CryptoResult<Vec<u8>> {
        OsCryptoProvider.random_bytes(len)
    }

    fn derive_key(&self, _passphrase: &str, _salt: &Salt, _params: &KdfParams) -> CryptoResult<DerivedKey> {
        panic!("key derivation blew up");
    }

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        OsCryptoProvider.encrypt(key, iv, plaintext)
    }
}
