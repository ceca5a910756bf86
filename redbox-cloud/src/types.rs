//! Shared record types for the RedBox backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix appended to the display name of an encrypted file.
pub const ENCRYPTED_SUFFIX: &str = " (Encrypted)";

/// An authenticated session: bearer token plus the signed-in user.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(rename = "record")]
    pub user: UserRecord,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// A user account record.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub security_question: String,
    #[serde(default)]
    pub security_answer: String,
}

impl UserRecord {
    /// "First Last", falling back to the email, then to "User".
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.email.is_empty() {
            self.email.clone()
        } else {
            "User".to_string()
        }
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Sign-up request.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub security_question: String,
    pub security_answer: String,
}

/// Where a file record sits in its encryption lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileState {
    Plaintext,
    /// Terminal. There is no transition back to plaintext.
    Encrypted,
}

/// A stored file record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    #[serde(rename = "collectionId", default)]
    pub collection_id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    /// Name of the stored blob as assigned by the backend.
    #[serde(rename = "file", default)]
    pub stored_file_name: String,
    /// The backend may return this as a bool or as the string it was
    /// written as ("true"/"false").
    #[serde(default, deserialize_with = "deserialize_bool_from_str_or_bool")]
    pub is_encrypted: bool,
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

impl FileRecord {
    pub fn state(&self) -> FileState {
        if self.is_encrypted {
            FileState::Encrypted
        } else {
            FileState::Plaintext
        }
    }

    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }

    /// Name shown to the user, with the encrypted suffix when applicable.
    pub fn display_name(&self) -> String {
        if self.is_encrypted && !self.file_name.ends_with(ENCRYPTED_SUFFIX) {
            format!("{}{ENCRYPTED_SUFFIX}", self.file_name)
        } else {
            self.file_name.clone()
        }
    }
}

/// Accepts either a JSON bool or a string-encoded bool (e.g. `"true"`).
fn deserialize_bool_from_str_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct BoolVisitor;
    impl<'de> de::Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a bool or string-encoded bool")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim() {
                "" | "false" | "0" => Ok(false),
                "true" | "1" => Ok(true),
                other => Err(de::Error::custom(format!("invalid bool: {other}"))),
            }
        }
    }
    deserializer.deserialize_any(BoolVisitor)
}

/// A file to upload as a new plaintext record.
#[derive(Clone)]
pub struct NewFile {
    pub file_name: String,
    pub file_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for NewFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewFile")
            .field("file_name", &self.file_name)
            .field("file_type", &self.file_type)
            .field("bytes", &format!("[{} bytes]", self.bytes.len()))
            .finish()
    }
}

/// Payload of the single update that commits an encryption: the sealed
/// blob and the metadata needed to reverse it, written together.
#[derive(Clone)]
pub struct EncryptedUpload {
    /// `<original name>.enc`
    pub file_name: String,
    pub ciphertext: Vec<u8>,
    /// base64 of the 16-byte salt.
    pub salt: String,
    /// base64 of the 12-byte IV.
    pub iv: String,
}

impl fmt::Debug for EncryptedUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedUpload")
            .field("file_name", &self.file_name)
            .field("ciphertext", &format!("[{} bytes]", self.ciphertext.len()))
            .field("salt", &self.salt)
            .field("iv", &self.iv)
            .finish()
    }
}

/// Result of a successful encryption, ready for display without a refetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedFile {
    /// The record as returned by the update.
    pub record: FileRecord,
    /// e.g. `"report.pdf (Encrypted)"`.
    pub display_name: String,
}

/// One page of a collection listing.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

/// The four kinds of vault a user can register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VaultKind {
    Personal,
    Evidence,
    Government,
    Research,
}

impl VaultKind {
    pub const ALL: [VaultKind; 4] = [
        VaultKind::Personal,
        VaultKind::Evidence,
        VaultKind::Government,
        VaultKind::Research,
    ];

    /// Stored `type` and default `name` of the vault.
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultKind::Personal => "Personal Vault",
            VaultKind::Evidence => "Evidence Vault",
            VaultKind::Government => "Government Vault",
            VaultKind::Research => "Research Vault",
        }
    }
}

impl fmt::Display for VaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultKind {
    type Err = String;

    /// Accepts the stored form ("Evidence Vault") or the bare kind ("evidence").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized.strip_suffix(" vault").unwrap_or(&normalized);
        match normalized {
            "personal" => Ok(VaultKind::Personal),
            "evidence" => Ok(VaultKind::Evidence),
            "government" => Ok(VaultKind::Government),
            "research" => Ok(VaultKind::Research),
            _ => Err(format!("unknown vault kind: {s}")),
        }
    }
}

/// A registered vault record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub vault_type: String,
    #[serde(default)]
    pub owner: String,
}

impl VaultRecord {
    pub fn kind(&self) -> Option<VaultKind> {
        self.vault_type.parse().ok()
    }
}
