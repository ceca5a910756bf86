//! Vault registration.
//!
//! A user has at most one vault of each kind. Registering skips kinds that
//! already exist and fails when nothing new is left to create.

use crate::api_client::RedBoxClient;
use crate::error::{CloudError, CloudResult};
use crate::types::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Maximum number of vault slots per user.
pub const MAX_VAULTS: usize = VaultKind::ALL.len();

/// Orchestrates vault listing and registration.
pub struct VaultManager {
    api: Arc<RedBoxClient>,
}

impl VaultManager {
    pub fn new(api: Arc<RedBoxClient>) -> Self {
        Self { api }
    }

    pub async fn list_vaults(&self) -> CloudResult<Vec<VaultRecord>> {
        self.api.list_vaults().await
    }

    /// Vault slots in display order: registered vaults first, padded with
    /// `None` up to [`MAX_VAULTS`].
    pub async fn slots(&self) -> CloudResult<Vec<Option<VaultRecord>>> {
        let mut slots: Vec<Option<VaultRecord>> =
            self.list_vaults().await?.into_iter().map(Some).collect();
        while slots.len() < MAX_VAULTS {
            slots.push(None);
        }
        Ok(slots)
    }

    /// Creates the requested kinds that the user doesn't have yet.
    pub async fn register_vaults(&self, kinds: &[VaultKind]) -> CloudResult<Vec<VaultRecord>> {
        let existing = self.list_vaults().await?;
        let to_create = pending_kinds(&existing, kinds);

        if to_create.is_empty() {
            return Err(CloudError::DuplicateVaults);
        }

        let mut created = Vec::with_capacity(to_create.len());
        for kind in to_create {
            let vault = self.api.create_vault(kind).await?;
            info!("registered {kind} as {}", vault.id);
            created.push(vault);
        }
        Ok(created)
    }
}

/// Requested kinds minus those already registered, deduplicated, in request
/// order.
fn pending_kinds(existing: &[VaultRecord], requested: &[VaultKind]) -> Vec<VaultKind> {
    let mut taken: HashSet<String> = existing.iter().map(|v| v.vault_type.clone()).collect();
    requested
        .iter()
        .copied()
        .filter(|kind| taken.insert(kind.as_str().to_string()))
        .collect()
}
