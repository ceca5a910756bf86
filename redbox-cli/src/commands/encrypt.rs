//! Encrypt command: seals a stored file under a passphrase.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use redbox_cloud::{FileEncryptor, RedBoxClient};
use redbox_crypto::OsCryptoProvider;
use tracing::instrument;

use crate::auth::TerminalPassphrase;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Record ID of the file to encrypt
    pub record_id: String,
}

#[instrument(level = "info", name = "cmd::encrypt", skip_all)]
pub async fn execute(client: Arc<RedBoxClient>, args: &Args) -> Result<()> {
    let record = client
        .get_file(&args.record_id)
        .await
        .with_context(|| format!("Failed to look up file {}", args.record_id))?;

    let config = client.config().clone();
    let encryptor = FileEncryptor::new(client, Arc::new(OsCryptoProvider), &config);
    let source = TerminalPassphrase::default();

    match encryptor.encrypt_with_prompt(&record, &source).await {
        Ok(encrypted) => {
            println!("{} encrypted", encrypted.display_name);
            eprintln!("Keep your passphrase safe. It cannot be recovered.");
            Ok(())
        }
        Err(_) if source.was_cancelled() => Ok(()),
        Err(e) => match source.take_error() {
            Some(read_error) => Err(read_error).context("Failed to read passphrase"),
            None => Err(e).with_context(|| format!("Failed to encrypt '{}'", record.file_name)),
        },
    }
}
