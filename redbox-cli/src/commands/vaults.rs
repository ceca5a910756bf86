//! Vault commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Subcommand};
use redbox_cloud::vaults::VaultManager;
use redbox_cloud::{RedBoxClient, VaultKind};
use tracing::instrument;

use crate::output::vaults_table;

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Show your vault slots
    List,

    /// Register vaults of the given kinds
    Register(RegisterArgs),
}

#[derive(ClapArgs, Clone)]
pub struct RegisterArgs {
    /// personal, evidence, government, or research
    #[arg(required = true, value_name = "KIND", value_parser = parse_kind)]
    pub kinds: Vec<VaultKind>,
}

fn parse_kind(s: &str) -> Result<VaultKind, String> {
    s.parse()
}

#[instrument(level = "info", name = "cmd::vaults", skip_all)]
pub async fn execute(client: Arc<RedBoxClient>, command: Command) -> Result<()> {
    let manager = VaultManager::new(client);

    match command {
        Command::List => {
            let slots = manager.slots().await.context("Failed to list vaults")?;
            println!("{}", vaults_table(&slots));
        }
        Command::Register(args) => {
            let created = manager
                .register_vaults(&args.kinds)
                .await
                .context("Failed to register vaults")?;
            for vault in created {
                println!("Registered {} ({})", vault.name, vault.id);
            }
        }
    }
    Ok(())
}
