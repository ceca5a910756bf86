mod auth;
mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redbox_cloud::{CloudError, RedBoxClient};
use tracing_subscriber::EnvFilter;

use crate::auth::Credentials;
use crate::commands::{account, encrypt, files, vaults};

/// Exit status for errors the user can fix (bad input, wrong credentials).
const EXIT_USER_ERROR: u8 = 2;
/// Exit status for backend, network, and crypto failures.
const EXIT_FAILURE: u8 = 1;

/// Command-line client for RedBox vaults
#[derive(Parser)]
#[command(name = "redbox")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Create an account, then sign in and list files
    redbox signup --email me@example.com --first-name Ada --last-name Lovelace \\
        --security-question \"First pet?\"
    redbox --email me@example.com files

    # Upload a file and encrypt it in place
    redbox --email me@example.com upload ./report.pdf
    redbox --email me@example.com encrypt <RECORD_ID>
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML config file (default: the user config directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend URL, overriding the config file
    #[arg(long, env = "REDBOX_URL", global = true)]
    base_url: Option<String>,

    #[command(flatten, next_help_heading = "Credentials")]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup(account::SignupArgs),

    /// Show the signed-in user
    Whoami,

    /// List your files
    Files(files::ListArgs),

    /// Upload local files
    Upload(files::UploadArgs),

    /// Encrypt a stored file with a passphrase
    Encrypt(encrypt::Args),

    /// Print the download URL of a file
    Url(files::UrlArgs),

    /// Manage vaults
    #[command(subcommand)]
    Vaults(vaults::Command),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(categorize_error(&e))
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref(), cli.base_url)?;
    let client = Arc::new(RedBoxClient::new(config).context("Failed to create backend client")?);

    let credentials = cli.credentials;

    match cli.command {
        Commands::Signup(args) => account::signup(&client, &credentials, &args).await,
        Commands::Whoami => {
            auth::sign_in(&client, &credentials).await?;
            account::whoami(&client).await
        }
        Commands::Files(args) => {
            auth::sign_in(&client, &credentials).await?;
            files::list(&client, &args).await
        }
        Commands::Upload(args) => {
            auth::sign_in(&client, &credentials).await?;
            files::upload(&client, &args).await
        }
        Commands::Url(args) => {
            auth::sign_in(&client, &credentials).await?;
            files::url(&client, &args).await
        }
        Commands::Encrypt(args) => {
            auth::sign_in(&client, &credentials).await?;
            encrypt::execute(client.clone(), &args).await
        }
        Commands::Vaults(cmd) => {
            auth::sign_in(&client, &credentials).await?;
            vaults::execute(client.clone(), cmd).await
        }
    }
}

/// Maps an error to an exit status by looking for the backend error behind
/// any added context.
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<CloudError>() {
        Some(cloud) if cloud.is_user_correctable() => EXIT_USER_ERROR,
        _ => EXIT_FAILURE,
    }
}

/// `RUST_LOG` wins; otherwise the level follows `-v`.
fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn user_errors_get_their_own_status() {
        let err = anyhow::Error::new(CloudError::AlreadyEncrypted("rec1".into()))
            .context("Failed to encrypt file");
        assert_eq!(categorize_error(&err), EXIT_USER_ERROR);
    }

    #[test]
    fn infrastructure_errors_are_failures() {
        let err = anyhow::Error::new(CloudError::PersistFailed("500".into()));
        assert_eq!(categorize_error(&err), EXIT_FAILURE);
        assert_eq!(categorize_error(&anyhow::anyhow!("io")), EXIT_FAILURE);
    }

    #[test]
    fn parses_vault_register() {
        let cli = Cli::try_parse_from(["redbox", "vaults", "register", "evidence", "Research Vault"])
            .unwrap();
        match cli.command {
            Commands::Vaults(vaults::Command::Register(args)) => assert_eq!(args.kinds.len(), 2),
            _ => panic!("expected vaults register"),
        }
    }
}
