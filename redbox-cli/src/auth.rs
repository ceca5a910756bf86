//! Credential and passphrase prompts.
//!
//! Secrets come from flags/env when given and otherwise from a no-echo
//! terminal prompt. Prompts run on the blocking pool so they never stall the
//! runtime.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Args;
use redbox_cloud::{Passphrase, PassphraseSource, RedBoxClient};
use tracing::{debug, warn};
use zeroize::Zeroizing;

#[derive(Args, Clone, Default)]
pub struct Credentials {
    /// Account email
    #[arg(long, env = "REDBOX_EMAIL", global = true)]
    pub email: Option<String>,

    /// Account password (insecure, prefer REDBOX_PASSWORD or the prompt)
    #[arg(long, env = "REDBOX_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Answer to the account's security question
    #[arg(long, env = "REDBOX_SECURITY_ANSWER", hide_env_values = true, global = true)]
    pub security_answer: Option<String>,
}

impl Credentials {
    pub fn email(&self) -> Result<String> {
        match &self.email {
            Some(email) if !email.trim().is_empty() => Ok(email.trim().to_string()),
            _ => bail!("An email is required (use --email or REDBOX_EMAIL)"),
        }
    }

    pub async fn password(&self) -> Result<Zeroizing<String>> {
        match &self.password {
            Some(password) => Ok(Zeroizing::new(password.clone())),
            None => prompt_secret("Password: ").await,
        }
    }

    pub async fn security_answer(&self) -> Result<Zeroizing<String>> {
        match &self.security_answer {
            Some(answer) => Ok(Zeroizing::new(answer.clone())),
            None => prompt_secret("Security answer: ").await,
        }
    }
}

/// Signs in with the given credentials, prompting for anything missing.
pub async fn sign_in(client: &RedBoxClient, credentials: &Credentials) -> Result<()> {
    let email = credentials.email()?;
    let password = credentials.password().await?;
    let answer = credentials.security_answer().await?;

    debug!("signing in as {email}");
    client
        .authenticate(&email, &password, &answer)
        .await
        .context("Sign-in failed")?;
    Ok(())
}

/// Reads a line from the terminal without echo.
pub async fn prompt_secret(prompt: &'static str) -> Result<Zeroizing<String>> {
    tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt).map(Zeroizing::new))
        .await
        .context("Prompt task failed")?
        .context("Failed to read from terminal")
}

/// Reads one secret line for a prompt.
type SecretReader = fn(String) -> io::Result<String>;

/// Asks for the encryption passphrase on the terminal. An empty answer
/// counts as cancelling; a failed read is kept for [`take_error`].
///
/// [`take_error`]: TerminalPassphrase::take_error
pub struct TerminalPassphrase {
    read: SecretReader,
    cancelled: AtomicBool,
    last_error: Mutex<Option<io::Error>>,
}

impl Default for TerminalPassphrase {
    fn default() -> Self {
        Self::with_reader(|prompt| rpassword::prompt_password(prompt))
    }
}

impl TerminalPassphrase {
    fn with_reader(read: SecretReader) -> Self {
        Self {
            read,
            cancelled: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Whether the last prompt was answered with nothing.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Takes the error from the last prompt, if reading it failed.
    pub fn take_error(&self) -> Option<io::Error> {
        self.last_error.lock().ok().and_then(|mut e| e.take())
    }

    fn record(&self, cancelled: bool, error: Option<io::Error>) {
        self.cancelled.store(cancelled, Ordering::SeqCst);
        if let Ok(mut last) = self.last_error.lock() {
            *last = error;
        }
    }
}

#[async_trait]
impl PassphraseSource for TerminalPassphrase {
    async fn request(&self, prompt: &str) -> Option<Passphrase> {
        let prompt = format!("{prompt} ");
        let read = self.read;
        let answer = tokio::task::spawn_blocking(move || read(prompt))
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)));

        match answer {
            Ok(answer) if answer.is_empty() => {
                self.record(true, None);
                None
            }
            Ok(answer) => {
                self.record(false, None);
                Some(Zeroizing::new(answer))
            }
            Err(e) => {
                warn!("passphrase prompt failed: {e}");
                self.record(false, Some(e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed() {
        let creds = Credentials {
            email: Some("  me@example.com ".into()),
            ..Credentials::default()
        };
        assert_eq!(creds.email().unwrap(), "me@example.com");
    }

    #[test]
    fn missing_email_is_an_error() {
        let creds = Credentials::default();
        assert!(creds.email().is_err());

        let blank = Credentials {
            email: Some("   ".into()),
            ..Credentials::default()
        };
        assert!(blank.email().is_err());
    }

    #[tokio::test]
    async fn supplied_secrets_skip_the_prompt() {
        let creds = Credentials {
            email: Some("me@example.com".into()),
            password: Some("hunter22".into()),
            security_answer: Some("fluffy".into()),
        };
        assert_eq!(creds.password().await.unwrap().as_str(), "hunter22");
        assert_eq!(creds.security_answer().await.unwrap().as_str(), "fluffy");
    }

    #[test]
    fn not_cancelled_before_prompting() {
        let source = TerminalPassphrase::default();
        assert!(!source.was_cancelled());
        assert!(source.take_error().is_none());
    }

    #[tokio::test]
    async fn answered_prompt_returns_passphrase() {
        let source = TerminalPassphrase::with_reader(|_| Ok("correct-horse".to_string()));

        let passphrase = source.request("Passphrase:").await.unwrap();

        assert_eq!(passphrase.as_str(), "correct-horse");
        assert!(!source.was_cancelled());
        assert!(source.take_error().is_none());
    }

    #[tokio::test]
    async fn empty_answer_is_a_cancel() {
        let source = TerminalPassphrase::with_reader(|_| Ok(String::new()));

        assert!(source.request("Passphrase:").await.is_none());
        assert!(source.was_cancelled());
        assert!(source.take_error().is_none());
    }

    #[tokio::test]
    async fn read_failure_is_kept_not_a_cancel() {
        let source = TerminalPassphrase::with_reader(|_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "no terminal"))
        });

        assert!(source.request("Passphrase:").await.is_none());
        assert!(!source.was_cancelled());
        let err = source.take_error().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(source.take_error().is_none());
    }

    #[tokio::test]
    async fn later_answer_clears_earlier_failure() {
        let failing = TerminalPassphrase::with_reader(|_| Err(io::Error::other("closed")));
        failing.request("Passphrase:").await;

        let source = TerminalPassphrase {
            read: |_| Ok(String::new()),
            ..failing
        };
        source.request("Passphrase:").await;

        assert!(source.was_cancelled());
        assert!(source.take_error().is_none());
    }
}
