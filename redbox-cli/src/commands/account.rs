//! Account commands: sign-up and the signed-in user.

use anyhow::{Context, Result, bail};
use clap::Args as ClapArgs;
use redbox_cloud::{NewUser, RedBoxClient};

use crate::auth::{Credentials, prompt_secret};

#[derive(ClapArgs, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    /// Question asked at every sign-in
    #[arg(long)]
    pub security_question: String,
}

pub async fn signup(client: &RedBoxClient, credentials: &Credentials, args: &SignupArgs) -> Result<()> {
    let email = credentials.email()?;
    let password = match &credentials.password {
        Some(password) => password.clone(),
        None => {
            let password = prompt_secret("Password: ").await?;
            let confirm = prompt_secret("Confirm password: ").await?;
            if *password != *confirm {
                bail!("Passwords do not match");
            }
            password.to_string()
        }
    };
    let security_answer = credentials.security_answer().await?;

    let user = NewUser {
        email,
        password,
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        security_question: args.security_question.clone(),
        security_answer: security_answer.to_string(),
    };

    let created = client
        .register_user(&user)
        .await
        .context("Failed to create account")?;
    println!("Created account for {} ({})", created.display_name(), created.id);
    eprintln!("Sign in with: redbox --email {} files", user.email);
    Ok(())
}

pub async fn whoami(client: &RedBoxClient) -> Result<()> {
    let session = client.session().await.context("Not signed in")?;
    println!("{} <{}>", session.user.display_name(), session.user.email);
    println!("id: {}", session.user.id);
    Ok(())
}
