//! Auth command handlers

use anyhow::{bail, Result};

use mushaf_core::{AuthSession, Backend, SyncCoordinator};

use crate::output::{Output, OutputFormat};

fn require_backend(coordinator: &SyncCoordinator) -> Result<&Backend> {
    match coordinator.backend() {
        Some(backend) => Ok(backend),
        None => bail!(
            "No backend configured.\n\
             Set one with: mushaf config set supabase_url <url>"
        ),
    }
}

/// Sign in with email and password
pub async fn signin(
    coordinator: &SyncCoordinator,
    email: &str,
    password: &str,
    output: &Output,
) -> Result<()> {
    let backend = require_backend(coordinator)?;
    let session = AuthSession::new();
    let user = session.sign_in(backend, email, password).await?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "email": user.email,
                    "display_name": user.display_name,
                    "is_admin": user.is_admin
                })
            );
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            output.success(&format!("Signed in as {}", user.email));
            if user.is_admin {
                output.message("You have admin rights; edits go to the shared dataset.");
            }
        }
    }
    Ok(())
}

/// Create an account and sign in as it
pub async fn signup(
    coordinator: &SyncCoordinator,
    email: &str,
    password: &str,
    display_name: Option<&str>,
    output: &Output,
) -> Result<()> {
    let backend = require_backend(coordinator)?;
    let session = AuthSession::new();
    let user = session
        .sign_up(backend, email, password, display_name)
        .await?;

    output.success(&format!("Created account for {}", user.email));
    Ok(())
}

/// Sign out of the current session
pub async fn signout(coordinator: &SyncCoordinator, output: &Output) -> Result<()> {
    let backend = require_backend(coordinator)?;
    let session = AuthSession::new();
    if let Err(e) = session.sign_out(backend).await {
        output.warning(&format!("Remote sign-out failed: {}", e));
    }
    output.success("Signed out");
    Ok(())
}
