//! Account creation command.

use anyhow::Result;
use chrono::Utc;
use console::style;
use uuid::Uuid;

use tripdesk_core::user::repository::UserRepository;
use tripdesk_infra::auth::password::hash_password;
use tripdesk_types::error::RepositoryError;
use tripdesk_types::user::User;

use crate::state::AppState;

/// Create an account, prompting for the password interactively.
///
/// Admin accounts are only ever provisioned here, never over the API.
pub async fn create_user(
    state: &AppState,
    username: String,
    email: String,
    full_name: Option<String>,
    admin: bool,
    json: bool,
) -> Result<()> {
    let password = dialoguer::Password::new()
        .with_prompt(format!("Password for '{username}'"))
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let user = User {
        id: Uuid::now_v7(),
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password_hash: hash_password(&password)?,
        full_name,
        is_admin: admin,
        created_at: Utc::now(),
    };

    match state.user_repo.create_user(&user).await {
        Ok(created) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&created)?);
            } else {
                println!();
                println!(
                    "  {} Created {} '{}'",
                    style("✓").green(),
                    if admin { "admin" } else { "user" },
                    style(&created.username).cyan()
                );
                println!("  ID: {}", style(created.id).dim());
                println!();
            }
            Ok(())
        }
        Err(RepositoryError::Conflict(name)) => {
            anyhow::bail!("username or email '{name}' already exists")
        }
        Err(e) => Err(e.into()),
    }
}
