//! Chat session listing command.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Table};

use tripdesk_core::user::repository::UserRepository;

use crate::state::AppState;

/// List active chat sessions ordered by last activity, with the
/// admin-facing unread count per thread.
pub async fn list_sessions(state: &AppState, limit: i64, json: bool) -> Result<()> {
    let sessions = state
        .chat_service
        .list_active_sessions(Some(limit), None)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!("  No active chat sessions.");
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["Session", "User", "Last activity", "Unread"]);

    for overview in &sessions {
        let username = state
            .user_repo
            .get_user(&overview.session.user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| overview.session.user_id.to_string());

        table.add_row([
            Cell::new(overview.session.id),
            Cell::new(username),
            Cell::new(
                overview
                    .session
                    .last_activity_at
                    .format("%Y-%m-%d %H:%M:%S"),
            ),
            Cell::new(overview.unread),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}
