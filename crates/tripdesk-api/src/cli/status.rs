//! System status command.

use anyhow::Result;
use console::style;

use tripdesk_core::chat::room::RoomId;
use tripdesk_core::user::repository::UserRepository;

use crate::state::AppState;

/// Display system status.
///
/// Shows account and session counts, pending unread totals, and the
/// data directory in use.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_repo.count_users().await?;
    let sessions = state.chat_service.list_active_sessions(None, None).await?;
    let unread_total: u32 = sessions.iter().map(|s| s.unread).sum();
    let admins_online = state.rooms.member_count(RoomId::Admins);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "active_sessions": sessions.len(),
            "unread_user_messages": unread_total,
            "admins_online": admins_online,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Tripdesk v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Accounts ──").dim());
    println!("  Users: {}", style(users).bold());
    println!();

    println!("  {}", style("── Support chat ──").dim());
    println!("  Active sessions: {}", style(sessions.len()).bold());
    println!(
        "  Unread from users: {}",
        if unread_total > 0 {
            style(unread_total).yellow()
        } else {
            style(unread_total).green()
        }
    );
    println!("  Admins online: {}", admins_online);
    println!();

    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!();
    Ok(())
}
