//! Informational handlers: /kwstatus, /help.

use super::CommandContext;

pub(super) async fn handle_status(ctx: &CommandContext<'_>) -> String {
    let elapsed = ctx.uptime.elapsed();
    let hours = elapsed.as_secs() / 3600;
    let minutes = (elapsed.as_secs() % 3600) / 60;
    let secs = elapsed.as_secs() % 60;

    let keywords = ctx
        .store
        .count_for_group(ctx.group_id)
        .await
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let admin_actions = ctx
        .audit
        .count_for_group(ctx.group_id)
        .await
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let db_size = ctx
        .store
        .db_size()
        .await
        .map(format_bytes)
        .unwrap_or_else(|_| "unknown".to_string());

    format!(
        "Parrot status\n\
         Keywords in this group: {keywords}\n\
         Admin actions recorded: {admin_actions}\n\
         Database: {db_size}\n\
         Uptime: {hours}h {minutes}m {secs}s"
    )
}

pub(super) fn handle_help() -> String {
    "Commands\n\
     /addkw <keyword> - add a keyword; your next message becomes the reply (admins)\n\
     /delkw <keyword> - delete a keyword (admins)\n\
     /querykw <keyword> - show the replies of a keyword\n\
     /setinvite <url> - set the invitation code URL (admins)\n\
     /kwstatus - keyword count and bot status\n\
     /help - this message"
        .to_string()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
