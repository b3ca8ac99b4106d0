//! Built-in group commands for keyword administration.

mod keywords;
mod status;


use parrot_core::{config::AuthConfig, message::IncomingMessage, traits::Channel};
use parrot_memory::{
    audit::{AuditAction, AuditEntry, AuditStatus},
    AuditLogger, Store,
};
use std::time::Instant;
use tracing::warn;

/// Reply for commands sent outside a group.
pub const GROUP_ONLY: &str = "This command is only available in group chats";

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub audit: &'a AuditLogger,
    pub channel: &'a dyn Channel,
    pub auth: &'a AuthConfig,
    pub incoming: &'a IncomingMessage,
    pub group_id: &'a str,
    pub uptime: &'a Instant,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddKeyword,
    DeleteKeyword,
    QueryKeyword,
    SetInvite,
    Status,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/help@parrot_bot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/addkw" | "/addkeyword" => Some(Self::AddKeyword),
            "/delkw" => Some(Self::DeleteKeyword),
            "/querykw" => Some(Self::QueryKeyword),
            "/setinvite" => Some(Self::SetInvite),
            "/kwstatus" => Some(Self::Status),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// What the gateway should do after a command ran.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResponse {
    /// Send this text back to the group.
    Reply(String),
    /// Ask for the reply and capture the sender's next message for `keyword`.
    AwaitReply { keyword: String },
}

/// Handle a command and return what to send back.
pub async fn handle(cmd: Command, ctx: &CommandContext<'_>) -> CommandResponse {
    match cmd {
        Command::AddKeyword => keywords::handle_add(ctx).await,
        Command::DeleteKeyword => CommandResponse::Reply(keywords::handle_delete(ctx).await),
        Command::QueryKeyword => CommandResponse::Reply(keywords::handle_query(ctx).await),
        Command::SetInvite => CommandResponse::Reply(keywords::handle_set_invite(ctx).await),
        Command::Status => CommandResponse::Reply(status::handle_status(ctx).await),
        Command::Help => CommandResponse::Reply(status::handle_help()),
    }
}

/// Everything after the command word, trimmed.
fn argument(text: &str) -> &str {
    text.trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or("")
}

/// Who may run an administrative command.
#[derive(Debug, Clone, Copy)]
enum Permission {
    /// Listed admin who also holds a privileged group role.
    ListedAndRole,
    /// Listed admin, or anyone holding a privileged group role.
    ListedOrRole,
}

async fn is_permitted(ctx: &CommandContext<'_>, permission: Permission) -> bool {
    let listed = ctx
        .auth
        .admins
        .iter()
        .any(|a| a == &ctx.incoming.sender_id);

    match permission {
        Permission::ListedAndRole => {
            listed && (!ctx.auth.require_group_role || has_group_role(ctx).await)
        }
        Permission::ListedOrRole => listed || has_group_role(ctx).await,
    }
}

async fn has_group_role(ctx: &CommandContext<'_>) -> bool {
    match ctx
        .channel
        .member_role(ctx.group_id, &ctx.incoming.sender_id)
        .await
    {
        Ok(role) => role.is_privileged(),
        Err(e) => {
            warn!(
                "role lookup failed for {} in {}: {e}",
                ctx.incoming.sender_id, ctx.group_id
            );
            false
        }
    }
}

/// Record an administrative attempt. Failures are logged, never surfaced.
pub(crate) async fn audit(
    audit: &AuditLogger,
    incoming: &IncomingMessage,
    group_id: &str,
    action: AuditAction,
    keyword: Option<&str>,
    status: AuditStatus,
    detail: Option<String>,
) {
    let entry = AuditEntry {
        channel: incoming.channel.clone(),
        group_id: group_id.to_string(),
        sender_id: incoming.sender_id.clone(),
        action,
        keyword: keyword.map(str::to_string),
        status,
        detail,
    };
    if let Err(e) = audit.log(&entry).await {
        warn!("audit log write failed: {e}");
    }
}
