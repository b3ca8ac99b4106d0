//! Keyword administration handlers: /addkw, /delkw, /querykw, /setinvite.

use super::{argument, audit, is_permitted, CommandContext, CommandResponse, Permission};
use parrot_memory::audit::{AuditAction, AuditStatus};
use tracing::{error, info};

pub(super) async fn handle_add(ctx: &CommandContext<'_>) -> CommandResponse {
    let keyword = argument(&ctx.incoming.text);
    if keyword.is_empty() {
        return CommandResponse::Reply("Usage: /addkw <keyword>".to_string());
    }

    if !is_permitted(ctx, Permission::ListedAndRole).await {
        deny(ctx, AuditAction::AddKeyword, Some(keyword)).await;
        return CommandResponse::Reply("You do not have permission to add keywords".to_string());
    }

    info!(
        "awaiting reply for keyword {keyword:?} from {} in {}",
        ctx.incoming.sender_id, ctx.group_id
    );
    CommandResponse::AwaitReply {
        keyword: keyword.to_string(),
    }
}

pub(super) async fn handle_delete(ctx: &CommandContext<'_>) -> String {
    let keyword = argument(&ctx.incoming.text);
    if keyword.is_empty() {
        return "Usage: /delkw <keyword>".to_string();
    }

    if !is_permitted(ctx, Permission::ListedAndRole).await {
        deny(ctx, AuditAction::DeleteKeyword, Some(keyword)).await;
        return "You do not have permission to delete keywords".to_string();
    }

    match ctx.store.delete(ctx.group_id, keyword).await {
        Ok(outcome) => {
            audit(
                ctx.audit,
                ctx.incoming,
                ctx.group_id,
                AuditAction::DeleteKeyword,
                Some(keyword),
                AuditStatus::Ok,
                Some(outcome.message().to_string()),
            )
            .await;
            outcome.message().to_string()
        }
        Err(e) => {
            error!("delete keyword {keyword:?} in {} failed: {e}", ctx.group_id);
            audit(
                ctx.audit,
                ctx.incoming,
                ctx.group_id,
                AuditAction::DeleteKeyword,
                Some(keyword),
                AuditStatus::Error,
                Some(e.to_string()),
            )
            .await;
            "Failed to delete the keyword".to_string()
        }
    }
}

pub(super) async fn handle_query(ctx: &CommandContext<'_>) -> String {
    let keyword = argument(&ctx.incoming.text);
    if keyword.is_empty() {
        return "Usage: /querykw <keyword>".to_string();
    }

    match ctx.store.get(ctx.group_id, keyword).await {
        Ok(replies) => {
            let mut out = format!("Keyword: {keyword}\n");
            if replies.is_empty() {
                out.push_str("No reply found");
            } else {
                for (i, item) in replies.iter().enumerate() {
                    out.push_str(&format!("Reply {}: {}\n", i + 1, item.content()));
                }
            }
            out.trim_end().to_string()
        }
        Err(e) => {
            error!("query keyword {keyword:?} in {} failed: {e}", ctx.group_id);
            "Failed to query the keyword".to_string()
        }
    }
}

pub(super) async fn handle_set_invite(ctx: &CommandContext<'_>) -> String {
    if !is_permitted(ctx, Permission::ListedOrRole).await {
        deny(ctx, AuditAction::SetInvitationUrl, None).await;
        return "You do not have permission to set the invitation link".to_string();
    }

    let url = argument(&ctx.incoming.text);
    if !url.starts_with("http") {
        return "Please provide a valid URL".to_string();
    }

    let result = ctx.store.set_invitation_url(ctx.group_id, url).await;
    let (status, detail) = match &result {
        Ok(()) => (AuditStatus::Ok, Some(url.to_string())),
        Err(e) => (AuditStatus::Error, Some(e.to_string())),
    };
    audit(
        ctx.audit,
        ctx.incoming,
        ctx.group_id,
        AuditAction::SetInvitationUrl,
        None,
        status,
        detail,
    )
    .await;

    match result {
        Ok(()) => "Invitation link saved".to_string(),
        Err(e) => {
            error!("set invitation url in {} failed: {e}", ctx.group_id);
            "Failed to save the invitation link".to_string()
        }
    }
}

async fn deny(ctx: &CommandContext<'_>, action: AuditAction, keyword: Option<&str>) {
    info!(
        "denied {action:?} for {} in {}",
        ctx.incoming.sender_id, ctx.group_id
    );
    audit(
        ctx.audit,
        ctx.incoming,
        ctx.group_id,
        action,
        keyword,
        AuditStatus::Denied,
        None,
    )
    .await;
}
