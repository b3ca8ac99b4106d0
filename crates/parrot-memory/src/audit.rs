//! Audit log: records every keyword administration attempt.

use parrot_core::error::ParrotError;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub channel: String,
    pub group_id: String,
    pub sender_id: String,
    pub action: AuditAction,
    pub keyword: Option<String>,
    pub status: AuditStatus,
    pub detail: Option<String>,
}

/// Which administrative command was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    AddKeyword,
    DeleteKeyword,
    SetInvitationUrl,
}

impl AuditAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::AddKeyword => "add_keyword",
            Self::DeleteKeyword => "delete_keyword",
            Self::SetInvitationUrl => "set_invitation_url",
        }
    }
}

/// Status of an audited command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Ok,
    Error,
    Denied,
}

impl AuditStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Denied => "denied",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), ParrotError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log \
             (id, channel, group_id, sender_id, action, keyword, status, detail) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.channel)
        .bind(&entry.group_id)
        .bind(&entry.sender_id)
        .bind(entry.action.as_str())
        .bind(&entry.keyword)
        .bind(entry.status.as_str())
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| ParrotError::Storage(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} {} {} [{}] {}",
            entry.channel,
            entry.group_id,
            entry.sender_id,
            entry.status.as_str(),
            entry.action.as_str(),
        );

        Ok(())
    }

    /// Number of entries recorded for a group.
    pub async fn count_for_group(&self, group_id: &str) -> Result<i64, ParrotError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ParrotError::Storage(format!("audit query failed: {e}")))?;
        Ok(count)
    }
}
