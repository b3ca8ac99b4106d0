//! Per-group settings.

use super::{require_non_empty, storage_err, Store};
use parrot_core::error::ParrotError;
use tracing::info;

impl Store {
    /// Set (or replace) the URL the group's invitation code is fetched from.
    pub async fn set_invitation_url(&self, group_id: &str, url: &str) -> Result<(), ParrotError> {
        require_non_empty("group_id", group_id)?;
        require_non_empty("url", url)?;
        self.ensure_open()?;

        sqlx::query(
            "INSERT INTO group_settings (group_id, invitation_url) VALUES (?, ?) \
             ON CONFLICT(group_id) DO UPDATE SET invitation_url = excluded.invitation_url, \
             updated_at = datetime('now')",
        )
        .bind(group_id)
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(storage_err("upsert group settings failed"))?;

        info!("invitation url set for group {group_id}");
        Ok(())
    }

    /// The group's invitation URL, if one was ever configured.
    pub async fn get_invitation_url(&self, group_id: &str) -> Result<Option<String>, ParrotError> {
        self.ensure_open()?;

        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT invitation_url FROM group_settings WHERE group_id = ?")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err("query failed"))?;

        Ok(row.and_then(|(url,)| url))
    }
}
