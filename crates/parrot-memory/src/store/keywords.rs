//! Keyword → reply records.

use super::{require_non_empty, storage_err, Store};
use parrot_core::{
    error::ParrotError,
    qa::{ContentItem, DeleteOutcome, GroupKeywords},
};
use tracing::{debug, info, warn};

impl Store {
    /// Register `keyword` in `group_id`, replacing any earlier replies for it.
    pub async fn add(
        &self,
        group_id: &str,
        keyword: &str,
        replies: &[ContentItem],
    ) -> Result<(), ParrotError> {
        require_non_empty("group_id", group_id)?;
        require_non_empty("keyword", keyword)?;
        if replies.is_empty() {
            return Err(ParrotError::InvalidArgument(
                "a keyword needs at least one reply part".into(),
            ));
        }
        for reply in replies {
            reply.validate()?;
        }
        self.ensure_open()?;

        let json = serde_json::to_string(replies)?;

        sqlx::query(
            "INSERT INTO qa_entries (group_id, keyword, replies) VALUES (?, ?, ?) \
             ON CONFLICT(group_id, keyword) DO UPDATE SET replies = excluded.replies, \
             updated_at = datetime('now')",
        )
        .bind(group_id)
        .bind(keyword)
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(storage_err("upsert keyword failed"))?;

        info!(
            "keyword saved: group={group_id} keyword={keyword:?} parts={}",
            replies.len()
        );
        Ok(())
    }

    /// Remove `keyword` from `group_id`.
    pub async fn delete(&self, group_id: &str, keyword: &str) -> Result<DeleteOutcome, ParrotError> {
        require_non_empty("group_id", group_id)?;
        require_non_empty("keyword", keyword)?;
        self.ensure_open()?;

        let result = sqlx::query("DELETE FROM qa_entries WHERE group_id = ? AND keyword = ?")
            .bind(group_id)
            .bind(keyword)
            .execute(&self.pool)
            .await
            .map_err(storage_err("delete keyword failed"))?;

        if result.rows_affected() > 0 {
            info!("keyword deleted: group={group_id} keyword={keyword:?}");
            Ok(DeleteOutcome::Removed)
        } else {
            debug!("keyword not found for delete: group={group_id} keyword={keyword:?}");
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// Replies for an exact keyword; empty when it is not registered.
    pub async fn get(&self, group_id: &str, keyword: &str) -> Result<Vec<ContentItem>, ParrotError> {
        self.ensure_open()?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT replies FROM qa_entries WHERE group_id = ? AND keyword = ?")
                .bind(group_id)
                .bind(keyword)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err("query failed"))?;

        match row {
            Some((json,)) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Snapshot of every keyword in the group, in registration order.
    ///
    /// Rows whose reply JSON cannot be decoded are skipped with a warning so
    /// one bad row does not silence the whole group.
    pub async fn list_for_group(&self, group_id: &str) -> Result<GroupKeywords, ParrotError> {
        self.ensure_open()?;

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT keyword, replies FROM qa_entries WHERE group_id = ? ORDER BY rowid",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err("query failed"))?;

        let entries = rows
            .into_iter()
            .filter_map(|(keyword, json)| {
                match serde_json::from_str::<Vec<ContentItem>>(&json) {
                    Ok(replies) => Some((keyword, replies)),
                    Err(e) => {
                        warn!("skipping undecodable replies for {keyword:?} in {group_id}: {e}");
                        None
                    }
                }
            })
            .collect();

        Ok(GroupKeywords::new(entries))
    }

    /// Number of keywords registered in the group.
    pub async fn count_for_group(&self, group_id: &str) -> Result<i64, ParrotError> {
        self.ensure_open()?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM qa_entries WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("query failed"))?;

        Ok(count)
    }
}
