//! Long-polling update loop and Channel trait implementation.

use super::types::{TgChatMember, TgFile, TgMessage, TgResponse, TgUpdate};
use super::{parse_chat_id, request_err, TelegramChannel};
use async_trait::async_trait;
use parrot_core::{
    error::ParrotError,
    message::{Attachment, AttachmentType, IncomingMessage, OutgoingMessage},
    traits::{Channel, MemberRole},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ParrotError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_groups = self.config.allowed_groups.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!(
                            "telegram poll error (retry in {backoff_secs}s): {}",
                            e.without_url()
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!(
                            "telegram parse error (retry in {backoff_secs}s): {}",
                            e.without_url()
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll, reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(msg) = update.message else {
                        continue;
                    };

                    if msg.chat.is_group()
                        && !allowed_groups.is_empty()
                        && !allowed_groups.contains(&msg.chat.id)
                    {
                        debug!("ignoring message from group {} (not allowed)", msg.chat.id);
                        continue;
                    }

                    let Some(incoming) = to_incoming(msg) else {
                        continue;
                    };

                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ParrotError> {
        let chat_id_str = message
            .reply_target
            .as_deref()
            .ok_or_else(|| ParrotError::Channel("no reply_target on outgoing message".into()))?;

        let chat_id = parse_chat_id(chat_id_str)?;
        self.send_text(chat_id, &message.text).await
    }

    async fn send_photo(
        &self,
        target: &str,
        image: &[u8],
        caption: &str,
    ) -> Result<(), ParrotError> {
        let chat_id = parse_chat_id(target)?;
        self.send_photo_bytes(chat_id, image, caption).await
    }

    async fn download(&self, attachment: &Attachment) -> Result<Vec<u8>, ParrotError> {
        if let Some(ref data) = attachment.data {
            return Ok(data.clone());
        }
        let file_id = attachment
            .file_id
            .as_deref()
            .ok_or_else(|| ParrotError::Channel("attachment has no file_id".into()))?;

        let url = self.resolve_file_url(file_id).await?;
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_err("telegram file download failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ParrotError::Channel(format!(
                "telegram file download failed ({status})"
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| request_err("telegram file read failed", e))?;
        debug!("downloaded telegram file ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn member_role(&self, group_id: &str, user_id: &str) -> Result<MemberRole, ParrotError> {
        let chat_id = parse_chat_id(group_id)?;
        let url = format!(
            "{}/getChatMember?chat_id={chat_id}&user_id={user_id}",
            self.base_url
        );

        let resp: TgResponse<TgChatMember> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_err("telegram getChatMember failed", e))?
            .json()
            .await
            .map_err(|e| request_err("telegram getChatMember parse failed", e))?;

        match resp.result {
            Some(member) if resp.ok => Ok(member.role()),
            _ => Err(ParrotError::Channel(format!(
                "telegram getChatMember error: {}",
                resp.description.unwrap_or_default()
            ))),
        }
    }

    async fn stop(&self) -> Result<(), ParrotError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

/// Convert a Telegram message into the channel-neutral form.
///
/// Photos are referenced by file id and only downloaded on demand.
/// Returns `None` for messages without a sender or without usable content.
pub(crate) fn to_incoming(msg: TgMessage) -> Option<IncomingMessage> {
    let user = msg.from?;

    let text = msg.text.or(msg.caption).unwrap_or_default();
    // Telegram sends multiple sizes; the last is the largest.
    let attachments: Vec<Attachment> = msg
        .photo
        .and_then(|sizes| sizes.into_iter().last())
        .map(|largest| Attachment {
            file_type: AttachmentType::Image,
            file_id: Some(largest.file_id),
            data: None,
            filename: Some(format!("{}.jpg", Uuid::new_v4())),
        })
        .into_iter()
        .collect();

    if text.is_empty() && attachments.is_empty() {
        return None;
    }

    let chat_id = msg.chat.id.to_string();
    let group_id = msg.chat.is_group().then(|| chat_id.clone());

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(user.display_name()),
        text,
        timestamp: chrono::Utc::now(),
        attachments,
        reply_target: Some(chat_id),
        group_id,
    })
}

impl TelegramChannel {
    /// Resolve a file_id to a download URL via `getFile`.
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, ParrotError> {
        let url = format!("{}/getFile?file_id={file_id}", self.base_url);
        let resp: TgResponse<TgFile> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_err("telegram getFile failed", e))?
            .json()
            .await
            .map_err(|e| request_err("telegram getFile parse failed", e))?;

        let file_path = resp
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| ParrotError::Channel("telegram getFile returned no file_path".into()))?;

        Ok(self.file_url(&file_path))
    }
}
