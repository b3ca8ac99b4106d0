//! Message sending: text, photos, and command registration.

use super::{request_err, TelegramChannel};
use crate::utils::split_message;
use parrot_core::error::ParrotError;
use tracing::{info, warn};

impl TelegramChannel {
    /// Send a plain text message to a specific chat.
    ///
    /// Replies are replayed verbatim, so no parse mode is set.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ParrotError> {
        for chunk in split_message(text, 4096) {
            let url = format!("{}/sendMessage", self.base_url);
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| request_err("telegram send failed", e))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(ParrotError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Send a photo (JPEG bytes) with a caption to a chat.
    pub(crate) async fn send_photo_bytes(
        &self,
        chat_id: i64,
        image: &[u8],
        caption: &str,
    ) -> Result<(), ParrotError> {
        let url = format!("{}/sendPhoto", self.base_url);

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| ParrotError::Channel(format!("mime error: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);
        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_err("telegram sendPhoto failed", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(ParrotError::Channel(format!(
                "telegram sendPhoto failed ({status}): {error_text}"
            )));
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "addkw", "description": "Add a keyword reply (admins)" },
                { "command": "delkw", "description": "Delete a keyword (admins)" },
                { "command": "querykw", "description": "Show the replies of a keyword" },
                { "command": "setinvite", "description": "Set the invitation code URL (admins)" },
                { "command": "kwstatus", "description": "Keyword count and bot status" },
                { "command": "help", "description": "Show available commands" },
            ],
            "scope": { "type": "all_group_chats" },
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!(
                    "failed to register Telegram bot commands: {}",
                    e.without_url()
                );
            }
        }
    }
}
