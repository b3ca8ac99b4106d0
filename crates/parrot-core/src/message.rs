use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content (caption for photos, empty if none).
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Group the message was posted in. `None` for private chats.
    #[serde(default)]
    pub group_id: Option<String>,
}

impl IncomingMessage {
    /// Whether this message comes from a group chat.
    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// First image attachment, if any.
    pub fn image(&self) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|a| matches!(a.file_type, AttachmentType::Image))
    }
}

/// An outgoing text message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>, reply_target: Option<String>) -> Self {
        Self {
            text: text.into(),
            reply_target,
        }
    }
}

/// A file attachment on a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file_type: AttachmentType,
    /// Platform file handle, resolved through [`Channel::download`](crate::traits::Channel::download).
    #[serde(default)]
    pub file_id: Option<String>,
    /// Inline bytes, when the channel already fetched them.
    pub data: Option<Vec<u8>>,
    pub filename: Option<String>,
}

/// Supported attachment types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttachmentType {
    Image,
    Other,
}
