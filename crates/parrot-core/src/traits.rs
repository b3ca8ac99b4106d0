use crate::{
    error::ParrotError,
    message::{Attachment, IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// A member's standing in a group, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
    Other,
}

impl MemberRole {
    /// Owners and admins may manage a group's keywords.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive group
/// messages and send replies.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, ParrotError>;

    /// Send a text message back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), ParrotError>;

    /// Send a photo with an optional caption.
    async fn send_photo(
        &self,
        _target: &str,
        _image: &[u8],
        _caption: &str,
    ) -> Result<(), ParrotError> {
        Ok(())
    }

    /// Fetch the bytes of an attachment received on this channel.
    async fn download(&self, attachment: &Attachment) -> Result<Vec<u8>, ParrotError> {
        attachment
            .data
            .clone()
            .ok_or_else(|| ParrotError::Channel("attachment has no inline data".into()))
    }

    /// Look up a user's role in a group.
    async fn member_role(&self, _group_id: &str, _user_id: &str) -> Result<MemberRole, ParrotError> {
        Ok(MemberRole::Other)
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), ParrotError>;
}
