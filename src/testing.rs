//! Shared fixtures for gateway and command tests.

use async_trait::async_trait;
use parrot_core::{
    config::StoreConfig,
    error::ParrotError,
    message::{Attachment, AttachmentType, IncomingMessage, OutgoingMessage},
    traits::{Channel, MemberRole},
};
use parrot_memory::Store;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) const GROUP: &str = "-100123";

/// Channel double that records everything sent through it.
pub(crate) struct RecordingChannel {
    role: MemberRole,
    texts: Mutex<Vec<String>>,
    photos: Mutex<Vec<Vec<u8>>>,
}

impl RecordingChannel {
    pub(crate) fn with_role(role: MemberRole) -> Self {
        Self {
            role,
            texts: Mutex::new(Vec::new()),
            photos: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub(crate) fn photos(&self) -> Vec<Vec<u8>> {
        self.photos.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ParrotError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ParrotError> {
        self.texts.lock().unwrap().push(message.text);
        Ok(())
    }

    async fn send_photo(
        &self,
        _target: &str,
        image: &[u8],
        _caption: &str,
    ) -> Result<(), ParrotError> {
        self.photos.lock().unwrap().push(image.to_vec());
        Ok(())
    }

    async fn member_role(&self, _group_id: &str, _user_id: &str) -> Result<MemberRole, ParrotError> {
        Ok(self.role)
    }

    async fn stop(&self) -> Result<(), ParrotError> {
        Ok(())
    }
}

/// A store in a fresh temporary directory. Keep the guard alive for the test.
pub(crate) async fn test_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("qa.db").to_string_lossy().to_string(),
        max_connections: 1,
    };
    (Store::new(&config).await.unwrap(), dir)
}

pub(crate) fn group_message(sender: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: sender.to_string(),
        sender_name: None,
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
        attachments: Vec::new(),
        reply_target: Some(GROUP.to_string()),
        group_id: Some(GROUP.to_string()),
    }
}

pub(crate) fn private_message(sender: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        reply_target: Some(sender.to_string()),
        group_id: None,
        ..group_message(sender, text)
    }
}

pub(crate) fn inline_image(bytes: &[u8]) -> Attachment {
    Attachment {
        file_type: AttachmentType::Image,
        file_id: None,
        data: Some(bytes.to_vec()),
        filename: Some("photo.jpg".to_string()),
    }
}
