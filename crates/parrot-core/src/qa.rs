//! Keyword/reply records shared by the store and the gateway.

use serde::{Deserialize, Serialize};

use crate::error::ParrotError;

/// What a reply part holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Literal text, sent as a message.
    #[serde(rename = "TEXT")]
    Text,
    /// Path to image bytes persisted on disk, sent as a photo.
    #[serde(rename = "IMAGE_URL")]
    ImageReference,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::ImageReference => "IMAGE_URL",
        }
    }
}

/// One part of a keyword reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    kind: ContentKind,
    content: String,
}

impl ContentItem {
    /// A text part. Empty text is rejected.
    pub fn text(content: impl Into<String>) -> Result<Self, ParrotError> {
        Self::new(ContentKind::Text, content)
    }

    /// An image part pointing at a stored file.
    pub fn image(path: impl Into<String>) -> Result<Self, ParrotError> {
        Self::new(ContentKind::ImageReference, path)
    }

    pub fn new(kind: ContentKind, content: impl Into<String>) -> Result<Self, ParrotError> {
        let item = Self {
            kind,
            content: content.into(),
        };
        item.validate()?;
        Ok(item)
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check the invariants that deserialization cannot enforce.
    pub fn validate(&self) -> Result<(), ParrotError> {
        if self.content.is_empty() {
            return Err(ParrotError::InvalidArgument(format!(
                "{} reply part has empty content",
                self.kind.as_str()
            )));
        }
        Ok(())
    }
}

/// Every keyword registered in one group, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupKeywords {
    entries: Vec<(String, Vec<ContentItem>)>,
}

impl GroupKeywords {
    pub fn new(entries: Vec<(String, Vec<ContentItem>)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replies for an exact keyword.
    pub fn get(&self, keyword: &str) -> Option<&[ContentItem]> {
        self.entries
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, replies)| replies.as_slice())
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContentItem])> {
        self.entries
            .iter()
            .map(|(k, replies)| (k.as_str(), replies.as_slice()))
    }
}

impl IntoIterator for GroupKeywords {
    type Item = (String, Vec<ContentItem>);
    type IntoIter = std::vec::IntoIter<(String, Vec<ContentItem>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Result of deleting a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    NotFound,
}

impl DeleteOutcome {
    /// Status line shown to whoever asked for the deletion.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Removed => "Keyword deleted.",
            Self::NotFound => "Keyword not found, nothing was deleted.",
        }
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
