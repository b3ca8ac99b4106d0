//! Reply image persistence.
//!
//! Images sent while registering a keyword are downloaded once and kept under
//! `{data_dir}/images`; the stored path becomes the reply's content.

use chrono::{DateTime, Local};
use parrot_core::{error::ParrotError, message::Attachment, shellexpand, traits::Channel};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Fetch the attachment bytes through its channel and save them to disk.
///
/// Returns the saved path, or `None` when the image could not be stored.
pub async fn save_reply_image(
    channel: &dyn Channel,
    attachment: &Attachment,
    data_dir: &str,
    group_id: &str,
    keyword: &str,
) -> Option<String> {
    let bytes = match channel.download(attachment).await {
        Ok(b) => b,
        Err(e) => {
            error!("failed to download reply image: {e}");
            return None;
        }
    };

    let images_dir = PathBuf::from(shellexpand(data_dir)).join("images");
    let path = reply_image_path(&images_dir, group_id, keyword, Local::now());

    match write_image(&path, &bytes).await {
        Ok(()) => {
            info!("saved reply image to {}", path.display());
            Some(path.to_string_lossy().to_string())
        }
        Err(e) => {
            error!("failed to save reply image to {}: {e}", path.display());
            None
        }
    }
}

/// Read a stored reply image. Missing or unreadable files yield `None`.
pub async fn load_image(path: &str) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("reply image {path} unavailable, skipping: {e}");
            None
        }
    }
}

async fn write_image(path: &Path, bytes: &[u8]) -> Result<(), ParrotError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// `reply_image_{group}_{keyword}_{YYYYmmdd_HHMMSS}.jpg` inside `dir`.
fn reply_image_path(dir: &Path, group_id: &str, keyword: &str, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "reply_image_{}_{}_{}.jpg",
        sanitize(group_id),
        sanitize(keyword),
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Keep letters, digits, `-` and `_`; anything else becomes `_`.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inline_image, RecordingChannel};
    use chrono::TimeZone;
    use parrot_core::{message::AttachmentType, traits::MemberRole};

    #[test]
    fn test_sanitize_replaces_path_characters() {
        assert_eq!(sanitize("map"), "map");
        assert_eq!(sanitize("新手攻略"), "新手攻略");
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize("re:\\d{3}"), "re__d_3_");
        assert_eq!(sanitize("-100123"), "-100123");
    }

    #[test]
    fn test_reply_image_path_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = reply_image_path(Path::new("/data/images"), "-100", "the map", now);
        assert_eq!(
            path,
            PathBuf::from("/data/images/reply_image_-100_the_map_20240309_070501.jpg")
        );
    }

    #[tokio::test]
    async fn test_save_inline_image_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").to_string_lossy().to_string();
        let channel = RecordingChannel::with_role(MemberRole::Member);

        let saved = save_reply_image(
            &channel,
            &inline_image(b"\xff\xd8jpeg"),
            &data_dir,
            "-1",
            "map",
        )
        .await
        .unwrap();

        assert!(saved.contains("/images/reply_image_-1_map_"));
        assert!(saved.ends_with(".jpg"));
        assert_eq!(load_image(&saved).await.unwrap(), b"\xff\xd8jpeg");
    }

    #[tokio::test]
    async fn test_attachment_without_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment {
            file_type: AttachmentType::Image,
            file_id: Some("remote".to_string()),
            data: None,
            filename: None,
        };
        let saved = save_reply_image(
            &RecordingChannel::with_role(MemberRole::Member),
            &attachment,
            &dir.path().to_string_lossy(),
            "-1",
            "map",
        )
        .await;
        assert!(saved.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_image_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.jpg");
        assert!(load_image(&missing.to_string_lossy()).await.is_none());
    }
}
