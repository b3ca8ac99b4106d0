use super::*;
use crate::testing::{
    group_message, inline_image, private_message, test_store, RecordingChannel, GROUP,
};
use parrot_core::{qa::ContentItem, traits::MemberRole};

struct Harness {
    gateway: Gateway,
    channel: Arc<RecordingChannel>,
    _db_dir: tempfile::TempDir,
    data_dir: tempfile::TempDir,
}

async fn harness_with(role: MemberRole, registration_timeout_secs: u64) -> Harness {
    let (store, db_dir) = test_store().await;
    let data_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.auth.admins = vec!["1".to_string()];
    config.parrot.data_dir = data_dir.path().to_string_lossy().to_string();
    config.registration.timeout_secs = registration_timeout_secs;

    let channel = Arc::new(RecordingChannel::with_role(role));
    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert("telegram".to_string(), channel.clone());

    Harness {
        gateway: Gateway::new(channels, store, &config),
        channel,
        _db_dir: db_dir,
        data_dir,
    }
}

async fn harness() -> Harness {
    harness_with(MemberRole::Admin, 60).await
}

fn text(s: &str) -> ContentItem {
    ContentItem::text(s).unwrap()
}

#[tokio::test]
async fn test_matching_keyword_replays_parts_in_order() {
    let h = harness().await;
    h.gateway
        .store
        .add(GROUP, "map", &[text("see pinned"), text("or ask a mod")])
        .await
        .unwrap();

    h.gateway
        .handle_message(group_message("9", "where is the map?"))
        .await;

    assert_eq!(h.channel.texts(), vec!["see pinned", "or ask a mod"]);
}

#[tokio::test]
async fn test_every_matching_keyword_replies() {
    let h = harness().await;
    let store = &h.gateway.store;
    store.add(GROUP, "map", &[text("A")]).await.unwrap();
    store.add(GROUP, "guide", &[text("B")]).await.unwrap();
    store.add(GROUP, "zebra", &[text("C")]).await.unwrap();

    h.gateway
        .handle_message(group_message("9", "map and guide please"))
        .await;

    assert_eq!(h.channel.texts(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_non_matching_message_is_silent() {
    let h = harness().await;
    h.gateway
        .store
        .add(GROUP, "map", &[text("see pinned")])
        .await
        .unwrap();

    h.gateway
        .handle_message(group_message("9", "good morning"))
        .await;

    assert!(h.channel.texts().is_empty());
}

#[tokio::test]
async fn test_private_chat_is_ignored() {
    let h = harness().await;
    h.gateway
        .store
        .add(GROUP, "map", &[text("see pinned")])
        .await
        .unwrap();

    h.gateway.handle_message(private_message("9", "map")).await;
    assert!(h.channel.texts().is_empty());

    h.gateway
        .handle_message(private_message("9", "/addkw map"))
        .await;
    assert_eq!(h.channel.texts(), vec![GROUP_ONLY]);
}

#[tokio::test]
async fn test_unknown_command_is_not_scanned() {
    let h = harness().await;
    h.gateway
        .store
        .add(GROUP, "map", &[text("see pinned")])
        .await
        .unwrap();

    h.gateway.handle_message(group_message("9", "/map")).await;
    assert!(h.channel.texts().is_empty());
}

#[tokio::test]
async fn test_image_part_sent_as_photo_and_missing_file_skipped() {
    let h = harness().await;
    let image_path = h.data_dir.path().join("map.jpg");
    std::fs::write(&image_path, b"jpeg-bytes").unwrap();
    let missing = h.data_dir.path().join("gone.jpg");

    h.gateway
        .store
        .add(
            GROUP,
            "map",
            &[
                ContentItem::image(image_path.to_string_lossy().to_string()).unwrap(),
                ContentItem::image(missing.to_string_lossy().to_string()).unwrap(),
                text("see above"),
            ],
        )
        .await
        .unwrap();

    h.gateway.handle_message(group_message("9", "map")).await;

    assert_eq!(h.channel.photos(), vec![b"jpeg-bytes".to_vec()]);
    assert_eq!(h.channel.texts(), vec!["see above"]);
}

#[tokio::test]
async fn test_addkw_flow_saves_text_and_image() {
    let h = harness().await;

    h.gateway
        .handle_message(group_message("1", "/addkw map"))
        .await;
    assert_eq!(h.channel.texts(), vec![AWAITING_REPLY]);

    // Another member talking in between does not complete the session.
    h.gateway
        .handle_message(group_message("9", "hello all"))
        .await;

    let mut reply = group_message("1", "see pinned");
    reply.attachments.push(inline_image(b"jpeg"));
    h.gateway.handle_message(reply).await;

    assert_eq!(
        h.channel.texts(),
        vec![AWAITING_REPLY, registration::KEYWORD_ADDED]
    );

    let saved = h.gateway.store.get(GROUP, "map").await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0], text("see pinned"));
    assert_eq!(saved[1].kind(), ContentKind::ImageReference);
    assert!(std::path::Path::new(saved[1].content()).exists());
}

#[tokio::test]
async fn test_addkw_denied_opens_no_session() {
    let h = harness_with(MemberRole::Member, 60).await;

    h.gateway
        .handle_message(group_message("1", "/addkw map"))
        .await;
    h.gateway
        .handle_message(group_message("1", "see pinned"))
        .await;

    assert_eq!(
        h.channel.texts(),
        vec!["You do not have permission to add keywords"]
    );
    assert!(h.gateway.store.get(GROUP, "map").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_session_reports_timeout_and_saves_nothing() {
    let h = harness_with(MemberRole::Admin, 0).await;

    h.gateway
        .handle_message(group_message("1", "/addkw map"))
        .await;
    h.gateway
        .handle_message(group_message("1", "see pinned"))
        .await;

    assert_eq!(h.channel.texts(), vec![AWAITING_REPLY, TIMED_OUT]);
    assert!(h.gateway.store.get(GROUP, "map").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invitation_without_url() {
    let h = harness().await;
    h.gateway
        .handle_message(group_message("9", "what is the invitation code?"))
        .await;
    assert_eq!(h.channel.texts(), vec![NO_INVITE_URL]);
}

#[tokio::test]
async fn test_invitation_trigger_in_chinese() {
    let h = harness().await;
    h.gateway
        .handle_message(group_message("9", "请问邀请码是多少"))
        .await;
    assert_eq!(h.channel.texts(), vec![NO_INVITE_URL]);
}

#[tokio::test]
async fn test_invitation_fetch_failure_is_reported() {
    let h = harness().await;
    h.gateway
        .store
        .set_invitation_url(GROUP, "http://127.0.0.1:9/invite")
        .await
        .unwrap();

    h.gateway
        .handle_message(group_message("9", "invitation code please"))
        .await;
    assert_eq!(h.channel.texts(), vec![invite::FETCH_FAILED]);
}

#[tokio::test]
async fn test_shutdown_closes_store() {
    let h = harness().await;
    h.gateway.shutdown().await;
    assert!(h.gateway.store.is_closed());
}

#[tokio::test]
async fn test_addkw_keeps_text_when_image_download_fails() {
    let h = harness().await;

    h.gateway
        .handle_message(group_message("1", "/addkw map"))
        .await;

    let mut reply = group_message("1", "see pinned");
    let mut remote = inline_image(b"unused");
    remote.data = None;
    remote.file_id = Some("remote-file".to_string());
    reply.attachments.push(remote);
    h.gateway.handle_message(reply).await;

    assert_eq!(
        h.gateway.store.get(GROUP, "map").await.unwrap(),
        vec![text("see pinned")]
    );
}
