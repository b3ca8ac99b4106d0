use super::Store;
use parrot_core::config::StoreConfig;
use parrot_core::error::ParrotError;
use parrot_core::qa::{ContentItem, DeleteOutcome};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

fn text(s: &str) -> ContentItem {
    ContentItem::text(s).unwrap()
}

#[tokio::test]
async fn test_add_and_get_round_trip() {
    let store = test_store().await;
    store.add("g1", "hello", &[text("hi")]).await.unwrap();

    let replies = store.get("g1", "hello").await.unwrap();
    assert_eq!(replies, vec![text("hi")]);
}

#[tokio::test]
async fn test_multi_part_order_preserved() {
    let store = test_store().await;
    let parts = vec![
        text("first"),
        ContentItem::image("/data/images/map.jpg").unwrap(),
        text("last"),
    ];
    store.add("g1", "map", &parts).await.unwrap();

    assert_eq!(store.get("g1", "map").await.unwrap(), parts);
}

#[tokio::test]
async fn test_re_add_overwrites() {
    let store = test_store().await;
    store.add("g1", "k", &[text("A")]).await.unwrap();
    store.add("g1", "k", &[text("B")]).await.unwrap();

    assert_eq!(store.get("g1", "k").await.unwrap(), vec![text("B")]);
    assert_eq!(store.count_for_group("g1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_missing_is_empty() {
    let store = test_store().await;
    assert!(store.get("g1", "nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_present_and_absent() {
    let store = test_store().await;
    store.add("g1", "k", &[text("v")]).await.unwrap();
    store.add("g1", "other", &[text("w")]).await.unwrap();

    assert_eq!(store.delete("g1", "k").await.unwrap(), DeleteOutcome::Removed);
    assert!(store.get("g1", "k").await.unwrap().is_empty());

    assert_eq!(store.delete("g1", "k").await.unwrap(), DeleteOutcome::NotFound);
    // Unrelated entry untouched.
    assert_eq!(store.get("g1", "other").await.unwrap(), vec![text("w")]);
}

#[tokio::test]
async fn test_groups_are_isolated() {
    let store = test_store().await;
    store.add("g1", "k", &[text("one")]).await.unwrap();
    store.add("g2", "k", &[text("two")]).await.unwrap();

    assert_eq!(store.get("g1", "k").await.unwrap(), vec![text("one")]);
    assert_eq!(store.get("g2", "k").await.unwrap(), vec![text("two")]);

    store.delete("g1", "k").await.unwrap();
    assert_eq!(store.get("g2", "k").await.unwrap(), vec![text("two")]);
}

#[tokio::test]
async fn test_list_for_empty_group() {
    let store = test_store().await;
    let keywords = store.list_for_group("nobody").await.unwrap();
    assert!(keywords.is_empty());
}

#[tokio::test]
async fn test_list_keeps_registration_order() {
    let store = test_store().await;
    store.add("g1", "zeta", &[text("1")]).await.unwrap();
    store.add("g1", "alpha", &[text("2")]).await.unwrap();
    store.add("g1", "mid", &[text("3")]).await.unwrap();
    // Overwrite keeps the original slot.
    store.add("g1", "zeta", &[text("1b")]).await.unwrap();

    let keywords = store.list_for_group("g1").await.unwrap();
    assert_eq!(
        keywords.keywords().collect::<Vec<_>>(),
        vec!["zeta", "alpha", "mid"]
    );
    assert_eq!(keywords.get("zeta").unwrap(), &[text("1b")]);
}

#[tokio::test]
async fn test_list_skips_corrupt_rows() {
    let store = test_store().await;
    store.add("g1", "good", &[text("ok")]).await.unwrap();
    sqlx::query("INSERT INTO qa_entries (group_id, keyword, replies) VALUES ('g1', 'bad', 'not json')")
        .execute(store.pool())
        .await
        .unwrap();

    let keywords = store.list_for_group("g1").await.unwrap();
    assert_eq!(keywords.len(), 1);
    assert!(keywords.get("good").is_some());
}

#[tokio::test]
async fn test_invalid_arguments_rejected_without_mutation() {
    let store = test_store().await;

    let err = store.add("", "k", &[text("v")]).await.unwrap_err();
    assert!(matches!(err, ParrotError::InvalidArgument(_)));
    let err = store.add("g1", "", &[text("v")]).await.unwrap_err();
    assert!(matches!(err, ParrotError::InvalidArgument(_)));
    let err = store.add("g1", "k", &[]).await.unwrap_err();
    assert!(matches!(err, ParrotError::InvalidArgument(_)));
    let err = store.delete("g1", "").await.unwrap_err();
    assert!(matches!(err, ParrotError::InvalidArgument(_)));
    let err = store.set_invitation_url("", "http://x").await.unwrap_err();
    assert!(matches!(err, ParrotError::InvalidArgument(_)));

    assert!(store.list_for_group("").await.unwrap().is_empty());
    assert!(store.list_for_group("g1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invitation_url_round_trip() {
    let store = test_store().await;
    assert_eq!(store.get_invitation_url("g1").await.unwrap(), None);

    store
        .set_invitation_url("g1", "https://example.com/invite?g=1")
        .await
        .unwrap();
    assert_eq!(
        store.get_invitation_url("g1").await.unwrap().as_deref(),
        Some("https://example.com/invite?g=1")
    );

    store
        .set_invitation_url("g1", "https://example.com/v2")
        .await
        .unwrap();
    assert_eq!(
        store.get_invitation_url("g1").await.unwrap().as_deref(),
        Some("https://example.com/v2")
    );
    assert_eq!(store.get_invitation_url("g2").await.unwrap(), None);
}

#[tokio::test]
async fn test_operations_fail_after_close() {
    let store = test_store().await;
    store.add("g1", "k", &[text("v")]).await.unwrap();

    store.close().await;
    store.close().await;
    assert!(store.is_closed());

    assert!(matches!(
        store.add("g1", "k", &[text("v")]).await,
        Err(ParrotError::Closed)
    ));
    assert!(matches!(store.get("g1", "k").await, Err(ParrotError::Closed)));
    assert!(matches!(
        store.list_for_group("g1").await,
        Err(ParrotError::Closed)
    ));
    assert!(matches!(store.delete("g1", "k").await, Err(ParrotError::Closed)));
    assert!(matches!(
        store.get_invitation_url("g1").await,
        Err(ParrotError::Closed)
    ));
}

#[tokio::test]
async fn test_concurrent_adds_same_keyword() {
    let store = test_store().await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let parts = vec![text(&format!("part-a-{i}")), text(&format!("part-b-{i}"))];
            store.add("g1", "race", &parts).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    // Last commit wins, and the list is never a mix of two writers.
    let replies = store.get("g1", "race").await.unwrap();
    assert_eq!(replies.len(), 2);
    let suffix = replies[0].content().trim_start_matches("part-a-").to_string();
    assert_eq!(replies[1].content(), format!("part-b-{suffix}"));
}

/// Readers on other connections only ever see one writer's complete list.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshots_never_see_partial_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("qa.db").to_string_lossy().to_string(),
        max_connections: 4,
    };
    let store = Store::new(&config).await.unwrap();
    store
        .add("g1", "race", &[text("a-init"), text("b-init")])
        .await
        .unwrap();

    let mut writers = Vec::new();
    for w in 0..3 {
        let store = store.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..30 {
                let tag = format!("{w}-{i}");
                let parts = vec![text(&format!("a-{tag}")), text(&format!("b-{tag}"))];
                store.add("g1", "race", &parts).await.unwrap();
            }
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..3 {
        let store = store.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..60 {
                let snapshot = store.list_for_group("g1").await.unwrap();
                let replies = snapshot.get("race").unwrap();
                assert_eq!(replies.len(), 2);
                let a = replies[0].content().strip_prefix("a-").unwrap();
                let b = replies[1].content().strip_prefix("b-").unwrap();
                assert_eq!(a, b, "snapshot mixes two writers");
                tokio::task::yield_now().await;
            }
        }));
    }

    for h in writers.into_iter().chain(readers) {
        h.await.unwrap();
    }
    store.close().await;
}

#[tokio::test]
async fn test_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("nested/qa.db").to_string_lossy().to_string(),
        max_connections: 2,
    };

    let store = Store::new(&config).await.unwrap();
    store.add("g1", "k", &[text("kept")]).await.unwrap();
    store.set_invitation_url("g1", "http://invite").await.unwrap();
    assert!(store.db_size().await.unwrap() > 0);
    store.close().await;

    let reopened = Store::new(&config).await.unwrap();
    assert_eq!(reopened.get("g1", "k").await.unwrap(), vec![text("kept")]);
    assert_eq!(
        reopened.get_invitation_url("g1").await.unwrap().as_deref(),
        Some("http://invite")
    );
    reopened.close().await;
}
