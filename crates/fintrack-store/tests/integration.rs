//! Integration tests for the `fintrack-store` layer.
//!
//! The in-process engine tests run unconditionally. The remote tests need a
//! live Redis-compatible server:
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7
//! cargo test -p fintrack-store -- --ignored
//! ```
//!
//! Remote tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::items_after_statements,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing
)]

use fintrack_store::{BatchReply, RedisStore, StoreConfig, StoreHandle, StoreSelector};

/// Redis connection URL for the local Docker instance.
const REDIS_URL: &str = "redis://localhost:6379";

// =============================================================================
// In-process engine through the handle
// =============================================================================

#[tokio::test]
async fn memory_handle_serves_the_full_surface() {
    let handle = StoreHandle::in_memory();

    handle.set("scalar", "1").await.unwrap();
    assert_eq!(handle.get("scalar").await.unwrap().as_deref(), Some("1"));
    handle.delete("scalar").await.unwrap();
    assert_eq!(handle.get("scalar").await.unwrap(), None);

    assert_eq!(handle.increment("count").await.unwrap(), 1);
    assert_eq!(handle.increment("count").await.unwrap(), 2);

    handle.list_push_front("l", "a").await.unwrap();
    handle.list_push_front("l", "b").await.unwrap();
    assert_eq!(handle.list_range("l", 0, -1).await.unwrap(), vec!["b", "a"]);

    handle.sorted_set_add("z", 5.0, "x").await.unwrap();
    handle.sorted_set_add("z", 1.0, "y").await.unwrap();
    assert_eq!(
        handle.sorted_set_range_by_score("z", 0.0, 10.0).await.unwrap(),
        vec!["y", "x"]
    );
}

#[tokio::test]
async fn memory_handle_expiry_is_lazy_and_immediate_at_zero() {
    let handle = StoreHandle::in_memory();
    handle.set("k", "v").await.unwrap();
    handle.expire("k", 0).await.unwrap();
    assert_eq!(handle.get("k").await.unwrap(), None);
    assert_eq!(handle.list_range("k", 0, -1).await.unwrap().len(), 0);
}

#[tokio::test]
async fn memory_batch_returns_replies_in_submission_order() {
    let handle = StoreHandle::in_memory();
    handle.set("one", "1").await.unwrap();

    let mut batch = handle.batch();
    batch.get("one").set("two", "2").get("two").get("missing");
    assert_eq!(batch.len(), 4);
    let replies = batch.exec().await.unwrap();

    assert_eq!(
        replies,
        vec![
            BatchReply::Value(Some("1".to_owned())),
            BatchReply::Ack,
            BatchReply::Value(Some("2".to_owned())),
            BatchReply::Value(None),
        ]
    );
}

#[tokio::test]
async fn json_helpers_round_trip_through_the_handle() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Payload {
        label: String,
        n: u32,
    }

    let handle = StoreHandle::in_memory();
    let payload = Payload {
        label: "hello".to_owned(),
        n: 7,
    };
    handle.set_json("p", &payload).await.unwrap();
    let back: Payload = handle.get_json("p").await.unwrap().unwrap();
    assert_eq!(back, payload);

    let absent: Option<Payload> = handle.get_json("missing").await.unwrap();
    assert!(absent.is_none());
}

// =============================================================================
// Selector / degradation policy
// =============================================================================

#[tokio::test]
async fn selector_without_configuration_uses_the_engine() {
    let selector = StoreSelector::new(StoreConfig::default());
    let handle = selector.resolve().await;
    assert!(matches!(handle, StoreHandle::Memory(_)));
}

#[tokio::test]
async fn selector_demotion_is_sticky_across_resolutions() {
    let selector = StoreSelector::new(StoreConfig::with_url("redis://127.0.0.1:1"));

    let first = selector.resolve().await;
    assert!(matches!(first, StoreHandle::Memory(_)));
    assert!(selector.is_demoted());

    // Data written through one resolution is visible through the next:
    // the fallback engine is shared, not rebuilt.
    first.set("seen", "yes").await.unwrap();
    let second = selector.resolve().await;
    assert_eq!(second.get("seen").await.unwrap().as_deref(), Some("yes"));
}

// =============================================================================
// Remote store (requires live Redis)
// =============================================================================

#[tokio::test]
#[ignore]
async fn remote_scalar_and_counter_commands() {
    let store = RedisStore::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    let handle = StoreHandle::Remote(store);

    handle.delete("it:scalar").await.unwrap();
    handle.set("it:scalar", "v").await.unwrap();
    assert_eq!(handle.get("it:scalar").await.unwrap().as_deref(), Some("v"));

    handle.delete("it:count").await.unwrap();
    assert_eq!(handle.increment("it:count").await.unwrap(), 1);
    assert_eq!(handle.increment("it:count").await.unwrap(), 2);

    handle.delete("it:scalar").await.unwrap();
    handle.delete("it:count").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn remote_list_and_sorted_set_commands_match_engine_semantics() {
    let store = RedisStore::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    let handle = StoreHandle::Remote(store);

    handle.delete("it:l").await.unwrap();
    handle.list_push_front("it:l", "a").await.unwrap();
    handle.list_push_front("it:l", "b").await.unwrap();
    assert_eq!(
        handle.list_range("it:l", 0, -1).await.unwrap(),
        vec!["b", "a"]
    );
    assert_eq!(handle.list_remove("it:l", 0, "a").await.unwrap(), 1);

    handle.delete("it:z").await.unwrap();
    handle.sorted_set_add("it:z", 5.0, "x").await.unwrap();
    handle.sorted_set_add("it:z", 1.0, "y").await.unwrap();
    assert_eq!(
        handle
            .sorted_set_range_by_score("it:z", 0.0, 10.0)
            .await
            .unwrap(),
        vec!["y", "x"]
    );
    assert_eq!(
        handle
            .sorted_set_remove_range_by_score("it:z", 0.0, 10.0)
            .await
            .unwrap(),
        2
    );

    handle.delete("it:l").await.unwrap();
    handle.delete("it:z").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn remote_batch_pipelines_in_submission_order() {
    let store = RedisStore::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    let handle = StoreHandle::Remote(store);

    handle.delete("it:b1").await.unwrap();
    handle.delete("it:b2").await.unwrap();
    handle.set("it:b1", "1").await.unwrap();

    let mut batch = handle.batch();
    batch.get("it:b1").set("it:b2", "2").get("it:b2");
    let replies = batch.exec().await.unwrap();

    assert_eq!(
        replies,
        vec![
            BatchReply::Value(Some("1".to_owned())),
            BatchReply::Ack,
            BatchReply::Value(Some("2".to_owned())),
        ]
    );

    handle.delete("it:b1").await.unwrap();
    handle.delete("it:b2").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn selector_with_live_remote_resolves_remote() {
    let selector = StoreSelector::new(StoreConfig::with_url(REDIS_URL));
    let handle = selector.resolve().await;
    assert!(matches!(handle, StoreHandle::Remote(_)));
    assert!(!selector.is_demoted());
}
