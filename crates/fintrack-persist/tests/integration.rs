//! Integration tests for the `fintrack-persist` layer.
//!
//! Everything here runs against the in-process engine, so no services are
//! required. The one remote test needs a live Redis-compatible server and
//! is marked `#[ignore]`:
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7
//! cargo test -p fintrack-persist -- --ignored
//! ```

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::items_after_statements,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fintrack_persist::{
    RateLimiter, SnapshotStore, TransactionIndex, TransactionKind, TransactionRecord, keys,
};
use fintrack_store::{RedisStore, StoreHandle};

/// Redis connection URL for the local Docker instance.
const REDIS_URL: &str = "redis://localhost:6379";

/// A sample budget payload persisted through the snapshot store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Budget {
    month: String,
    total: f64,
}

fn sample_budget(total: f64) -> Budget {
    Budget {
        month: "2026-08".to_owned(),
        total,
    }
}

// =============================================================================
// Snapshot store
// =============================================================================

#[tokio::test]
async fn write_then_read_returns_the_same_value() {
    let store = SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");

    let written = store.write(sample_budget(420.0)).await.unwrap();
    let read = store.read().await.unwrap().expect("item should exist");

    assert_eq!(read.value, sample_budget(420.0));
    assert_eq!(read.checksum, written.checksum);
    assert_eq!(read.updated_at, written.updated_at);
    assert!(read.is_intact().unwrap());
}

#[tokio::test]
async fn read_of_unwritten_subject_is_absent() {
    let store: SnapshotStore<Budget> =
        SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");
    assert!(store.read().await.unwrap().is_none());

    let bundle = store.export_all().await.unwrap();
    assert!(bundle.current.is_none());
    assert!(bundle.backups.is_empty());
}

#[tokio::test]
async fn reads_are_idempotent_without_intervening_writes() {
    let store = SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");
    store.write(sample_budget(10.0)).await.unwrap();

    let first = store.read().await.unwrap().unwrap();
    let second = store.read().await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn each_write_appends_one_backup() {
    let store = SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");
    for n in 1..=4 {
        store.write(sample_budget(f64::from(n))).await.unwrap();
    }

    let bundle = store.export_all().await.unwrap();
    assert_eq!(bundle.backups.len(), 4);

    // Backups come back oldest first; the last one matches the current item.
    let totals: Vec<f64> = bundle.backups.iter().map(|b| b.value.total).collect();
    assert_eq!(totals, vec![1.0, 2.0, 3.0, 4.0]);
    let current = bundle.current.expect("current item should exist");
    assert_eq!(current.value, sample_budget(4.0));
}

#[tokio::test]
async fn write_prunes_backups_older_than_the_retention_window() {
    let handle = StoreHandle::in_memory();
    let store = SnapshotStore::new(handle.clone(), "u1", "budget");

    // Seed a 31-day-old snapshot directly into the history set.
    let stale_item = serde_json::json!({
        "value": { "month": "2026-07", "total": 1.0 },
        "checksum": "0",
        "updatedAt": "2026-07-30T00:00:00Z",
    });
    let thirty_one_days_ms: i64 = 31 * 24 * 60 * 60 * 1000;
    let stale_score = Utc::now()
        .timestamp_millis()
        .checked_sub(thirty_one_days_ms)
        .unwrap();
    let backups_key = keys::user_data_backups("u1", "budget");
    handle
        .sorted_set_add(
            &backups_key,
            stale_score as f64,
            &stale_item.to_string(),
        )
        .await
        .unwrap();

    // Pruning is write-triggered: the stale entry survives until a write.
    assert_eq!(
        handle
            .sorted_set_range_by_score(&backups_key, 0.0, f64::MAX)
            .await
            .unwrap()
            .len(),
        1
    );

    store.write(sample_budget(2.0)).await.unwrap();

    let bundle = store.export_all().await.unwrap();
    assert_eq!(bundle.backups.len(), 1);
    assert_eq!(bundle.backups[0].value.total, 2.0);
}

#[tokio::test]
async fn equal_values_written_twice_share_a_checksum() {
    let store = SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");
    let first = store.write(sample_budget(99.0)).await.unwrap();
    let second = store.write(sample_budget(99.0)).await.unwrap();
    assert_eq!(first.checksum, second.checksum);

    let different = store.write(sample_budget(100.0)).await.unwrap();
    assert_ne!(first.checksum, different.checksum);
}

#[tokio::test]
async fn export_bundle_serializes_in_camel_case() {
    let store = SnapshotStore::new(StoreHandle::in_memory(), "u1", "budget");
    store.write(sample_budget(5.0)).await.unwrap();

    let bundle = store.export_all().await.unwrap();
    let json = serde_json::to_value(&bundle).unwrap();
    let current = json.get("current").expect("current field");
    assert!(current.get("updatedAt").is_some());
    assert!(current.get("checksum").is_some());
    assert!(json.get("backups").unwrap().is_array());
}

// =============================================================================
// Rate limiter
// =============================================================================

#[tokio::test]
async fn fourth_request_over_a_limit_of_three_is_rejected() {
    let limiter = RateLimiter::new(StoreHandle::in_memory());

    let mut limited = Vec::new();
    let mut remaining = Vec::new();
    for _ in 0..4 {
        let decision = limiter.allow("login", "10.0.0.1", 3, 60).await;
        limited.push(decision.limited);
        remaining.push(decision.remaining);
        assert_eq!(decision.limit, 3);
    }

    assert_eq!(limited, vec![false, false, false, true]);
    assert_eq!(remaining, vec![2, 1, 0, 0]);
}

#[tokio::test]
async fn identities_get_independent_windows() {
    let limiter = RateLimiter::new(StoreHandle::in_memory());

    for _ in 0..3 {
        limiter.allow("login", "10.0.0.1", 3, 60).await;
    }
    assert!(limiter.allow("login", "10.0.0.1", 3, 60).await.limited);
    assert!(!limiter.allow("login", "10.0.0.2", 3, 60).await.limited);
    assert!(!limiter.allow("signup", "10.0.0.1", 3, 60).await.limited);
}

#[tokio::test]
async fn unavailable_store_falls_back_to_local_buckets() {
    // A client that was never connected: every command fails with
    // `Unavailable`, which the limiter absorbs.
    let offline = RedisStore::new("redis://127.0.0.1:1").unwrap();
    let limiter = RateLimiter::new(StoreHandle::Remote(offline));

    let mut limited = Vec::new();
    for _ in 0..4 {
        let decision = limiter.allow("login", "10.0.0.9", 3, 60).await;
        assert!(decision.reset_seconds <= 60);
        limited.push(decision.limited);
    }

    // Counts are tracked per process: the window behaves normally.
    assert_eq!(limited, vec![false, false, false, true]);
}

// =============================================================================
// Transaction index
// =============================================================================

#[tokio::test]
async fn index_returns_transactions_most_recent_first() {
    let user = Uuid::new_v4();
    let index = TransactionIndex::new(StoreHandle::in_memory(), user);

    let rent = TransactionRecord::new(user, TransactionKind::Expense, 1200.0, "rent");
    let salary = TransactionRecord::new(user, TransactionKind::Income, 3000.0, "salary");
    index.add(&rent).await.unwrap();
    index.add(&salary).await.unwrap();

    let all = index.all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, salary.id);
    assert_eq!(all[1].id, rent.id);

    let recent = index.recent(1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, salary.id);
}

#[tokio::test]
async fn remove_deletes_entity_and_index_entry() {
    let user = Uuid::new_v4();
    let index = TransactionIndex::new(StoreHandle::in_memory(), user);

    let tx = TransactionRecord::new(user, TransactionKind::Expense, 9.5, "coffee");
    index.add(&tx).await.unwrap();

    assert!(index.remove(tx.id).await.unwrap());
    assert!(index.all().await.unwrap().is_empty());

    // Removing again reports nothing removed.
    assert!(!index.remove(tx.id).await.unwrap());
}

#[tokio::test]
async fn remove_refuses_other_users_transactions() {
    let owner = Uuid::new_v4();
    let handle = StoreHandle::in_memory();
    let owner_index = TransactionIndex::new(handle.clone(), owner);

    let tx = TransactionRecord::new(owner, TransactionKind::Expense, 50.0, "books");
    owner_index.add(&tx).await.unwrap();

    let intruder_index = TransactionIndex::new(handle, Uuid::new_v4());
    assert!(!intruder_index.remove(tx.id).await.unwrap());
    assert_eq!(owner_index.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn dangling_index_ids_are_skipped() {
    let user = Uuid::new_v4();
    let handle = StoreHandle::in_memory();
    let index = TransactionIndex::new(handle.clone(), user);

    let tx = TransactionRecord::new(user, TransactionKind::Expense, 20.0, "misc");
    index.add(&tx).await.unwrap();

    // Delete the entity behind the index's back.
    handle
        .delete(&keys::tx_entity(&tx.id.to_string()))
        .await
        .unwrap();

    assert!(index.all().await.unwrap().is_empty());
}

// =============================================================================
// Remote path (requires live Redis)
// =============================================================================

#[tokio::test]
#[ignore]
async fn snapshot_round_trip_against_live_redis() {
    let store = RedisStore::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    let handle = StoreHandle::Remote(store);

    let owner = format!("it-{}", Uuid::new_v4());
    let snapshots = SnapshotStore::new(handle.clone(), owner.as_str(), "budget");

    let written = snapshots.write(sample_budget(77.0)).await.unwrap();
    let read = snapshots.read().await.unwrap().expect("item should exist");
    assert_eq!(read.value, written.value);
    assert_eq!(read.checksum, written.checksum);

    let bundle = snapshots.export_all().await.unwrap();
    assert_eq!(bundle.backups.len(), 1);

    handle
        .delete(&keys::user_data(&owner, "budget"))
        .await
        .unwrap();
    handle
        .delete(&keys::user_data_backups(&owner, "budget"))
        .await
        .unwrap();
}
