//! Versioned, checksummed snapshot persistence.
//!
//! A [`SnapshotStore`] is bound to one subject, an `(owner, data type)`
//! pair, and keeps two things for it: the authoritative current value at
//! the subject's primary key, and a rolling 30-day history of snapshots in
//! a sorted set scored by write time. History pruning happens
//! opportunistically on every write; there is no background process.
//!
//! # Write semantics
//!
//! The current-value update and the backup append are independent commands,
//! not a transaction. If the primary write succeeds and the backup append
//! fails, the current value stays updated and the history is simply
//! incomplete: best-effort history, authoritative current value.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use fintrack_store::{StoreHandle, StoreResult};

use crate::checksum::checksum_of;
use crate::keys;

/// How long backup snapshots are retained.
const RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// A stored value paired with an integrity checksum and a write timestamp.
///
/// The checksum is a deterministic function of the value's serialized form
/// and detects accidental corruption only. `updated_at` is stamped on every
/// write and is monotonically non-decreasing for a single writer, but
/// nothing in this layer uses it (or the checksum) for conflict detection
/// between writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedItem<T> {
    /// The stored value.
    pub value: T,
    /// Rolling hash of the value's serialized form, as a decimal string.
    pub checksum: String,
    /// When this item was written.
    pub updated_at: DateTime<Utc>,
}

impl<T: Serialize> VersionedItem<T> {
    /// Recompute the checksum from the value and compare it to the stored
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`](fintrack_store::StoreError::Serialization)
    /// if the value cannot be re-serialized.
    pub fn is_intact(&self) -> StoreResult<bool> {
        Ok(checksum_of(&self.value)? == self.checksum)
    }
}

/// Everything retained for a subject: the current item plus its history,
/// oldest backup first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle<T> {
    /// The current item, or `None` if the subject was never written.
    pub current: Option<VersionedItem<T>>,
    /// Retained snapshots in ascending timestamp order.
    pub backups: Vec<VersionedItem<T>>,
}

/// Checksummed current-value storage plus rolling snapshot history for one
/// subject.
pub struct SnapshotStore<T> {
    store: StoreHandle,
    owner_id: String,
    data_type: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> SnapshotStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a snapshot store to `(owner_id, data_type)` over the given
    /// handle.
    pub fn new(
        store: StoreHandle,
        owner_id: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
            data_type: data_type.into(),
            _value: PhantomData,
        }
    }

    fn data_key(&self) -> String {
        keys::user_data(&self.owner_id, &self.data_type)
    }

    fn backups_key(&self) -> String {
        keys::user_data_backups(&self.owner_id, &self.data_type)
    }

    /// Write `value` as the subject's current item and append a backup
    /// snapshot, then prune history older than the retention window.
    ///
    /// Returns the written item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`](fintrack_store::StoreError::Serialization)
    /// if the value cannot be serialized, or
    /// [`StoreError::Unavailable`](fintrack_store::StoreError::Unavailable)
    /// if a command fails. There is no rollback: a failure after the primary
    /// write leaves the current value updated.
    pub async fn write(&self, value: T) -> StoreResult<VersionedItem<T>> {
        let checksum = checksum_of(&value)?;
        let updated_at = Utc::now();
        let item = VersionedItem {
            value,
            checksum,
            updated_at,
        };

        self.store.set_json(&self.data_key(), &item).await?;

        // Snapshot into the history sorted set, scored by write time.
        let now_ms = updated_at.timestamp_millis();
        let member = serde_json::to_string(&item)?;
        let backups_key = self.backups_key();
        self.store
            .sorted_set_add(&backups_key, millis_to_score(now_ms), &member)
            .await?;

        // Keep the last 30 days of snapshots.
        let min_score = now_ms.saturating_sub(RETENTION_MS);
        self.store
            .sorted_set_remove_range_by_score(&backups_key, 0.0, millis_to_score(min_score))
            .await?;

        tracing::debug!(
            owner = %self.owner_id,
            data_type = %self.data_type,
            "wrote versioned snapshot"
        );
        Ok(item)
    }

    /// Read the subject's current item; `None` if never written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](fintrack_store::StoreError::Unavailable)
    /// if the read fails, or
    /// [`StoreError::Serialization`](fintrack_store::StoreError::Serialization)
    /// if the stored item does not deserialize.
    pub async fn read(&self) -> StoreResult<Option<VersionedItem<T>>> {
        self.store.get_json(&self.data_key()).await
    }

    /// Export the current item plus every retained backup, oldest backup
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](fintrack_store::StoreError::Unavailable)
    /// if a read fails, or
    /// [`StoreError::Serialization`](fintrack_store::StoreError::Serialization)
    /// if a stored entry does not deserialize.
    pub async fn export_all(&self) -> StoreResult<ExportBundle<T>> {
        let current = self.read().await?;

        let now_ms = Utc::now().timestamp_millis();
        let raw = self
            .store
            .sorted_set_range_by_score(&self.backups_key(), 0.0, millis_to_score(now_ms))
            .await?;

        let mut backups = Vec::with_capacity(raw.len());
        for entry in &raw {
            backups.push(serde_json::from_str(entry)?);
        }
        Ok(ExportBundle { current, backups })
    }
}

// Epoch-millis timestamps fit in f64's 53-bit integer range for the next
// few hundred thousand years.
#[allow(clippy::cast_precision_loss)]
const fn millis_to_score(ms: i64) -> f64 {
    ms as f64
}
