//! The per-user transaction index.
//!
//! Transaction records are stored individually at `tx:entity:{id}` while a
//! list at `tx:index:{userId}` keeps their ids most-recent-first. Reads
//! range the index and then fetch the entities in one batched round trip;
//! ids whose entity has disappeared are skipped rather than surfaced as
//! errors.

use uuid::Uuid;

use fintrack_store::{BatchReply, StoreHandle, StoreResult};

use crate::keys;
use crate::records::TransactionRecord;

/// List-backed index of one user's transactions.
pub struct TransactionIndex {
    store: StoreHandle,
    user_id: Uuid,
}

impl TransactionIndex {
    /// Bind an index to `user_id` over the given handle.
    pub const fn new(store: StoreHandle, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    fn index_key(&self) -> String {
        keys::tx_index(&self.user_id.to_string())
    }

    /// Store `tx` and push its id onto the front of the index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](fintrack_store::StoreError) if serialization
    /// or a store command fails.
    pub async fn add(&self, tx: &TransactionRecord) -> StoreResult<()> {
        let id = tx.id.to_string();
        self.store.set_json(&keys::tx_entity(&id), tx).await?;
        self.store.list_push_front(&self.index_key(), &id).await?;
        Ok(())
    }

    /// The user's `count` most recent transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](fintrack_store::StoreError) if a store
    /// command or deserialization fails.
    pub async fn recent(&self, count: u32) -> StoreResult<Vec<TransactionRecord>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let stop = i64::from(count).saturating_sub(1);
        let ids = self.store.list_range(&self.index_key(), 0, stop).await?;
        self.fetch(&ids).await
    }

    /// Every transaction in the index, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](fintrack_store::StoreError) if a store
    /// command or deserialization fails.
    pub async fn all(&self) -> StoreResult<Vec<TransactionRecord>> {
        let ids = self.store.list_range(&self.index_key(), 0, -1).await?;
        self.fetch(&ids).await
    }

    /// Delete the transaction with `tx_id` if it exists and belongs to this
    /// user; returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](fintrack_store::StoreError) if a store
    /// command fails.
    pub async fn remove(&self, tx_id: Uuid) -> StoreResult<bool> {
        let id = tx_id.to_string();
        let entity_key = keys::tx_entity(&id);
        let Some(tx) = self.store.get_json::<TransactionRecord>(&entity_key).await? else {
            return Ok(false);
        };
        if tx.user_id != self.user_id {
            return Ok(false);
        }
        self.store.delete(&entity_key).await?;
        self.store.list_remove(&self.index_key(), 0, &id).await?;
        Ok(true)
    }

    /// Fetch entities for `ids` in one batched round trip, skipping ids
    /// whose entity is gone.
    async fn fetch(&self, ids: &[String]) -> StoreResult<Vec<TransactionRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut batch = self.store.batch();
        for id in ids {
            batch.get(&keys::tx_entity(id));
        }
        let replies = batch.exec().await?;

        let mut records = Vec::with_capacity(replies.len());
        for reply in replies {
            if let BatchReply::Value(Some(json)) = reply {
                records.push(serde_json::from_str(&json)?);
            }
        }
        Ok(records)
    }
}
