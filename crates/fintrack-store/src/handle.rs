//! The primitive store command surface.
//!
//! [`StoreHandle`] is the one interface every higher layer depends on:
//! scalar get/set/delete, counter increment, key expiry, list push/range/
//! remove, sorted-set add/range/remove-by-score, and batched execution.
//! Results are identical regardless of which backing implementation served
//! them.
//!
//! The handle is an explicit dependency, constructed once per process by
//! [`StoreSelector`](crate::selector::StoreSelector) and passed into each
//! component rather than a lazily-built module singleton. Cloning is cheap
//! on both paths.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::redis::RedisStore;

/// Clonable handle over either the remote store or the in-process engine.
#[derive(Clone)]
pub enum StoreHandle {
    /// Backed by a remote Redis-compatible server.
    Remote(RedisStore),
    /// Backed by the in-process engine.
    Memory(MemoryStore),
}

impl StoreHandle {
    /// Handle over a fresh in-process engine.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Read the value at `key`; `None` if the key was never written or has
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            Self::Remote(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    /// Store `value` at `key`, clearing any expiry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self {
            Self::Remote(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }

    /// Delete `key` and whatever backing it has.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        match self {
            Self::Remote(store) => store.delete(key).await,
            Self::Memory(store) => store.delete(key).await,
        }
    }

    /// Increment the counter at `key`; an absent key is created at 0 first,
    /// so the first increment returns 1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        match self {
            Self::Remote(store) => store.increment(key).await,
            Self::Memory(store) => store.increment(key).await,
        }
    }

    /// Set or refresh a TTL of `seconds` on `key`. A no-op when the key is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn expire(&self, key: &str, seconds: i64) -> StoreResult<()> {
        match self {
            Self::Remote(store) => store.expire(key, seconds).await,
            Self::Memory(store) => store.expire(key, seconds).await,
        }
    }

    /// Insert `value` at the head of the list at `key`; returns the new
    /// list length.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<u64> {
        match self {
            Self::Remote(store) => store.list_push_front(key, value).await,
            Self::Memory(store) => store.list_push_front(key, value).await,
        }
    }

    /// Return list elements from `start` to `stop` inclusive; `stop == -1`
    /// means "to the end".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        match self {
            Self::Remote(store) => store.list_range(key, start, stop).await,
            Self::Memory(store) => store.list_range(key, start, stop).await,
        }
    }

    /// Remove up to `count` occurrences of `value` scanning head-to-tail
    /// (`count == 0` removes all); returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn list_remove(&self, key: &str, count: i64, value: &str) -> StoreResult<u64> {
        match self {
            Self::Remote(store) => store.list_remove(key, count, value).await,
            Self::Memory(store) => store.list_remove(key, count, value).await,
        }
    }

    /// Add `member` with `score` to the sorted set at `key`; re-adding an
    /// existing member updates its score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
        match self {
            Self::Remote(store) => store.sorted_set_add(key, score, member).await,
            Self::Memory(store) => store.sorted_set_add(key, score, member).await,
        }
    }

    /// Return members whose scores fall in `[min, max]`, ascending by
    /// score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn sorted_set_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<Vec<String>> {
        match self {
            Self::Remote(store) => store.sorted_set_range_by_score(key, min, max).await,
            Self::Memory(store) => store.sorted_set_range_by_score(key, min, max).await,
        }
    }

    /// Remove members whose scores fall in `[min, max]`; returns the number
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn sorted_set_remove_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<u64> {
        match self {
            Self::Remote(store) => store.sorted_set_remove_range_by_score(key, min, max).await,
            Self::Memory(store) => store.sorted_set_remove_range_by_score(key, min, max).await,
        }
    }

    /// Serialize `value` as JSON and store it at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`](crate::StoreError::Serialization)
    /// if serialization fails, or
    /// [`StoreError::Unavailable`](crate::StoreError::Unavailable) if the
    /// write fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json).await
    }

    /// Read the value at `key` and deserialize it from JSON; `None` if the
    /// key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`](crate::StoreError::Serialization)
    /// if deserialization fails, or
    /// [`StoreError::Unavailable`](crate::StoreError::Unavailable) if the
    /// read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Start a batch of get/set commands executed as one round trip.
    pub fn batch(&self) -> Batch {
        Batch {
            handle: self.clone(),
            queue: Vec::new(),
        }
    }

    /// Liveness probe against the backing store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails.
    pub async fn ping(&self) -> StoreResult<()> {
        match self {
            Self::Remote(store) => store.ping().await,
            Self::Memory(store) => store.ping().await,
        }
    }
}

/// A queued batch command.
#[derive(Debug, Clone)]
pub(crate) enum BatchCommand {
    /// Read a key.
    Get(String),
    /// Write a key.
    Set(String, String),
}

/// One reply from a batch execution, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchReply {
    /// Reply to a queued get: the value, or `None` if absent.
    Value(Option<String>),
    /// Reply to a queued set.
    Ack,
}

/// Builder that queues get/set commands for a single round trip.
///
/// On the remote path the queue becomes one pipeline; on the memory path it
/// runs under a single engine lock, so no other caller's operation is
/// interleaved. Replies come back in submission order. Beyond that the batch
/// provides no atomicity.
pub struct Batch {
    handle: StoreHandle,
    queue: Vec<BatchCommand>,
}

impl Batch {
    /// Queue a read of `key`.
    pub fn get(&mut self, key: &str) -> &mut Self {
        self.queue.push(BatchCommand::Get(key.to_owned()));
        self
    }

    /// Queue a write of `value` to `key`.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.queue.push(BatchCommand::Set(key.to_owned(), value.to_owned()));
        self
    }

    /// Number of queued commands.
    pub const fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no commands are queued.
    pub const fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Execute the queued commands and return their replies in submission
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`](crate::StoreError::Unavailable)
    /// if the backing transport fails; no partial replies are surfaced.
    pub async fn exec(self) -> StoreResult<Vec<BatchReply>> {
        match &self.handle {
            StoreHandle::Remote(store) => store.run_batch(&self.queue).await,
            StoreHandle::Memory(store) => store.run_batch(&self.queue).await,
        }
    }
}
