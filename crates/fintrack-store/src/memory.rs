//! In-process emulation of the primitive store.
//!
//! [`MemoryStore`] implements the same command surface as the remote adapter
//! over a plain key map, and is used either by explicit configuration or as
//! the automatic fallback when the remote store is unreachable.
//!
//! # Expiration
//!
//! Each key carries an optional absolute expiry in epoch milliseconds.
//! Every accessor first checks whether the key's expiry is in the past and,
//! if so, evicts the key (including its list or sorted-set backing) before
//! serving the request. Expiration is enforced lazily at access time; there
//! is no timer thread.
//!
//! # Typed slots
//!
//! A key holds exactly one slot kind: text, integer counter, list, or
//! score-sorted member vector. Keys are namespaced by convention at the
//! layers above, so cross-kind access does not occur in practice; when it
//! does, reads treat the mismatched slot as absent and writes replace it.
//!
//! # Concurrency
//!
//! One mutex guards the whole engine. List and sorted-set mutations are
//! multi-step sequences, so operations must not interleave; the single lock
//! also gives [`run_batch`](MemoryStore::run_batch) its "no other caller in
//! between" guarantee.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::handle::{BatchCommand, BatchReply};

/// One member of a sorted set with its ordering score.
#[derive(Debug, Clone)]
struct ScoredMember {
    score: f64,
    member: String,
}

/// The value stored at a key.
#[derive(Debug, Clone)]
enum Slot {
    /// A plain string value.
    Text(String),
    /// A numeric counter.
    Counter(i64),
    /// An ordered sequence, most-recent-first at index 0.
    List(Vec<String>),
    /// Members kept sorted by score ascending, stable on ties.
    Sorted(Vec<ScoredMember>),
}

/// A key's slot plus its optional absolute expiry.
#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at_ms: Option<i64>,
}

impl Entry {
    const fn persistent(slot: Slot) -> Self {
        Self {
            slot,
            expires_at_ms: None,
        }
    }
}

/// The engine state behind the lock.
#[derive(Debug, Default)]
struct Engine {
    entries: HashMap<String, Entry>,
}

impl Engine {
    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Evict `key` if its expiry is in the past. Called by every accessor
    /// before the request is served.
    fn evict_if_expired(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .and_then(|entry| entry.expires_at_ms)
            .is_some_and(|at| at <= Self::now_ms());
        if expired {
            self.entries.remove(key);
        }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        self.evict_if_expired(key);
        match self.entries.get(key).map(|entry| &entry.slot) {
            Some(Slot::Text(value)) => Some(value.clone()),
            Some(Slot::Counter(count)) => Some(count.to_string()),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        // SET overwrites any slot kind and clears the expiry.
        self.entries
            .insert(key.to_owned(), Entry::persistent(Slot::Text(value.to_owned())));
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn increment(&mut self, key: &str) -> i64 {
        self.evict_if_expired(key);
        if let Some(entry) = self.entries.get_mut(key) {
            if let Slot::Counter(count) = &mut entry.slot {
                *count = count.saturating_add(1);
                return *count;
            }
        }
        // Absent key: initialize to 0, then increment.
        self.entries
            .insert(key.to_owned(), Entry::persistent(Slot::Counter(1)));
        1
    }

    fn expire(&mut self, key: &str, seconds: i64) {
        self.evict_if_expired(key);
        // No-op if the key is absent.
        if let Some(entry) = self.entries.get_mut(key) {
            let deadline = Self::now_ms().saturating_add(seconds.saturating_mul(1000));
            entry.expires_at_ms = Some(deadline);
        }
    }

    fn list_push_front(&mut self, key: &str, value: &str) -> u64 {
        self.evict_if_expired(key);
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::persistent(Slot::List(Vec::new())));
        if !matches!(entry.slot, Slot::List(_)) {
            *entry = Entry::persistent(Slot::List(Vec::new()));
        }
        if let Slot::List(list) = &mut entry.slot {
            list.insert(0, value.to_owned());
            u64::try_from(list.len()).unwrap_or(u64::MAX)
        } else {
            0
        }
    }

    fn list_range(&mut self, key: &str, start: i64, stop: i64) -> Vec<String> {
        self.evict_if_expired(key);
        let Some(Entry {
            slot: Slot::List(list),
            ..
        }) = self.entries.get(key)
        else {
            return Vec::new();
        };

        let len = i64::try_from(list.len()).unwrap_or(i64::MAX);
        let first = normalize_index(start, len).max(0);
        let last = normalize_index(stop, len).min(len.saturating_sub(1));
        if first > last {
            return Vec::new();
        }

        let skip = usize::try_from(first).unwrap_or(0);
        let take = usize::try_from(last.saturating_sub(first).saturating_add(1)).unwrap_or(0);
        list.iter().skip(skip).take(take).cloned().collect()
    }

    fn list_remove(&mut self, key: &str, count: i64, value: &str) -> u64 {
        self.evict_if_expired(key);
        let Some(Entry {
            slot: Slot::List(list),
            ..
        }) = self.entries.get_mut(key)
        else {
            return 0;
        };

        // `count` is a head-to-tail removal limit; 0 removes every match.
        let limit = count.unsigned_abs();
        let mut removed: u64 = 0;
        list.retain(|item| {
            if item == value && (limit == 0 || removed < limit) {
                removed = removed.saturating_add(1);
                false
            } else {
                true
            }
        });
        if list.is_empty() {
            self.entries.remove(key);
        }
        removed
    }

    fn sorted_set_add(&mut self, key: &str, score: f64, member: &str) {
        self.evict_if_expired(key);
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::persistent(Slot::Sorted(Vec::new())));
        if !matches!(entry.slot, Slot::Sorted(_)) {
            *entry = Entry::persistent(Slot::Sorted(Vec::new()));
        }
        if let Slot::Sorted(members) = &mut entry.slot {
            if let Some(position) = members.iter().position(|m| m.member == member) {
                members.remove(position);
            }
            // Stable tie order: a new member lands after existing equal scores.
            let insert_at = members.partition_point(|m| m.score <= score);
            members.insert(
                insert_at,
                ScoredMember {
                    score,
                    member: member.to_owned(),
                },
            );
        }
    }

    fn sorted_set_range_by_score(&mut self, key: &str, min: f64, max: f64) -> Vec<String> {
        self.evict_if_expired(key);
        let Some(Entry {
            slot: Slot::Sorted(members),
            ..
        }) = self.entries.get(key)
        else {
            return Vec::new();
        };
        members
            .iter()
            .filter(|m| m.score >= min && m.score <= max)
            .map(|m| m.member.clone())
            .collect()
    }

    fn sorted_set_remove_range_by_score(&mut self, key: &str, min: f64, max: f64) -> u64 {
        self.evict_if_expired(key);
        let Some(Entry {
            slot: Slot::Sorted(members),
            ..
        }) = self.entries.get_mut(key)
        else {
            return 0;
        };
        let before = members.len();
        members.retain(|m| m.score < min || m.score > max);
        let removed = before.saturating_sub(members.len());
        if members.is_empty() {
            self.entries.remove(key);
        }
        u64::try_from(removed).unwrap_or(u64::MAX)
    }

}

/// Redis-style index normalization: negative indices count from the tail.
const fn normalize_index(index: i64, len: i64) -> i64 {
    if index < 0 { len.saturating_add(index) } else { index }
}

/// In-process implementation of the primitive store.
///
/// Cloning is cheap and shares the underlying engine, so a fallback handle
/// cloned from the selector sees the same data as every other clone in the
/// process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    engine: Arc<Mutex<Engine>>,
}

impl MemoryStore {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the string or counter value at `key`.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.engine.lock().await.get(key))
    }

    /// Store a string value at `key`, clearing any expiry.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.engine.lock().await.set(key, value);
        Ok(())
    }

    /// Delete `key` and its backing, if any.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        self.engine.lock().await.delete(key);
        Ok(())
    }

    /// Increment the counter at `key`, creating it at 0 first when absent.
    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        Ok(self.engine.lock().await.increment(key))
    }

    /// Set or refresh a TTL on `key`. No-op when the key is absent.
    pub async fn expire(&self, key: &str, seconds: i64) -> StoreResult<()> {
        self.engine.lock().await.expire(key, seconds);
        Ok(())
    }

    /// Insert `value` at the head of the list at `key`; returns the new length.
    pub async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<u64> {
        Ok(self.engine.lock().await.list_push_front(key, value))
    }

    /// Return list elements from `start` to `stop` inclusive
    /// (`stop == -1` means "to the end").
    pub async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        Ok(self.engine.lock().await.list_range(key, start, stop))
    }

    /// Remove up to `count` occurrences of `value`, scanning head-to-tail;
    /// `count == 0` removes every occurrence. Returns the number removed.
    pub async fn list_remove(&self, key: &str, count: i64, value: &str) -> StoreResult<u64> {
        Ok(self.engine.lock().await.list_remove(key, count, value))
    }

    /// Add `member` with `score` to the sorted set at `key`, re-scoring an
    /// existing member.
    pub async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
        self.engine.lock().await.sorted_set_add(key, score, member);
        Ok(())
    }

    /// Return members with scores in `[min, max]`, ascending by score.
    pub async fn sorted_set_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<Vec<String>> {
        Ok(self
            .engine
            .lock()
            .await
            .sorted_set_range_by_score(key, min, max))
    }

    /// Remove members with scores in `[min, max]`; returns the number removed.
    pub async fn sorted_set_remove_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<u64> {
        Ok(self
            .engine
            .lock()
            .await
            .sorted_set_remove_range_by_score(key, min, max))
    }

    /// Execute queued batch commands under a single lock acquisition, so no
    /// other caller's operation interleaves within the batch.
    pub(crate) async fn run_batch(&self, commands: &[BatchCommand]) -> StoreResult<Vec<BatchReply>> {
        let mut engine = self.engine.lock().await;
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            match command {
                BatchCommand::Get(key) => replies.push(BatchReply::Value(engine.get(key))),
                BatchCommand::Set(key, value) => {
                    engine.set(key, value);
                    replies.push(BatchReply::Ack);
                }
            }
        }
        Ok(replies)
    }

    /// Liveness probe; the in-process engine is always live.
    pub async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
