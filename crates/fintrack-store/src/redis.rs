//! Remote store adapter over a Redis-compatible server.
//!
//! Wraps a [`fred::prelude::Client`] and maps every transport or protocol
//! failure to [`StoreError::Unavailable`], so callers see a single signal
//! whether the server is down, the URL is wrong, or the credential is bad.

use fred::prelude::*;

use crate::error::{StoreError, StoreResult};
use crate::handle::{BatchCommand, BatchReply};

/// Connection handle to a Redis-compatible server.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Build a client for `url` without connecting.
    ///
    /// Commands issued before [`connect`](Self::connect) has succeeded
    /// complete with [`StoreError::Unavailable`]. The selector uses the
    /// connected form; this constructor exists for callers that want to
    /// exercise the unavailable path deliberately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL cannot be parsed.
    pub fn new(url: &str) -> StoreResult<Self> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid store URL: {e}")))?;
        let client = Builder::from_config(config).build()?;
        Ok(Self { client })
    }

    /// Connect to the server at `url`.
    ///
    /// The URL follows the Redis scheme: `redis://[:password@]host:port[/db]`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL cannot be parsed or
    /// the connection fails.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let store = Self::new(url)?;
        store.client.init().await?;
        tracing::info!("connected to remote store");
        Ok(store)
    }

    /// Read the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the read fails.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    /// Store `value` at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the write fails.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    /// Delete `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the delete fails.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Increment the counter at `key` (`INCR`); the server creates absent
    /// keys at 0 before incrementing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn increment(&self, key: &str) -> StoreResult<i64> {
        let count: i64 = self.client.incr(key).await?;
        Ok(count)
    }

    /// Set or refresh a TTL of `seconds` on `key` (`EXPIRE`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn expire(&self, key: &str, seconds: i64) -> StoreResult<()> {
        let _: i64 = self.client.expire(key, seconds, None).await?;
        Ok(())
    }

    /// Insert `value` at the head of the list at `key` (`LPUSH`); returns
    /// the new length.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<u64> {
        let length: u64 = self.client.lpush(key, value).await?;
        Ok(length)
    }

    /// Return list elements from `start` to `stop` inclusive (`LRANGE`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        let items: Vec<String> = self.client.lrange(key, start, stop).await?;
        Ok(items)
    }

    /// Remove up to `count` occurrences of `value` from the list at `key`
    /// (`LREM`); returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn list_remove(&self, key: &str, count: i64, value: &str) -> StoreResult<u64> {
        let removed: u64 = self.client.lrem(key, count, value).await?;
        Ok(removed)
    }

    /// Add `member` with `score` to the sorted set at `key` (`ZADD`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
        let _: () = self
            .client
            .zadd(key, None, None, false, false, (score, member))
            .await?;
        Ok(())
    }

    /// Return members with scores in `[min, max]`, ascending
    /// (`ZRANGEBYSCORE`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn sorted_set_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<Vec<String>> {
        let members: Vec<String> = self
            .client
            .zrangebyscore(key, min, max, false, None)
            .await?;
        Ok(members)
    }

    /// Remove members with scores in `[min, max]` (`ZREMRANGEBYSCORE`);
    /// returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the command fails.
    pub async fn sorted_set_remove_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> StoreResult<u64> {
        let removed: u64 = self.client.zremrangebyscore(key, min, max).await?;
        Ok(removed)
    }

    /// Execute queued batch commands as one pipelined round trip.
    pub(crate) async fn run_batch(&self, commands: &[BatchCommand]) -> StoreResult<Vec<BatchReply>> {
        let pipeline = self.client.pipeline();
        for command in commands {
            match command {
                BatchCommand::Get(key) => {
                    let _: () = pipeline.get(key).await?;
                }
                BatchCommand::Set(key, value) => {
                    let _: () = pipeline.set(key, value.as_str(), None, None, false).await?;
                }
            }
        }
        let results: Vec<Value> = pipeline.all().await?;

        let mut replies = Vec::with_capacity(commands.len());
        for (command, value) in commands.iter().zip(results) {
            replies.push(match command {
                BatchCommand::Get(_) => BatchReply::Value(value.into_string()),
                BatchCommand::Set(..) => BatchReply::Ack,
            });
        }
        Ok(replies)
    }

    /// Liveness probe (`PING`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the server does not answer.
    pub async fn ping(&self) -> StoreResult<()> {
        let _: String = self.client.ping(None).await?;
        Ok(())
    }
}
