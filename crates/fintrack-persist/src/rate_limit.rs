//! Fixed-window rate limiting on store counters.
//!
//! Each `(limiter key, client identity)` pair owns one counter with a TTL
//! of the window length. The window is fixed, not sliding: a burst
//! straddling a window boundary can admit up to twice the limit across the
//! boundary. That approximation is accepted.
//!
//! This is the only component that *catches* store failures instead of
//! propagating them. When the backing store is unavailable the limiter
//! falls back to a process-local bucket map with the same lazy-expiry
//! behavior. Counts are then per-process rather than shared: the limiter
//! fails open to local-only limiting rather than failing closed.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;

use fintrack_store::{StoreHandle, StoreResult};

use crate::keys;

/// The outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether this request exceeded the limit and should be rejected.
    pub limited: bool,
    /// Requests left in the current window.
    pub remaining: u64,
    /// The configured limit, echoed back for response headers.
    pub limit: u64,
    /// Seconds until the current window resets.
    pub reset_seconds: u64,
}

/// A process-local bucket used when the store is unavailable.
#[derive(Debug, Clone, Copy)]
struct FallbackBucket {
    count: u64,
    reset_at_ms: i64,
}

/// Fixed-window counter rate limiter with a process-local fallback.
pub struct RateLimiter {
    store: StoreHandle,
    fallback: Mutex<HashMap<String, FallbackBucket>>,
}

impl RateLimiter {
    /// Create a limiter over the given store handle.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            fallback: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `(limiter_key, client_identity)` against
    /// `limit` per `window_seconds`.
    ///
    /// Never fails: if the backing store is unavailable the decision comes
    /// from the process-local fallback buckets instead.
    pub async fn allow(
        &self,
        limiter_key: &str,
        client_identity: &str,
        limit: u64,
        window_seconds: u64,
    ) -> RateDecision {
        let key = keys::rate_limit(limiter_key, client_identity);
        match self.allow_via_store(&key, limit, window_seconds).await {
            Ok(decision) => decision,
            Err(_) => self.allow_via_fallback(&key, limit, window_seconds).await,
        }
    }

    async fn allow_via_store(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> StoreResult<RateDecision> {
        let count = self.store.increment(key).await?;
        if count == 1 {
            // First hit in a fresh window starts the clock.
            let seconds = i64::try_from(window_seconds).unwrap_or(i64::MAX);
            self.store.expire(key, seconds).await?;
        }
        let count = u64::try_from(count).unwrap_or(0);
        Ok(RateDecision {
            limited: count > limit,
            remaining: limit.saturating_sub(count),
            limit,
            reset_seconds: window_seconds,
        })
    }

    async fn allow_via_fallback(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> RateDecision {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = i64::try_from(window_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        let mut buckets = self.fallback.lock().await;
        // Lazy expiry: an elapsed bucket counts as absent on next access.
        let expired = buckets.get(key).is_none_or(|b| now_ms > b.reset_at_ms);
        if expired {
            buckets.insert(
                key.to_owned(),
                FallbackBucket {
                    count: 1,
                    reset_at_ms: now_ms.saturating_add(window_ms),
                },
            );
        } else if let Some(bucket) = buckets.get_mut(key) {
            bucket.count = bucket.count.saturating_add(1);
        }

        let (count, reset_at_ms) = buckets
            .get(key)
            .map_or((1, now_ms), |b| (b.count, b.reset_at_ms));
        let delta_ms = reset_at_ms.saturating_sub(now_ms);
        // Ceiling division; `i64::div_ceil` is unavailable on this toolchain.
        let reset_seconds =
            u64::try_from((delta_ms / 1000).saturating_add(i64::from(delta_ms % 1000 > 0)))
                .unwrap_or(0);

        RateDecision {
            limited: count > limit,
            remaining: limit.saturating_sub(count),
            limit,
            reset_seconds,
        }
    }
}
