//! Store selection and degradation policy.
//!
//! A process constructs one [`StoreSelector`] from its [`StoreConfig`] and
//! resolves handles through it. The policy:
//!
//! - No remote URL configured, or in-memory forced: resolve to the
//!   in-process engine.
//! - Remote configured: connect once. On connection failure, demote to the
//!   in-process engine. On success, hand out the remote handle optimistically
//!   and run a liveness probe in the background; if the probe fails, every
//!   *subsequent* resolution returns the in-process engine.
//!
//! Demotion is one-way for the process lifetime. A call that merely times
//! out does not demote; only failed construction or a failed probe does.
//! This avoids per-call health checking and flapping between backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::handle::StoreHandle;
use crate::memory::MemoryStore;
use crate::redis::RedisStore;

/// Resolves the backing store once per process, with one-way demotion to
/// the in-process engine.
pub struct StoreSelector {
    config: StoreConfig,
    remote: OnceCell<Option<RedisStore>>,
    memory: MemoryStore,
    demoted: Arc<AtomicBool>,
}

impl StoreSelector {
    /// Create a selector for the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            remote: OnceCell::new(),
            memory: MemoryStore::new(),
            demoted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Selector that reads its configuration from the environment.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    /// Resolve the store handle for this process.
    ///
    /// The first call decides the backend; later calls are cheap and only
    /// re-check the demotion flag. All clones of the in-process fallback
    /// share one engine.
    pub async fn resolve(&self) -> StoreHandle {
        if self.demoted.load(Ordering::Acquire) {
            return StoreHandle::Memory(self.memory.clone());
        }

        let remote = self.remote.get_or_init(|| self.connect_remote()).await;
        match remote {
            Some(store) if !self.demoted.load(Ordering::Acquire) => {
                StoreHandle::Remote(store.clone())
            }
            _ => StoreHandle::Memory(self.memory.clone()),
        }
    }

    /// Whether this process has demoted to the in-process engine.
    pub fn is_demoted(&self) -> bool {
        self.demoted.load(Ordering::Acquire)
    }

    async fn connect_remote(&self) -> Option<RedisStore> {
        if self.config.force_in_memory {
            tracing::info!("in-process store forced by configuration");
            self.demote();
            return None;
        }
        let Some(url) = self.config.redis_url.as_deref() else {
            tracing::info!("no remote store configured, using in-process engine");
            self.demote();
            return None;
        };

        match RedisStore::connect(url).await {
            Ok(store) => {
                // Optimistic: hand out the remote handle now, probe in the
                // background, demote later resolutions if the probe fails.
                let probe = store.clone();
                let demoted = Arc::clone(&self.demoted);
                tokio::spawn(async move {
                    if let Err(err) = probe.ping().await {
                        tracing::warn!(%err, "liveness probe failed, demoting to in-process engine");
                        demoted.store(true, Ordering::Release);
                    }
                });
                Some(store)
            }
            Err(err) => {
                tracing::warn!(%err, "remote store unavailable, using in-process engine");
                self.demote();
                None
            }
        }
    }

    fn demote(&self) {
        self.demoted.store(true, Ordering::Release);
    }
}
