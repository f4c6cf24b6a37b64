//! Environment-provided configuration for the store layer.
//!
//! Deployments supply the remote store address through `FINTRACK_REDIS_URL`
//! (or the plain `REDIS_URL` alias, so hosted Redis offerings work without
//! renaming variables). Setting `FINTRACK_FORCE_MEMORY` to a truthy value
//! skips the remote store entirely and runs on the in-process engine, which
//! is the expected mode for local development.

use std::env;

/// Typed configuration for constructing a store handle.
///
/// Built once per process from the environment and handed to
/// [`StoreSelector`](crate::selector::StoreSelector).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Remote store URL (`redis://[:password@]host:port[/db]`).
    ///
    /// `None` means no remote store is configured and the in-process
    /// engine is used.
    pub redis_url: Option<String>,

    /// When `true`, always use the in-process engine even if a remote
    /// URL is configured.
    pub force_in_memory: bool,

    /// Secret used for token signing by the application layer.
    ///
    /// Not consumed inside this crate; it rides along because the same
    /// configuration mechanism provides it.
    pub auth_secret: Option<String>,
}

impl StoreConfig {
    /// Read configuration from process environment variables.
    ///
    /// Recognized variables:
    /// - `FINTRACK_REDIS_URL`, falling back to `REDIS_URL`
    /// - `FINTRACK_FORCE_MEMORY` (`1`, `true`, `yes` enable it)
    /// - `FINTRACK_AUTH_SECRET`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests can pass a closure over a map
    /// instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("FINTRACK_REDIS_URL")
            .or_else(|| lookup("REDIS_URL"))
            .filter(|url| !url.trim().is_empty());
        let force_in_memory = lookup("FINTRACK_FORCE_MEMORY")
            .as_deref()
            .is_some_and(is_truthy);
        let auth_secret = lookup("FINTRACK_AUTH_SECRET").filter(|s| !s.is_empty());

        Self {
            redis_url,
            force_in_memory,
            auth_secret,
        }
    }

    /// Configuration that always resolves to the in-process engine.
    pub const fn in_memory() -> Self {
        Self {
            redis_url: None,
            force_in_memory: true,
            auth_secret: None,
        }
    }

    /// Configuration pointing at a remote store URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
            force_in_memory: false,
            auth_secret: None,
        }
    }
}

/// Interpret common truthy spellings of a flag variable.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
