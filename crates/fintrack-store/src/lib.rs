//! Primitive key/value store layer for the fintrack persistence stack.
//!
//! Higher layers (versioned snapshots, the rate limiter, the transaction
//! index) speak one command surface, [`StoreHandle`], which resolves to
//! either a remote Redis-compatible server or a self-contained in-process
//! engine. Results flow back unchanged regardless of which backing served
//! them, so the application behaves identically whether the remote store is
//! configured, unreachable, or deliberately skipped.
//!
//! # Architecture
//!
//! ```text
//! application layers
//!     |
//!     +-- StoreHandle (get/set/counter/expire/list/sorted-set/batch)
//!             |
//!             +-- StoreSelector ---> RedisStore  (remote, fred client)
//!                        \
//!                         +--------> MemoryStore (in-process engine)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- environment-provided store configuration
//! - [`error`] -- the two-variant error taxonomy
//! - [`handle`] -- the command surface and batch builder
//! - [`memory`] -- in-process engine with lazy per-key expiry
//! - [`redis`] -- remote adapter over a Redis-compatible server
//! - [`selector`] -- once-per-process backend resolution and demotion

pub mod config;
pub mod error;
pub mod handle;
pub mod memory;
pub mod redis;
pub mod selector;

// Re-export primary types for convenience.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use handle::{Batch, BatchReply, StoreHandle};
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use selector::StoreSelector;
