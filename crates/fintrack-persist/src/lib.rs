//! Persistence layer for the fintrack application.
//!
//! Everything here rides on the primitive store surface from
//! [`fintrack_store`] and inherits its degradation behavior: when the
//! remote store is unreachable or unconfigured, the same code runs against
//! the in-process engine with identical semantics.
//!
//! # Modules
//!
//! - [`checksum`] -- rolling integrity hash over serialized values
//! - [`keys`] -- key-naming conventions shared by every component
//! - [`records`] -- finance record types (users, transactions)
//! - [`snapshot`] -- versioned current values plus 30-day backup history
//! - [`rate_limit`] -- fixed-window rate limiter with local fallback
//! - [`tx_index`] -- list-backed most-recent-first transaction index

pub mod checksum;
pub mod keys;
pub mod rate_limit;
pub mod records;
pub mod snapshot;
pub mod tx_index;

// Re-export primary types for convenience.
pub use rate_limit::{RateDecision, RateLimiter};
pub use records::{TransactionKind, TransactionRecord, UserRecord};
pub use snapshot::{ExportBundle, SnapshotStore, VersionedItem};
pub use tx_index::TransactionIndex;
