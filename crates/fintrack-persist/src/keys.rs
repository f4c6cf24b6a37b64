//! Key-naming conventions.
//!
//! Keys are opaque strings namespaced by convention (nothing enforces the
//! shape structurally). Every component builds its keys through these
//! helpers so the namespaces stay consistent:
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `user:email:{email}` | JSON | User record looked up by email |
//! | `user:id:{id}` | JSON | User record looked up by id |
//! | `user:data:{id}:{type}` | JSON | Current versioned item for a subject |
//! | `user:data:{id}:{type}:backups` | Sorted set | Snapshot history, scored by write time |
//! | `tx:index:{userId}` | List | Transaction ids, most-recent-first |
//! | `tx:entity:{txId}` | JSON | One transaction record |
//! | `ratelimit:{name}:{identity}` | Counter | Fixed-window request count |

/// Key for a user record indexed by email (lowercased).
pub fn user_by_email(email: &str) -> String {
    format!("user:email:{}", email.to_lowercase())
}

/// Key for a user record indexed by id.
pub fn user_record(user_id: &str) -> String {
    format!("user:id:{user_id}")
}

/// Primary key for a subject's current versioned item.
pub fn user_data(user_id: &str, data_type: &str) -> String {
    format!("user:data:{user_id}:{data_type}")
}

/// Sorted-set key for a subject's snapshot history.
pub fn user_data_backups(user_id: &str, data_type: &str) -> String {
    format!("user:data:{user_id}:{data_type}:backups")
}

/// List key for a user's transaction index.
pub fn tx_index(user_id: &str) -> String {
    format!("tx:index:{user_id}")
}

/// Key for a single transaction record.
pub fn tx_entity(tx_id: &str) -> String {
    format!("tx:entity:{tx_id}")
}

/// Counter key for one rate-limit bucket.
pub fn rate_limit(limiter_key: &str, client_identity: &str) -> String {
    format!("ratelimit:{limiter_key}:{client_identity}")
}
