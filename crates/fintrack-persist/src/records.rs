//! Finance record types stored through the persistence layer.
//!
//! Field names serialize in `camelCase` because the export/import feature
//! round-trips these records as JSON consumed outside this workspace.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Stable user id.
    pub id: Uuid,
    /// Login email, stored lowercased.
    pub email: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Password hash; hashing itself happens in the auth layer.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money in.
    Income,
    /// Money out.
    Expense,
}

/// One income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Stable transaction id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in the user's currency; always positive, the kind carries
    /// the sign.
    pub amount: f64,
    /// Budget category name.
    pub category: String,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The day the transaction happened.
    pub date: NaiveDate,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a record dated today with a fresh id.
    pub fn new(user_id: Uuid, kind: TransactionKind, amount: f64, category: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            category: category.to_owned(),
            description: None,
            date: now.date_naive(),
            created_at: now,
        }
    }
}
