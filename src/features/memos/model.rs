//! Memo records
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Utc};

/// A persisted reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub id: i64,
    pub owner_id: String,
    /// Channel the reminder is posted to
    pub delivery_target: String,
    pub content: String,
    pub remind_at: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemo {
    pub owner_id: String,
    pub delivery_target: String,
    pub content: String,
    pub remind_at: DateTime<Utc>,
}
