//! Memo store trait
//!
//! The persistence boundary used by [`MemoService`](super::MemoService).
//! [`Database`](crate::database::Database) is the production implementation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::model::{Memo, NewMemo};

#[async_trait]
pub trait MemoStore: Send + Sync {
    /// Insert a memo; must fail with [`StoreError::ScheduleConstraint`] when
    /// `remind_at` is not in the future at insert time
    async fn insert_memo(&self, memo: &NewMemo) -> Result<Memo, StoreError>;

    async fn get_memo(&self, id: i64) -> Result<Option<Memo>, StoreError>;

    /// Unsent memos for an owner in one target, soonest first
    async fn list_pending(&self, owner_id: &str, target: &str) -> Result<Vec<Memo>, StoreError>;

    /// Unsent memos of every owner in one target, soonest first
    async fn list_pending_in_target(&self, target: &str) -> Result<Vec<Memo>, StoreError>;

    /// (target, pending count) pairs for an owner
    async fn pending_counts(&self, owner_id: &str) -> Result<Vec<(String, i64)>, StoreError>;

    /// Delete only if `owner_id` matches; returns whether a row was removed
    async fn delete_memo(&self, id: i64, owner_id: &str) -> Result<bool, StoreError>;

    /// Unsent memos with `remind_at <= as_of`, soonest first
    async fn due_memos(&self, as_of: DateTime<Utc>) -> Result<Vec<Memo>, StoreError>;

    async fn mark_sent(&self, id: i64) -> Result<(), StoreError>;

    async fn set_preferred_target(&self, user_id: &str, target: &str) -> Result<(), StoreError>;

    async fn preferred_target(&self, user_id: &str) -> Result<Option<String>, StoreError>;
}
