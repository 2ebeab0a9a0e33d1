//! Store wrapper with switchable failures, for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::StoreError;
use super::model::{Memo, NewMemo};
use super::store::MemoStore;
use crate::database::Database;

pub struct FlakyStore {
    inner: Arc<Database>,
    reject_inserts: AtomicBool,
    broken: AtomicBool,
    fail_mark_sent: AtomicBool,
    mark_sent_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<Database>) -> Self {
        Self {
            inner,
            reject_inserts: AtomicBool::new(false),
            broken: AtomicBool::new(false),
            fail_mark_sent: AtomicBool::new(false),
            mark_sent_calls: AtomicUsize::new(0),
        }
    }

    /// Inserts fail as if the store's future-time check fired
    pub fn set_reject_inserts(&self, value: bool) {
        self.reject_inserts.store(value, Ordering::SeqCst);
    }

    /// Every operation fails
    pub fn set_broken(&self, value: bool) {
        self.broken.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_mark_sent(&self, value: bool) {
        self.fail_mark_sent.store(value, Ordering::SeqCst);
    }

    pub fn mark_sent_calls(&self) -> usize {
        self.mark_sent_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("disk I/O error (simulated)".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MemoStore for FlakyStore {
    async fn insert_memo(&self, memo: &NewMemo) -> Result<Memo, StoreError> {
        self.check()?;
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::ScheduleConstraint);
        }
        self.inner.insert_memo(memo).await
    }

    async fn get_memo(&self, id: i64) -> Result<Option<Memo>, StoreError> {
        self.check()?;
        self.inner.get_memo(id).await
    }

    async fn list_pending(&self, owner_id: &str, target: &str) -> Result<Vec<Memo>, StoreError> {
        self.check()?;
        self.inner.list_pending(owner_id, target).await
    }

    async fn list_pending_in_target(&self, target: &str) -> Result<Vec<Memo>, StoreError> {
        self.check()?;
        self.inner.list_pending_in_target(target).await
    }

    async fn pending_counts(&self, owner_id: &str) -> Result<Vec<(String, i64)>, StoreError> {
        self.check()?;
        self.inner.pending_counts(owner_id).await
    }

    async fn delete_memo(&self, id: i64, owner_id: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete_memo(id, owner_id).await
    }

    async fn due_memos(&self, as_of: DateTime<Utc>) -> Result<Vec<Memo>, StoreError> {
        self.check()?;
        self.inner.due_memos(as_of).await
    }

    async fn mark_sent(&self, id: i64) -> Result<(), StoreError> {
        self.mark_sent_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.fail_mark_sent.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("database is locked (simulated)".into()));
        }
        self.inner.mark_sent(id).await
    }

    async fn set_preferred_target(&self, user_id: &str, target: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set_preferred_target(user_id, target).await
    }

    async fn preferred_target(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.preferred_target(user_id).await
    }
}
