//! Memo lifecycle service
//!
//! Validates requests, delegates to the [`MemoStore`] and maps storage
//! failures into [`MemoError`].
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Channel preferences and delivery target resolution
//! - 1.0.0: Create, list, delete, due scan and mark-sent

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{MemoError, StoreError};
use super::model::{Memo, NewMemo};
use super::store::MemoStore;

/// Stateless orchestrator over a shared [`MemoStore`]
#[derive(Clone)]
pub struct MemoService {
    store: Arc<dyn MemoStore>,
}

impl MemoService {
    pub fn new(store: Arc<dyn MemoStore>) -> Self {
        Self { store }
    }

    /// Schedule a memo
    ///
    /// `remind_at` must be strictly after the current instant. The check runs
    /// before anything is persisted; the store repeats it at insert time.
    pub async fn create_memo(
        &self,
        owner_id: &str,
        delivery_target: &str,
        content: &str,
        remind_at: DateTime<Utc>,
    ) -> Result<Memo, MemoError> {
        // Stored verbatim; only the emptiness check ignores surrounding whitespace
        if content.trim().is_empty() {
            return Err(MemoError::EmptyContent);
        }
        if remind_at <= Utc::now() {
            return Err(MemoError::InvalidSchedule);
        }

        let new_memo = NewMemo {
            owner_id: owner_id.to_string(),
            delivery_target: delivery_target.to_string(),
            content: content.to_string(),
            remind_at,
        };

        let memo = self
            .store
            .insert_memo(&new_memo)
            .await
            .map_err(|e| match e {
                StoreError::ScheduleConstraint => MemoError::InvalidSchedule,
                other => storage_failure("create memo", other),
            })?;

        info!(
            "Created memo #{} for user {} in {} at {}",
            memo.id, memo.owner_id, memo.delivery_target, memo.remind_at
        );
        Ok(memo)
    }

    /// Owner's unsent memos in one target, soonest first
    pub async fn list_pending(
        &self,
        owner_id: &str,
        delivery_target: &str,
    ) -> Result<Vec<Memo>, MemoError> {
        self.store
            .list_pending(owner_id, delivery_target)
            .await
            .map_err(|e| storage_failure("list pending memos", e))
    }

    /// Every user's unsent memos in one target, soonest first
    pub async fn list_all_pending_in_target(
        &self,
        delivery_target: &str,
    ) -> Result<Vec<Memo>, MemoError> {
        self.store
            .list_pending_in_target(delivery_target)
            .await
            .map_err(|e| storage_failure("list pending memos in target", e))
    }

    /// Pending memo count per target for one owner
    pub async fn counts_by_target(&self, owner_id: &str) -> Result<BTreeMap<String, i64>, MemoError> {
        let counts = self
            .store
            .pending_counts(owner_id)
            .await
            .map_err(|e| storage_failure("count pending memos", e))?;
        Ok(counts.into_iter().collect())
    }

    pub async fn get_memo(&self, id: i64) -> Result<Memo, MemoError> {
        self.store
            .get_memo(id)
            .await
            .map_err(|e| storage_failure("get memo", e))?
            .ok_or(MemoError::NotFound(id))
    }

    /// Delete a memo owned by `requesting_owner_id`
    ///
    /// Missing and foreign memos both yield [`MemoError::NotFoundOrForbidden`],
    /// so callers never learn whether someone else's memo exists.
    pub async fn delete_memo(&self, id: i64, requesting_owner_id: &str) -> Result<(), MemoError> {
        let deleted = self
            .store
            .delete_memo(id, requesting_owner_id)
            .await
            .map_err(|e| storage_failure("delete memo", e))?;

        if !deleted {
            debug!("Delete of memo #{id} by {requesting_owner_id} matched no rows");
            return Err(MemoError::NotFoundOrForbidden(id));
        }

        info!("Deleted memo #{id} for user {requesting_owner_id}");
        Ok(())
    }

    /// Unsent memos with `remind_at <= as_of`
    pub async fn due_memos(&self, as_of: DateTime<Utc>) -> Result<Vec<Memo>, MemoError> {
        self.store
            .due_memos(as_of)
            .await
            .map_err(|e| storage_failure("query due memos", e))
    }

    /// Idempotent
    pub async fn mark_sent(&self, id: i64) -> Result<(), MemoError> {
        self.store
            .mark_sent(id)
            .await
            .map_err(|e| storage_failure("mark memo sent", e))
    }

    pub async fn set_preferred_target(&self, user_id: &str, target: &str) -> Result<(), MemoError> {
        self.store
            .set_preferred_target(user_id, target)
            .await
            .map_err(|e| storage_failure("store channel preference", e))?;
        info!("User {user_id} now receives DM-created memos in {target}");
        Ok(())
    }

    pub async fn preferred_target(&self, user_id: &str) -> Result<Option<String>, MemoError> {
        self.store
            .preferred_target(user_id)
            .await
            .map_err(|e| storage_failure("load channel preference", e))
    }

    /// Pick where a new memo is delivered
    ///
    /// An explicit target wins. Commands issued in a DM fall back to the
    /// user's stored preference; everything else uses the current channel.
    pub async fn resolve_target(
        &self,
        user_id: &str,
        current_target: &str,
        explicit_target: Option<&str>,
        in_dm: bool,
    ) -> Result<String, MemoError> {
        if let Some(target) = explicit_target {
            return Ok(target.to_string());
        }
        if in_dm {
            if let Some(preferred) = self.preferred_target(user_id).await? {
                return Ok(preferred);
            }
        }
        Ok(current_target.to_string())
    }
}

fn storage_failure(operation: &str, err: StoreError) -> MemoError {
    error!("Memo store failed to {operation}: {err}");
    MemoError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::features::memos::testing::FlakyStore;
    use crate::features::timeparse::TimeParser;
    use chrono::{Duration, TimeZone};

    async fn service() -> (MemoService, Arc<Database>) {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        (MemoService::new(db.clone()), db)
    }

    /// Whole seconds, since the store keeps second precision
    fn in_hours(hours: i64) -> DateTime<Utc> {
        let t = Utc::now() + Duration::hours(hours);
        Utc.timestamp_opt(t.timestamp(), 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_past_and_present() {
        let (service, _db) = service().await;

        for remind_at in [Utc::now() - Duration::minutes(5), Utc::now()] {
            let err = service
                .create_memo("alice", "chan", "stretch", remind_at)
                .await
                .unwrap_err();
            assert!(matches!(err, MemoError::InvalidSchedule));
        }

        assert!(service.list_pending("alice", "chan").await.unwrap().is_empty());
        assert!(service
            .due_memos(Utc::now() + Duration::days(365))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_content() {
        let (service, _db) = service().await;
        let err = service
            .create_memo("alice", "chan", "   ", in_hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::EmptyContent));
    }

    #[tokio::test]
    async fn test_content_is_stored_verbatim() {
        let (service, _db) = service().await;
        let content = "  buy milk\n  - oat\n";
        let created = service
            .create_memo("alice", "chan", content, in_hours(1))
            .await
            .unwrap();

        let fetched = service.get_memo(created.id).await.unwrap();
        assert_eq!(fetched.content, content);
    }

    #[tokio::test]
    async fn test_round_trip_through_parser() {
        let (service, _db) = service().await;
        let parser = TimeParser::new().unwrap();
        let now = Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap();

        let remind_at = parser.parse("in 2 hours", "UTC", now).unwrap();
        let created = service
            .create_memo("alice", "chan", "call the bank", remind_at)
            .await
            .unwrap();

        let fetched = service.get_memo(created.id).await.unwrap();
        assert_eq!(fetched.content, "call the bank");
        assert_eq!(fetched.remind_at, remind_at);
        assert_eq!(fetched.owner_id, "alice");
        assert_eq!(fetched.delivery_target, "chan");
        assert!(!fetched.sent);
    }

    #[tokio::test]
    async fn test_get_missing_memo() {
        let (service, _db) = service().await;
        assert!(matches!(
            service.get_memo(42).await.unwrap_err(),
            MemoError::NotFound(42)
        ));
    }

    #[tokio::test]
    async fn test_list_pending_is_ordered_and_excludes_sent() {
        let (service, _db) = service().await;

        let later = service
            .create_memo("alice", "chan", "later", in_hours(3))
            .await
            .unwrap();
        let soon = service
            .create_memo("alice", "chan", "soon", in_hours(1))
            .await
            .unwrap();
        let sent = service
            .create_memo("alice", "chan", "middle", in_hours(2))
            .await
            .unwrap();
        service
            .create_memo("alice", "other", "elsewhere", in_hours(1))
            .await
            .unwrap();
        service
            .create_memo("bob", "chan", "not mine", in_hours(1))
            .await
            .unwrap();

        service.mark_sent(sent.id).await.unwrap();

        let pending = service.list_pending("alice", "chan").await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![soon.id, later.id]);
        assert!(pending.iter().all(|m| !m.sent));
    }

    #[tokio::test]
    async fn test_list_all_pending_in_target_and_counts() {
        let (service, _db) = service().await;

        service.create_memo("alice", "chan", "a1", in_hours(2)).await.unwrap();
        service.create_memo("bob", "chan", "b1", in_hours(1)).await.unwrap();
        service.create_memo("alice", "other", "a2", in_hours(1)).await.unwrap();
        service.create_memo("alice", "other", "a3", in_hours(4)).await.unwrap();

        let in_chan = service.list_all_pending_in_target("chan").await.unwrap();
        let contents: Vec<&str> = in_chan.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["b1", "a1"]);

        let counts = service.counts_by_target("alice").await.unwrap();
        assert_eq!(counts.get("chan"), Some(&1));
        assert_eq!(counts.get("other"), Some(&2));
        assert_eq!(counts.len(), 2);
        assert!(service.counts_by_target("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_due_memos_boundary() {
        let (service, _db) = service().await;
        let remind_at = in_hours(1);
        let memo = service
            .create_memo("alice", "chan", "stand up", remind_at)
            .await
            .unwrap();

        let due_ids = |memos: Vec<Memo>| memos.into_iter().map(|m| m.id).collect::<Vec<_>>();

        assert!(due_ids(service.due_memos(remind_at - Duration::seconds(1)).await.unwrap()).is_empty());
        assert_eq!(due_ids(service.due_memos(remind_at).await.unwrap()), vec![memo.id]);
        assert_eq!(
            due_ids(service.due_memos(remind_at + Duration::hours(1)).await.unwrap()),
            vec![memo.id]
        );

        service.mark_sent(memo.id).await.unwrap();
        assert!(due_ids(service.due_memos(remind_at).await.unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_mark_sent_is_idempotent() {
        let (service, _db) = service().await;
        let memo = service
            .create_memo("alice", "chan", "twice", in_hours(1))
            .await
            .unwrap();

        service.mark_sent(memo.id).await.unwrap();
        service.mark_sent(memo.id).await.unwrap();

        assert!(service.get_memo(memo.id).await.unwrap().sent);
    }

    #[tokio::test]
    async fn test_delete_foreign_memo_is_refused() {
        let (service, _db) = service().await;
        let memo = service
            .create_memo("B", "chan", "bob's memo", in_hours(1))
            .await
            .unwrap();

        let err = service.delete_memo(memo.id, "A").await.unwrap_err();
        assert!(matches!(err, MemoError::NotFoundOrForbidden(id) if id == memo.id));
        assert_eq!(service.get_memo(memo.id).await.unwrap().content, "bob's memo");
    }

    #[tokio::test]
    async fn test_delete_missing_and_own_memo() {
        let (service, _db) = service().await;
        assert!(matches!(
            service.delete_memo(99, "A").await.unwrap_err(),
            MemoError::NotFoundOrForbidden(99)
        ));

        let memo = service
            .create_memo("A", "chan", "mine", in_hours(1))
            .await
            .unwrap();
        service.delete_memo(memo.id, "A").await.unwrap();
        assert!(matches!(
            service.get_memo(memo.id).await.unwrap_err(),
            MemoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_store_constraint_maps_to_invalid_schedule() {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        let store = Arc::new(FlakyStore::new(db));
        store.set_reject_inserts(true);
        let service = MemoService::new(store);

        let err = service
            .create_memo("alice", "chan", "race", in_hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::InvalidSchedule));
    }

    #[tokio::test]
    async fn test_other_store_failures_are_storage_errors() {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        let store = Arc::new(FlakyStore::new(db));
        store.set_broken(true);
        let service = MemoService::new(store);

        let err = service.list_pending("alice", "chan").await.unwrap_err();
        assert!(matches!(err, MemoError::Storage(_)));
        assert!(!err.user_message().contains("disk"));
    }

    #[tokio::test]
    async fn test_resolve_target() {
        let (service, _db) = service().await;

        assert_eq!(
            service.resolve_target("alice", "dm", Some("explicit"), true).await.unwrap(),
            "explicit"
        );
        assert_eq!(
            service.resolve_target("alice", "dm", None, true).await.unwrap(),
            "dm"
        );

        service.set_preferred_target("alice", "home").await.unwrap();
        assert_eq!(
            service.resolve_target("alice", "dm", None, true).await.unwrap(),
            "home"
        );
        assert_eq!(
            service.resolve_target("alice", "guild-chan", None, false).await.unwrap(),
            "guild-chan"
        );

        service.set_preferred_target("alice", "office").await.unwrap();
        assert_eq!(
            service.preferred_target("alice").await.unwrap().as_deref(),
            Some("office")
        );
    }
}
