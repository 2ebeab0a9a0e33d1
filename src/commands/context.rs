//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Memo service, time parser and display timezone replace AI services
//! - 1.0.0: Initial implementation with core shared state

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::features::memos::{Memo, MemoError, MemoService};
use crate::features::timeparse::TimeParser;

/// Who issued a command and from where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub user_id: String,
    pub channel_id: String,
    pub in_dm: bool,
}

/// Shared context for all command handlers
///
/// Holds the services every memo command needs:
/// - MemoService for persistence and target resolution
/// - TimeParser for `when` expressions
/// - The timezone used to read and display wall-clock times
#[derive(Clone)]
pub struct CommandContext {
    pub memo_service: MemoService,
    pub time_parser: Arc<TimeParser>,
    pub timezone: Tz,
}

impl CommandContext {
    pub fn new(memo_service: MemoService, time_parser: Arc<TimeParser>, timezone: Tz) -> Self {
        Self {
            memo_service,
            time_parser,
            timezone,
        }
    }

    /// Parse `when` and schedule `content` for the invoking user
    ///
    /// The delivery target is the explicit channel when given, otherwise the
    /// stored preference for DM invocations, otherwise the current channel.
    pub async fn schedule_memo(
        &self,
        invocation: &Invocation,
        content: &str,
        when: &str,
        explicit_target: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Memo, MemoError> {
        let remind_at = self.time_parser.parse(when, self.timezone.name(), now)?;
        let target = self
            .memo_service
            .resolve_target(
                &invocation.user_id,
                &invocation.channel_id,
                explicit_target,
                invocation.in_dm,
            )
            .await?;
        self.memo_service
            .create_memo(&invocation.user_id, &target, content, remind_at)
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::Database;
    use chrono::Duration;

    pub(crate) async fn test_context() -> CommandContext {
        let database = Database::new(":memory:").await.unwrap();
        CommandContext::new(
            MemoService::new(Arc::new(database)),
            Arc::new(TimeParser::new().unwrap()),
            chrono_tz::UTC,
        )
    }

    fn guild_invocation() -> Invocation {
        Invocation {
            user_id: "42".into(),
            channel_id: "100".into(),
            in_dm: false,
        }
    }

    #[test]
    fn test_command_context_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }

    #[tokio::test]
    async fn test_schedule_memo_in_current_channel() {
        let ctx = test_context().await;
        let now = Utc::now();

        let memo = ctx
            .schedule_memo(&guild_invocation(), "  stretch  ", "in 2 hours", None, now)
            .await
            .unwrap();

        assert_eq!(memo.content, "  stretch  ");
        assert_eq!(memo.delivery_target, "100");
        assert_eq!(memo.owner_id, "42");
        let expected = now + Duration::hours(2);
        assert!((memo.remind_at - expected).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_schedule_memo_explicit_target_wins() {
        let ctx = test_context().await;
        ctx.memo_service.set_preferred_target("42", "300").await.unwrap();

        let memo = ctx
            .schedule_memo(&guild_invocation(), "deploy", "30m", Some("200"), Utc::now())
            .await
            .unwrap();
        assert_eq!(memo.delivery_target, "200");
    }

    #[tokio::test]
    async fn test_schedule_memo_from_dm_uses_preference() {
        let ctx = test_context().await;
        ctx.memo_service.set_preferred_target("42", "300").await.unwrap();
        let dm = Invocation {
            user_id: "42".into(),
            channel_id: "999".into(),
            in_dm: true,
        };

        let memo = ctx
            .schedule_memo(&dm, "water plants", "1h", None, Utc::now())
            .await
            .unwrap();
        assert_eq!(memo.delivery_target, "300");
    }

    #[tokio::test]
    async fn test_schedule_memo_rejects_unparseable_time() {
        let ctx = test_context().await;
        let err = ctx
            .schedule_memo(&guild_invocation(), "x", "whenever", None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::Parse(_)));
        assert!(ctx
            .memo_service
            .list_pending("42", "100")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_schedule_memo_rejects_past_time() {
        let ctx = test_context().await;
        let past = "2001-01-01 09:00";
        let err = ctx
            .schedule_memo(&guild_invocation(), "x", past, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, MemoError::InvalidSchedule));
    }
}
