//! Reminder delivery
//!
//! The scan loop only knows the [`ReminderSink`] trait; [`DiscordSink`] posts
//! to a Discord channel id.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use chrono_tz::Tz;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::response::{format_local_time, truncate_for_message};
use crate::features::memos::Memo;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid delivery target: {0}")]
    InvalidTarget(String),

    #[error("discord rejected the message: {0}")]
    Discord(#[from] serenity::Error),

    #[error("delivery timed out after {0:?}")]
    TimedOut(Duration),
}

/// Outbound messaging channel
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn send(&self, target: &str, text: &str) -> Result<(), DeliveryError>;
}

pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReminderSink for DiscordSink {
    async fn send(&self, target: &str, text: &str) -> Result<(), DeliveryError> {
        let channel_id: u64 = target
            .parse()
            .map_err(|_| DeliveryError::InvalidTarget(target.to_string()))?;
        ChannelId(channel_id).say(&self.http, text).await?;
        Ok(())
    }
}

/// Public reminder text posted to the memo's channel
pub fn format_reminder(memo: &Memo, tz: Tz) -> String {
    // Keep user content from closing the code fence early
    let content = memo.content.replace("```", "`\u{200b}``");
    let message = format!(
        "🔔 **Memo** from <@{}> (scheduled for {})\n```\n{}\n```",
        memo.owner_id,
        format_local_time(memo.remind_at, tz),
        content
    );
    if message.len() <= crate::core::MESSAGE_LIMIT {
        return message;
    }
    // Too long to fit: drop the fence rather than emit an unterminated one
    truncate_for_message(&message.replace("\n```\n", "\n").trim_end_matches("```").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn memo(content: &str) -> Memo {
        let remind_at = DateTime::parse_from_rfc3339("2024-03-07T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Memo {
            id: 7,
            owner_id: "42".into(),
            delivery_target: "100".into(),
            content: content.into(),
            remind_at,
            sent: false,
            created_at: remind_at,
        }
    }

    #[test]
    fn test_format_reminder() {
        let text = format_reminder(&memo("renew passport"), chrono_tz::America::New_York);
        assert_eq!(
            text,
            "🔔 **Memo** from <@42> (scheduled for Thursday, March 7, 2024 at 15:30 EST)\n```\nrenew passport\n```"
        );
    }

    #[test]
    fn test_format_reminder_escapes_fences() {
        let text = format_reminder(&memo("```rm -rf```"), chrono_tz::UTC);
        assert_eq!(text.matches("```").count(), 2);
    }

    #[test]
    fn test_format_reminder_respects_message_limit() {
        let text = format_reminder(&memo(&"z".repeat(5000)), chrono_tz::UTC);
        assert!(text.len() <= crate::core::MESSAGE_LIMIT);
        assert!(text.starts_with("🔔 **Memo**"));
        assert!(text.ends_with("..."));
    }

    #[tokio::test]
    async fn test_discord_sink_rejects_non_numeric_target() {
        let sink = DiscordSink::new(Arc::new(Http::new("token")));
        let err = sink.send("general", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidTarget(t) if t == "general"));
    }
}
