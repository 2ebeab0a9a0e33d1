//! Memo error taxonomy
//!
//! Store and parser failures are re-classified here before they reach the
//! command layer. `user_message` is the only text shown to users.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Unified not-found/forbidden for deletes
//! - 1.0.0: Initial taxonomy

use thiserror::Error;

use crate::features::timeparse::{ParseError, TIME_EXAMPLES};

/// Marker raised by the store when an insert is not in the future
pub const REMIND_AT_CHECK: &str = "remind_at_check";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remind_at_check: remind_at is not in the future")]
    ScheduleConstraint,

    #[error("sqlite: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum MemoError {
    #[error("reminder time must be in the future")]
    InvalidSchedule,

    #[error("memo content is empty")]
    EmptyContent,

    #[error("invalid time expression: {0}")]
    Parse(#[from] ParseError),

    #[error("memo #{0} not found")]
    NotFound(i64),

    /// The memo does not exist or belongs to someone else; deliberately indistinguishable
    #[error("memo #{0} not found or not owned by requester")]
    NotFoundOrForbidden(i64),

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl MemoError {
    /// Text safe to show in chat
    pub fn user_message(&self) -> String {
        match self {
            MemoError::InvalidSchedule => {
                "Memo time must be in the future. Try something like `in 2 hours` or `tomorrow at 3pm`."
                    .to_string()
            }
            MemoError::EmptyContent => "Memo content can't be empty.".to_string(),
            MemoError::Parse(ParseError::Unrecognized) => {
                format!("Invalid time format (case-insensitive). {TIME_EXAMPLES}")
            }
            MemoError::Parse(ParseError::InvalidTimezone(_)) => {
                "The bot's configured timezone is invalid. Please let the bot owner know.".to_string()
            }
            MemoError::Parse(ParseError::AmbiguousLocalTime(time)) => format!(
                "{time} is skipped or repeated by a daylight saving change. Please pick another time."
            ),
            MemoError::NotFound(id) => format!("Memo #{id} not found."),
            MemoError::NotFoundOrForbidden(id) => {
                format!("Memo #{id} not found, or it isn't yours to delete.")
            }
            MemoError::Storage(_) => {
                "Something went wrong while saving or loading memos. Please try again later."
                    .to_string()
            }
        }
    }
}
