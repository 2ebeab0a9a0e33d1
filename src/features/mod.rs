//! # Features Layer
//!
//! Memo bot functionality, one module per concern.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: memos, reminders, timeparse and rate_limiting

pub mod memos;
pub mod rate_limiting;
pub mod reminders;
pub mod timeparse;

pub use memos::{Memo, MemoError, MemoService, MemoStore, NewMemo, StoreError};
pub use rate_limiting::RateLimiter;
pub use reminders::{
    format_reminder, DeliveryError, DiscordSink, ReminderScheduler, ReminderSink, ScanReport,
};
pub use timeparse::{format_duration, parse_duration, ParseError, TimeParser, TIME_EXAMPLES};
