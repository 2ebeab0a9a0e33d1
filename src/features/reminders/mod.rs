//! # Reminders Feature
//!
//! Background delivery of due memos.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Pluggable delivery sink, scan reports, graceful shutdown
//! - 1.0.0: Initial scheduler

pub mod delivery;
pub mod scheduler;

pub use delivery::{format_reminder, DeliveryError, DiscordSink, ReminderSink};
pub use scheduler::{ReminderScheduler, ScanReport};
