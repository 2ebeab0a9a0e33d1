// Core layer - configuration and response formatting
pub mod core;

// Features layer - memos, reminders, time parsing, rate limiting
pub mod features;

// Persistence
pub mod database;

// Application layer
pub mod command_handler;
pub mod commands;

pub use core::Config;
pub use database::Database;

pub use features::{
    // Memos
    Memo, MemoError, MemoService, MemoStore, NewMemo, StoreError,
    // Rate limiting
    RateLimiter,
    // Reminders
    DeliveryError, DiscordSink, ReminderScheduler, ReminderSink, ScanReport,
    // Time parsing
    ParseError, TimeParser,
};
