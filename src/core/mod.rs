//! # Core Module
//!
//! Configuration and shared response formatting for the memo bot.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Local time display helpers in response module
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use response::{
    chunk_for_message, chunk_text, format_local_time, preview, truncate_for_message, MESSAGE_LIMIT,
};
