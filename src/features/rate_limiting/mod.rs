//! # Rate Limiting Feature
//!
//! Per-user command throttle applied before any memo command runs.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Window and limit come from Config

pub mod limiter;

pub use limiter::RateLimiter;
