//! # Feature: Command Rate Limiting
//!
//! Sliding-window limit on memo commands per user, so one user cannot flood
//! the store. DashMap keeps per-user windows without a global lock.
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.1.0: Periodic sweep drops users whose window has emptied
//! - 2.0.0: Keyed by user only; synchronous check with retry hint
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Checks between sweeps of idle users
const SWEEP_EVERY: usize = 256;

pub struct RateLimiter {
    requests: DashMap<String, Vec<Instant>>,
    max_requests: usize,
    time_window: Duration,
    checks: AtomicUsize,
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        RateLimiter {
            requests: DashMap::new(),
            max_requests,
            time_window,
            checks: AtomicUsize::new(0),
        }
    }

    /// Record a request for `user_id`; false when the window is full
    pub fn check(&self, user_id: &str) -> bool {
        // Sweep before taking an entry guard; retain locks every shard
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep();
        }

        let now = Instant::now();
        let mut entry = self.requests.entry(user_id.to_string()).or_default();

        entry.retain(|&time| now.duration_since(time) < self.time_window);

        if entry.len() >= self.max_requests {
            false
        } else {
            entry.push(now);
            true
        }
    }

    /// Drop users with no requests left inside the window
    pub fn sweep(&self) {
        let now = Instant::now();
        self.requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.time_window);
            !times.is_empty()
        });
    }

    /// Number of users currently tracked
    pub fn tracked_users(&self) -> usize {
        self.requests.len()
    }

    /// How long until `user_id` may issue another request
    pub fn retry_after(&self, user_id: &str) -> Option<Duration> {
        let entry = self.requests.get(user_id)?;
        if entry.len() < self.max_requests {
            return None;
        }
        let oldest = entry.first()?;
        self.time_window.checked_sub(oldest.elapsed())
    }
}
