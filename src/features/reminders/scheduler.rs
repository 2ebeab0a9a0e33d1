//! Reminder scan loop
//!
//! Scans once at startup to catch memos missed while offline, then once per
//! interval. Each scan delivers every due memo and marks it sent. Delivery is
//! at-least-once: a memo whose `mark_sent` fails after a successful send stays
//! pending and is delivered again on the next scan.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Per-delivery timeout, cooperative shutdown between memos, scan reports
//! - 1.0.0: Fixed-interval scan with startup catch-up

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use super::delivery::{format_reminder, DeliveryError, ReminderSink};
use crate::features::memos::{Memo, MemoService};

/// Outcome of a single scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub due: usize,
    pub delivered: usize,
    pub delivery_failed: usize,
    /// Delivered but still pending; these go out again next scan
    pub mark_failed: usize,
    /// Shutdown was requested before the batch finished
    pub interrupted: bool,
}

pub struct ReminderScheduler {
    service: MemoService,
    sink: Arc<dyn ReminderSink>,
    timezone: Tz,
    interval: Duration,
    delivery_timeout: Duration,
}

impl ReminderScheduler {
    pub fn new(
        service: MemoService,
        sink: Arc<dyn ReminderSink>,
        timezone: Tz,
        interval: Duration,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            service,
            sink,
            timezone,
            interval,
            delivery_timeout,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped)
    ///
    /// Scans run one after another on this task, so they never overlap. A
    /// scan in progress finishes its current memo before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "⏰ Reminder scheduler started (every {:?}, timezone {})",
            self.interval,
            self.timezone.name()
        );

        info!("Performing initial scan for missed reminders...");
        self.scan_and_log(&shutdown).await;
        info!("Initial scan completed");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.scan_and_log(&shutdown).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                        break;
                    }
                }
            }
        }

        info!("Reminder scheduler stopped");
    }

    async fn scan_and_log(&self, shutdown: &watch::Receiver<bool>) -> ScanReport {
        let now = Utc::now();
        debug!(
            "Scanning for reminders at {}",
            now.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M:%S %Z")
        );

        let report = self.scan_once(now, Some(shutdown)).await;
        if report.due > 0 {
            info!(
                "Scan finished: {} due, {} delivered, {} delivery failures, {} not marked sent{}",
                report.due,
                report.delivered,
                report.delivery_failed,
                report.mark_failed,
                if report.interrupted { " (interrupted by shutdown)" } else { "" }
            );
        }
        report
    }

    /// Deliver every memo due at `now`, soonest first
    pub async fn scan_once(
        &self,
        now: DateTime<Utc>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        let due = match self.service.due_memos(now).await {
            Ok(memos) => memos,
            Err(e) => {
                error!("Error getting due reminders: {e}");
                return report;
            }
        };

        report.due = due.len();
        if !due.is_empty() {
            info!("Found {} reminder(s) to process", due.len());
        }

        for memo in due {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                report.interrupted = true;
                break;
            }

            if let Err(e) = self.deliver(&memo).await {
                warn!(
                    "Failed to deliver memo #{} to {}: {e}. Will retry next scan.",
                    memo.id, memo.delivery_target
                );
                report.delivery_failed += 1;
                continue;
            }
            report.delivered += 1;

            if let Err(e) = self.service.mark_sent(memo.id).await {
                error!(
                    "Memo #{} was delivered but could not be marked sent ({e}); it will be delivered again",
                    memo.id
                );
                report.mark_failed += 1;
            } else {
                debug!("Delivered memo #{} to {}", memo.id, memo.delivery_target);
            }
        }

        report
    }

    async fn deliver(&self, memo: &Memo) -> Result<(), DeliveryError> {
        let text = format_reminder(memo, self.timezone);
        match timeout(
            self.delivery_timeout,
            self.sink.send(&memo.delivery_target, &text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut(self.delivery_timeout)),
        }
    }
}
