// "Time since first deposit" label, recomputed on a fixed tick.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::polling::PollHandle;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
const MONTH_MS: i64 = 30 * DAY_MS;
const YEAR_MS: i64 = 365 * DAY_MS;

/// Largest whole unit elapsed between `since_ms` and `now_ms`.
pub fn format_time_since(since_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(since_ms);
    let units = [
        (YEAR_MS, "year"),
        (MONTH_MS, "month"),
        (WEEK_MS, "week"),
        (DAY_MS, "day"),
        (HOUR_MS, "hour"),
        (MINUTE_MS, "minute"),
    ];
    for (size, unit) in units {
        let count = elapsed / size;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{} {}{} ago", count, unit, plural);
        }
    }
    "just now".to_string()
}

/// Publishes the time-since label for a fixed first-deposit timestamp.
pub struct FirstDepositClock;

impl FirstDepositClock {
    /// Emits a fresh label immediately and then every `tick`.
    pub fn spawn(first_deposit_ms: i64, tick: Duration) -> (PollHandle, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(format_time_since(first_deposit_ms, Utc::now().timestamp_millis()));
        let task = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let label = format_time_since(first_deposit_ms, Utc::now().timestamp_millis());
                if tx.send(label).is_err() {
                    break;
                }
            }
        });
        (PollHandle::new("first_deposit_clock", task), rx)
    }
}
