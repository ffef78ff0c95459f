//! Periodic schedule computation: fixed interval, or fixed time of day with
//! a 24 h repeat.

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};

use cadence_config::RUN_AT_FORMAT;
use cadence_types::{PipeError, Result};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// When the first tick fires and how often ticks repeat afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub first_delay: Duration,
    pub repeat: Duration,
}

impl Schedule {
    /// Build a schedule from the configured interval and optional `run_at`
    /// wall-clock time.
    ///
    /// Without `run_at` both delays equal `interval`. With `run_at` the
    /// first tick fires at the next local HH:MM and the repeat is pinned to
    /// 24 h, regardless of `interval`.
    pub fn new(interval: Duration, run_at: Option<&str>) -> Result<Self> {
        let Some(run_at) = run_at.filter(|s| !s.is_empty()) else {
            return Ok(Self {
                first_delay: interval,
                repeat: interval,
            });
        };

        let at = NaiveTime::parse_from_str(run_at, RUN_AT_FORMAT).map_err(|e| {
            PipeError::Config(format!("failed to parse run_at time '{run_at}': {e}"))
        })?;

        Ok(Self {
            first_delay: delay_until(at, chrono::Local::now().naive_local()),
            repeat: DAY,
        })
    }
}

/// Time from `now` until the next occurrence of `at`: today if `at` has not
/// passed yet, otherwise tomorrow.
pub fn delay_until(at: NaiveTime, now: NaiveDateTime) -> Duration {
    let mut next = now.date().and_time(at);
    if next < now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
