//! The `engine:` configuration block: scheduling knobs and the log block.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use cadence_types::{PipeError, Result};

/// Wall-clock format accepted by `run_at`.
pub const RUN_AT_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Engine {
    #[serde(default)]
    pub disable_run_on_start: bool,

    /// Delay between jobs. Required and strictly positive. When `run_at` is
    /// set it only governs validation; the repeat interval becomes 24 h.
    #[serde(with = "crate::duration_serde")]
    pub interval: Duration,

    /// Optional wall-clock time of day (`"HH:MM"`, local timezone) for the
    /// first job of each day.
    #[serde(default)]
    pub run_at: Option<String>,

    #[serde(default)]
    pub log: Log,
}

impl Engine {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PipeError::Config(
                "'interval' must be greater than 0".into(),
            ));
        }
        if let Some(run_at) = &self.run_at {
            NaiveTime::parse_from_str(run_at, RUN_AT_FORMAT).map_err(|e| {
                PipeError::Config(format!("failed to parse run_at time '{run_at}': {e}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Log {
    #[serde(default)]
    pub level: LogLevel,

    /// Fields attached once to the startup event so every deployment can be
    /// told apart in aggregated logs.
    #[serde(default)]
    pub static_fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Disabled,
}

impl LogLevel {
    /// The `tracing` filter this level maps to.
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Disabled => LevelFilter::OFF,
        }
    }
}
