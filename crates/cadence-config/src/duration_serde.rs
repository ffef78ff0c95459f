//! Serde support for humane duration strings: `"500ms"`, `"30s"`, `"5m"`,
//! `"1h"`, `"1d"`.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Recognized unit suffixes and their length in milliseconds. Ordered so
/// `ms` is matched before the bare `s` suffix.
const UNITS: &[(&str, u64)] = &[
    ("ms", 1),
    ("s", 1_000),
    ("m", 60_000),
    ("h", 3_600_000),
    ("d", 86_400_000),
];

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&format_args!("{}ms", duration.as_millis()))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

fn parse(s: &str) -> Result<Duration, String> {
    let (suffix, millis_per_unit) = UNITS
        .iter()
        .find(|(suffix, _)| s.ends_with(suffix))
        .ok_or_else(|| format!("unknown duration format: '{s}'"))?;

    let count: u64 = s[..s.len() - suffix.len()]
        .parse()
        .map_err(|_| format!("invalid duration: '{s}'"))?;
    let millis = count
        .checked_mul(*millis_per_unit)
        .ok_or_else(|| format!("duration out of range: '{s}'"))?;

    Ok(Duration::from_millis(millis))
}
