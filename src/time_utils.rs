// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for durations and date/time formatting.

use chrono::{DateTime, NaiveDateTime};

/// A value that can be expressed as a number of elapsed seconds.
pub trait TotalSeconds {
    fn total_seconds(&self) -> f64;
}

impl TotalSeconds for u64 {
    fn total_seconds(&self) -> f64 {
        *self as f64
    }
}

impl TotalSeconds for u32 {
    fn total_seconds(&self) -> f64 {
        f64::from(*self)
    }
}

impl TotalSeconds for i64 {
    fn total_seconds(&self) -> f64 {
        *self as f64
    }
}

impl TotalSeconds for f64 {
    fn total_seconds(&self) -> f64 {
        *self
    }
}

impl TotalSeconds for std::time::Duration {
    fn total_seconds(&self) -> f64 {
        self.as_secs_f64()
    }
}

impl TotalSeconds for chrono::Duration {
    fn total_seconds(&self) -> f64 {
        self.num_milliseconds() as f64 / 1000.0
    }
}

/// Normalize an optional duration to whole, non-negative seconds.
///
/// Absent values are `0`; negative values clamp to `0`.
pub fn to_seconds<D: TotalSeconds>(duration: Option<D>) -> u64 {
    match duration {
        Some(d) => {
            let secs = d.total_seconds();
            if secs.is_finite() && secs > 0.0 {
                secs as u64
            } else {
                0
            }
        }
        None => 0,
    }
}

/// Parse Strava's `start_date_local`.
///
/// Strava suffixes local timestamps with `Z` even though they are not UTC,
/// so the offset is dropped and the wall-clock time kept.
pub fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Format a local timestamp as ISO 8601 without offset.
pub fn format_local_iso(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// English weekday name (`Monday`, ...).
pub fn day_of_week(date: NaiveDateTime) -> String {
    date.format("%A").to_string()
}

/// Wall-clock time as `HH:MM`.
pub fn time_of_day(date: NaiveDateTime) -> String {
    date.format("%H:%M").to_string()
}
