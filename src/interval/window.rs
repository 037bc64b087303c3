use std::fmt;

use jiff::{Timestamp, ToSpan, Zoned};

use crate::error::FeedError;
use crate::interval::date_tz::{time_zone, DateTz};

/// Half-open UTC interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UtcWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl UtcWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Self> {
        if end < start {
            return None;
        }
        Some(UtcWindow { start, end })
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }
}

impl fmt::Display for UtcWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// The day after today in timezone `tz`, as a UTC window.
pub fn next_day_window(tz: &str) -> Result<UtcWindow, FeedError> {
    next_day_window_at(tz, &Timestamp::now())
}

/// The day before today in timezone `tz`, as a UTC window.
pub fn last_day_window(tz: &str) -> Result<UtcWindow, FeedError> {
    last_day_window_at(tz, &Timestamp::now())
}

pub fn next_day_window_at(tz: &str, now: &Timestamp) -> Result<UtcWindow, FeedError> {
    let today = today_in(tz, now)?;
    let start = today.next().start().timestamp();
    Ok(UtcWindow {
        start,
        end: add_one_day(start)?,
    })
}

pub fn last_day_window_at(tz: &str, now: &Timestamp) -> Result<UtcWindow, FeedError> {
    let today = today_in(tz, now)?;
    let end = today.start().timestamp();
    let start = end
        .checked_sub(24.hours())
        .map_err(|e| FeedError::Config(format!("window before {end} out of range: {e}")))?;
    Ok(UtcWindow { start, end })
}

fn today_in(tz: &str, now: &Timestamp) -> Result<DateTz, FeedError> {
    let zoned: Zoned = now.to_zoned(time_zone(tz)?);
    DateTz::containing(&zoned)
}

// One day of absolute time, so a window is always 24 hours long.
fn add_one_day(ts: Timestamp) -> Result<Timestamp, FeedError> {
    ts.checked_add(24.hours())
        .map_err(|e| FeedError::Config(format!("window after {ts} out of range: {e}")))
}
