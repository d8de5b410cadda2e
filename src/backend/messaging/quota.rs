//! Daily message quota
//!
//! A rate-limited sender may send `daily_limit` messages per calendar day.
//! The window is tracked per conversation by `send_count` and `reset_at`;
//! this module only decides when a window has expired and what is left of it.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

/// Messages a standard user may send per day
pub const DEFAULT_DAILY_LIMIT: u32 = 5;

/// Timezone whose calendar days delimit the windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDay {
    /// The server's local time, offset resolved per instant so DST changes
    /// move midnight with the wall clock
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl QuotaDay {
    /// Calendar date of `at` in this timezone
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            QuotaDay::Local => at.with_timezone(&Local).date_naive(),
            QuotaDay::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub daily_limit: u32,
    pub day: QuotaDay,
}

impl QuotaPolicy {
    pub fn new(daily_limit: u32, day: QuotaDay) -> Self {
        Self { daily_limit, day }
    }

    /// Policy counting days in a fixed UTC offset
    pub fn fixed(daily_limit: u32, offset: FixedOffset) -> Self {
        Self::new(daily_limit, QuotaDay::Fixed(offset))
    }

    /// Policy counting days in the server's local time
    pub fn local(daily_limit: u32) -> Self {
        Self::new(daily_limit, QuotaDay::Local)
    }

    /// Whether a window that started at `reset_at` is over at `now`
    ///
    /// Compares calendar dates, not elapsed time: a window opened at 23:59
    /// expires one minute later.
    pub fn window_expired(&self, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.day.date_of(reset_at) < self.day.date_of(now)
    }

    pub fn remaining(&self, send_count: u32) -> u32 {
        self.daily_limit.saturating_sub(send_count)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::local(DEFAULT_DAILY_LIMIT)
    }
}
