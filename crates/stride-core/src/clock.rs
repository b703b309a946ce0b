//! Wall clock and local-calendar derivation.
//!
//! The core only ever needs three things from time: the current instant, the
//! local calendar day of an instant, and the local hour/weekday of an instant.

use crate::error::CoreError;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidTimezone(format!("Invalid timezone: {}", timezone)))
}

/// Local calendar in one IANA time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Default for Calendar {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(timezone: &str) -> Result<Self, CoreError> {
        validate_timezone(timezone).map(Self::new)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// `YYYY-MM-DD` key used by history documents.
    pub fn date_key(&self, at: DateTime<Utc>) -> String {
        self.local_date(at).format("%Y-%m-%d").to_string()
    }

    pub fn hour(&self, at: DateTime<Utc>) -> u32 {
        at.with_timezone(&self.tz).hour()
    }

    pub fn minute(&self, at: DateTime<Utc>) -> u32 {
        at.with_timezone(&self.tz).minute()
    }

    pub fn weekday(&self, at: DateTime<Utc>) -> Weekday {
        at.with_timezone(&self.tz).weekday()
    }

    /// Index with Sunday = 0, matching the stored activity vectors.
    pub fn weekday_index(&self, at: DateTime<Utc>) -> usize {
        self.weekday(at).num_days_from_sunday() as usize
    }

    pub fn is_weekend(&self, at: DateTime<Utc>) -> bool {
        matches!(self.weekday(at), Weekday::Sat | Weekday::Sun)
    }

    /// Instant of `hour:minute` local time on `date`. Nonexistent local times
    /// (spring-forward gaps) move one hour later.
    pub fn at_local(&self, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(hour, minute, 0)?;
        match self.tz.from_local_datetime(&naive).earliest() {
            Some(local) => Some(local.with_timezone(&Utc)),
            None => {
                let shifted = naive + chrono::Duration::hours(1);
                self.tz
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
            }
        }
    }
}
