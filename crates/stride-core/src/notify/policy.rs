use super::messages::MessageFamily;
use crate::clock::Calendar;
use crate::history::completion_rate;
use crate::models::HistoryEntry;
use crate::settings::{NotificationSettings, WindowSettings};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use std::fmt;

/// Trailing days whose completion rate picks the message family.
pub const CLASSIFICATION_DAYS: u32 = 7;
/// A streak this long always earns an achievement message.
pub const ACHIEVEMENT_STREAK: u32 = 3;
/// Planned sends closer than this are delivered right away.
pub const IMMEDIATE_DELIVERY_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(10);

const LOW_RATE: f64 = 0.3;
const HIGH_RATE: f64 = 0.7;
const LOOKAHEAD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSendReason {
    Disabled,
    Weekend,
    OutsideWindow,
}

impl fmt::Display for NoSendReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoSendReason::Disabled => write!(f, "notifications are disabled"),
            NoSendReason::Weekend => write!(f, "weekend notifications are off"),
            NoSendReason::OutsideWindow => write!(f, "outside the notification windows"),
        }
    }
}

/// The next send slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSend {
    pub at: DateTime<Utc>,
    /// `None` means deliver immediately.
    pub delay: Option<std::time::Duration>,
}

/// Decides whether, when and what to notify.
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    settings: NotificationSettings,
    calendar: Calendar,
}

impl NotificationPolicy {
    pub fn new(settings: NotificationSettings, calendar: Calendar) -> Self {
        Self { settings, calendar }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    fn weekend_blocked(&self, date: NaiveDate) -> bool {
        !self.settings.weekend_notifications && matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The window `now` falls in, or why nothing may be sent now.
    pub fn check(&self, now: DateTime<Utc>) -> Result<WindowSettings, NoSendReason> {
        let windows = self.settings.windows();
        if windows.is_empty() {
            return Err(NoSendReason::Disabled);
        }
        if self.weekend_blocked(self.calendar.local_date(now)) {
            return Err(NoSendReason::Weekend);
        }
        let hour = self.calendar.hour(now);
        windows
            .into_iter()
            .find(|w| w.contains(hour))
            .ok_or(NoSendReason::OutsideWindow)
    }

    /// Deterministic family choice from the trailing week and the current streak.
    pub fn classify(week: &[HistoryEntry], streak: u32) -> MessageFamily {
        if streak >= ACHIEVEMENT_STREAK {
            return MessageFamily::Achievement;
        }
        match completion_rate(week) {
            Some(rate) if rate < LOW_RATE => MessageFamily::Intrinsic,
            Some(rate) if rate >= HIGH_RATE => MessageFamily::Achievement,
            _ => MessageFamily::Implementation,
        }
    }

    /// Next slot inside an enabled window after `now`, at a random minute of
    /// that window. Blocked weekend days are skipped.
    pub fn plan_next(&self, now: DateTime<Utc>, rng: &mut fastrand::Rng) -> Option<PlannedSend> {
        let windows = self.settings.windows();
        let today = self.calendar.local_date(now);

        for offset in 0..=LOOKAHEAD_DAYS {
            let date = today + Duration::days(offset);
            if self.weekend_blocked(date) {
                continue;
            }
            for window in &windows {
                let Some(start) = self.calendar.at_local(date, window.start_hour, 0) else {
                    continue;
                };
                if start <= now {
                    continue;
                }
                let minutes = rng.u32(0..window.minutes().max(1));
                let at = start + Duration::minutes(i64::from(minutes));
                let delay = (at - now)
                    .to_std()
                    .ok()
                    .filter(|d| *d >= IMMEDIATE_DELIVERY_THRESHOLD);
                return Some(PlannedSend { at, delay });
            }
        }
        None
    }
}
