//! Session and notification settings.
//!
//! Every struct deserializes with defaults for missing keys, so a partial
//! config file is always valid.

use crate::history::DEFAULT_WINDOW_DAYS;
use crate::remote::DEFAULT_REMOTE_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A daily send window `[start_hour, end_hour)` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSettings {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl WindowSettings {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn morning() -> Self {
        Self::new(8, 10)
    }

    pub fn evening() -> Self {
        Self::new(19, 21)
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..self.end_hour).contains(&hour)
    }

    /// Length in minutes; zero for an inverted window.
    pub fn minutes(&self) -> u32 {
        self.end_hour.saturating_sub(self.start_hour) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub morning_window: bool,
    pub evening_window: bool,
    pub weekend_notifications: bool,
    pub morning: WindowSettings,
    pub evening: WindowSettings,
}

impl NotificationSettings {
    /// Enabled windows, morning first.
    pub fn windows(&self) -> Vec<WindowSettings> {
        let mut windows = Vec::with_capacity(2);
        if self.enabled && self.morning_window {
            windows.push(self.morning);
        }
        if self.enabled && self.evening_window {
            windows.push(self.evening);
        }
        windows
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            morning_window: true,
            evening_window: true,
            weekend_notifications: false,
            morning: WindowSettings::morning(),
            evening: WindowSettings::evening(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub user_id: String,
    pub team_id: Option<String>,
    /// IANA zone name used for calendar days and hours.
    pub timezone: String,
    pub remote_timeout_secs: u64,
    pub history_window_days: u32,
    pub notifications: NotificationSettings,
}

impl SessionSettings {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs.max(1))
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user_id: "me".to_string(),
            team_id: None,
            timezone: "UTC".to_string(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT.as_secs(),
            history_window_days: DEFAULT_WINDOW_DAYS,
            notifications: NotificationSettings::default(),
        }
    }
}
