//! Behaviour patterns derived from completion history and completion events.
//!
//! Analysis is pure: the same history, events and calendar always give the
//! same pattern. Too little history yields the neutral all-zero pattern.

use crate::clock::Calendar;
use crate::models::{CompletionEvent, HistoryEntry, TaskPriority};
use chrono::{Datelike, Duration};

/// Below this many recorded days the analyzer returns [`BehaviorPattern::neutral`].
/// Zero-filled idle days do not count.
pub const MIN_HISTORY_ENTRIES: usize = 3;

/// Completions closer together than this belong to one working session.
pub const SESSION_GAP_MINUTES: i64 = 45;

const MORNING_HOURS: std::ops::Range<u32> = 5..12;
const MIN_DIFFICULT_SAMPLES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorPattern {
    pub user_id: String,
    /// Relative intensity per local hour, in `[0, 1]`.
    pub hourly_activity: [f64; 24],
    /// Relative intensity per weekday, Sunday first, in `[0, 1]`.
    pub daily_activity: [f64; 7],
    pub prefers_difficult_tasks_in_morning: bool,
    pub prefers_short_tasks_first: bool,
    /// Minutes.
    pub average_session_duration: u32,
}

impl BehaviorPattern {
    pub fn neutral(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            hourly_activity: [0.0; 24],
            daily_activity: [0.0; 7],
            prefers_difficult_tasks_in_morning: false,
            prefers_short_tasks_first: false,
            average_session_duration: 0,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.hourly_activity.iter().all(|v| *v == 0.0) && self.daily_activity.iter().all(|v| *v == 0.0)
    }

    /// Most active local hour; earliest wins ties.
    pub fn peak_hour(&self) -> Option<u32> {
        peak(&self.hourly_activity).map(|i| i as u32)
    }

    /// Most active weekday index (Sunday = 0); earliest wins ties.
    pub fn peak_weekday(&self) -> Option<usize> {
        peak(&self.daily_activity)
    }

    pub fn routine_suggestion(&self) -> String {
        if self.prefers_difficult_tasks_in_morning {
            "Try tackling your hardest tasks in the morning when your focus is strongest.".to_string()
        } else if self.prefers_short_tasks_first {
            "You tend to complete short tasks first. This builds momentum for larger tasks.".to_string()
        } else {
            format!(
                "Your average task session is about {} minutes.",
                self.average_session_duration
            )
        }
    }
}

fn peak(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        if v > 0.0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

fn normalize<const N: usize>(counts: [f64; N]) -> [f64; N] {
    let max = counts.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return [0.0; N];
    }
    counts.map(|c| c / max)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorAnalyzer {
    calendar: Calendar,
}

impl BehaviorAnalyzer {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    pub fn analyze(&self, user_id: &str, history: &[HistoryEntry]) -> BehaviorPattern {
        self.analyze_with_events(user_id, history, &[])
    }

    pub fn analyze_with_events(
        &self,
        user_id: &str,
        history: &[HistoryEntry],
        events: &[CompletionEvent],
    ) -> BehaviorPattern {
        let recorded = history.iter().filter(|e| e.total_tasks > 0).count();
        if recorded < MIN_HISTORY_ENTRIES {
            return BehaviorPattern::neutral(user_id);
        }

        let mut daily = [0.0; 7];
        for entry in history {
            daily[entry.date.weekday().num_days_from_sunday() as usize] += f64::from(entry.completed_tasks);
        }

        let mut events = events.to_vec();
        events.sort_by_key(|e| (e.completed_at, e.priority));

        let mut hourly = [0.0; 24];
        for event in &events {
            hourly[self.calendar.hour(event.completed_at) as usize] += 1.0;
        }

        BehaviorPattern {
            user_id: user_id.to_string(),
            hourly_activity: normalize(hourly),
            daily_activity: normalize(daily),
            prefers_difficult_tasks_in_morning: self.prefers_difficult_in_morning(&events),
            prefers_short_tasks_first: self.prefers_short_first(&events),
            average_session_duration: average_session_minutes(&events),
        }
    }

    fn prefers_difficult_in_morning(&self, events: &[CompletionEvent]) -> bool {
        let hard: Vec<_> = events
            .iter()
            .filter(|e| e.priority == TaskPriority::High)
            .collect();
        if hard.len() < MIN_DIFFICULT_SAMPLES {
            return false;
        }
        let morning = hard
            .iter()
            .filter(|e| MORNING_HOURS.contains(&self.calendar.hour(e.completed_at)))
            .count();
        morning * 2 > hard.len()
    }

    /// Low-priority work is treated as the short work.
    fn prefers_short_first(&self, events: &[CompletionEvent]) -> bool {
        let mean_hour = |priority: TaskPriority| {
            let hours: Vec<f64> = events
                .iter()
                .filter(|e| e.priority == priority)
                .map(|e| {
                    f64::from(self.calendar.hour(e.completed_at))
                        + f64::from(self.calendar.minute(e.completed_at)) / 60.0
                })
                .collect();
            if hours.is_empty() {
                None
            } else {
                Some(hours.iter().sum::<f64>() / hours.len() as f64)
            }
        };
        match (mean_hour(TaskPriority::Low), mean_hour(TaskPriority::High)) {
            (Some(low), Some(high)) => low < high,
            _ => false,
        }
    }
}

/// Mean span in minutes of sessions with more than one completion.
/// `events` must be sorted by time.
fn average_session_minutes(events: &[CompletionEvent]) -> u32 {
    let gap = Duration::minutes(SESSION_GAP_MINUTES);
    let mut spans = Vec::new();
    let mut iter = events.iter();
    let Some(first) = iter.next() else {
        return 0;
    };
    let (mut start, mut last, mut len) = (first.completed_at, first.completed_at, 1usize);
    for event in iter {
        if event.completed_at - last <= gap {
            last = event.completed_at;
            len += 1;
        } else {
            if len > 1 {
                spans.push((last - start).num_minutes());
            }
            start = event.completed_at;
            last = event.completed_at;
            len = 1;
        }
    }
    if len > 1 {
        spans.push((last - start).num_minutes());
    }
    if spans.is_empty() {
        return 0;
    }
    let mean = spans.iter().sum::<i64>() as f64 / spans.len() as f64;
    mean.round().max(0.0) as u32
}
