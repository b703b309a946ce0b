use crate::models::HistoryEntry;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Days with at least one completion. Duplicate entries for a date collapse.
fn active_days(entries: &[HistoryEntry]) -> BTreeSet<NaiveDate> {
    entries
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.date)
        .collect()
}

/// Consecutive active days ending today, or ending yesterday when today has
/// no completion yet. An idle day before that breaks the streak.
pub fn current_streak(entries: &[HistoryEntry], today: NaiveDate) -> u32 {
    let active = active_days(entries);
    let yesterday = today - Duration::days(1);

    let mut cursor = if active.contains(&today) {
        today
    } else if active.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while active.contains(&cursor) {
        streak += 1;
        cursor = cursor - Duration::days(1);
    }
    streak
}

/// Longest run of consecutive active days anywhere in `entries`.
pub fn longest_streak(entries: &[HistoryEntry]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in active_days(entries) {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
