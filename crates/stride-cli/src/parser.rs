use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use stride_core::clock::Calendar;

/// Parses a human due date ("tomorrow", "next friday 5pm", "2026-11-01")
/// relative to `now`, reading wall-clock times in the calendar's zone.
pub fn parse_due_date(date_str: &str, now: DateTime<Utc>, calendar: Calendar) -> Result<DateTime<Utc>> {
    let local_now = now.with_timezone(&calendar.timezone());
    parse_date_string(date_str, local_now, Dialect::Us)
        .map(|due| due.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Failed to parse due date '{}': {}", date_str, e))
}
