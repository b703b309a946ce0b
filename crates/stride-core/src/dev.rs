//! Development fixtures. Compiled only for tests and with the `demo-data` feature.

use crate::models::{HistoryEntry, OwnerKey};
use chrono::{Duration, NaiveDate};

/// Random completion history for demos.
///
/// Each day gets 1 to 5 tasks with a random share of them completed, which
/// is enough to light up the streak grid and the insights view.
pub struct DemoHistory {
    rng: fastrand::Rng,
    max_tasks_per_day: u32,
}

impl DemoHistory {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            max_tasks_per_day: 5,
        }
    }

    pub fn max_tasks_per_day(mut self, max: u32) -> Self {
        self.max_tasks_per_day = max.max(1);
        self
    }

    /// One entry per day for the `days` days ending at `end`, oldest first.
    pub fn generate(&mut self, owner: &OwnerKey, end: NaiveDate, days: u32) -> Vec<HistoryEntry> {
        (0..i64::from(days))
            .rev()
            .map(|ago| {
                let total = self.rng.u32(1..=self.max_tasks_per_day);
                let completed = self.rng.u32(0..=total);
                HistoryEntry {
                    date: end - Duration::days(ago),
                    owner: owner.clone(),
                    completed_tasks: completed,
                    total_tasks: total,
                }
            })
            .collect()
    }
}

impl Default for DemoHistory {
    fn default() -> Self {
        Self::new()
    }
}
