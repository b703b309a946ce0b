//! Team statistics and per-member activity rollups.

use crate::history::{CompletionHistory, HistoryWindow};
use crate::models::{
    MemberActivity, MemberContribution, OwnerKey, PriorityBreakdown, TaskPriority, TaskStatus,
    TeamStats, TeamTask,
};
use crate::streak::current_streak;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Display names of team members, keyed by member id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRoster {
    names: BTreeMap<String, String>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(id.into(), name.into());
        self
    }

    /// Falls back to the id itself for unknown members.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl FromIterator<(String, String)> for TeamRoster {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Derives [`TeamStats`] from the current task list alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsAggregator;

impl StatsAggregator {
    pub fn recompute(
        &self,
        team_id: &str,
        tasks: &[TeamTask],
        roster: &TeamRoster,
        now: DateTime<Utc>,
    ) -> TeamStats {
        let mut completed = 0u32;
        let mut pending = 0u32;
        let mut in_progress = 0u32;
        let mut by_priority = PriorityBreakdown::default();
        let mut per_assignee: BTreeMap<&str, u32> = BTreeMap::new();

        for task in tasks {
            match task.status {
                TaskStatus::Completed => {
                    completed += 1;
                    *per_assignee.entry(task.assignee_id.as_str()).or_default() += 1;
                }
                TaskStatus::Pending => pending += 1,
                TaskStatus::InProgress => in_progress += 1,
            }
            match task.priority {
                TaskPriority::Low => by_priority.low += 1,
                TaskPriority::Medium => by_priority.medium += 1,
                TaskPriority::High => by_priority.high += 1,
            }
        }

        let mut member_contributions: Vec<MemberContribution> = per_assignee
            .into_iter()
            .map(|(member_id, done)| MemberContribution {
                member_id: member_id.to_string(),
                member_name: roster.name_of(member_id).to_string(),
                tasks_completed: done,
                completion_percentage: percentage(done, completed),
            })
            .collect();
        member_contributions.sort_by(|a, b| {
            b.tasks_completed
                .cmp(&a.tasks_completed)
                .then_with(|| a.member_id.cmp(&b.member_id))
        });

        let total = completed + pending + in_progress;
        TeamStats {
            team_id: team_id.to_string(),
            total_tasks: total,
            completed_tasks: completed,
            pending_tasks: pending,
            in_progress_tasks: in_progress,
            tasks_by_priority: by_priority,
            member_contributions,
            team_completion_rate: percentage(completed, total),
            last_updated: now,
        }
    }
}

/// Per-member counters: bumped optimistically on completion, then reconciled
/// against the completion history.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    members: Mutex<BTreeMap<String, MemberActivity>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(&self, member_id: &str, member_name: &str, now: DateTime<Utc>) -> MemberActivity {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        let activity = members
            .entry(member_id.to_string())
            .or_insert_with(|| MemberActivity {
                member_id: member_id.to_string(),
                member_name: member_name.to_string(),
                task_completed_today: 0,
                task_completed_this_week: 0,
                current_streak: 1,
                last_active_at: now,
            });
        activity.task_completed_today += 1;
        activity.task_completed_this_week += 1;
        activity.last_active_at = now;
        activity.clone()
    }

    /// Recomputes today, trailing-week and streak figures from `history`.
    pub fn reconcile(
        &self,
        owner: &OwnerKey,
        member_name: &str,
        history: &CompletionHistory,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> MemberActivity {
        let week = history.entries(owner, HistoryWindow::trailing(today, 7));
        let completed_today = week.last().map_or(0, |e| e.completed_tasks);
        let completed_week: u32 = week.iter().map(|e| e.completed_tasks).sum();
        let streak = current_streak(&history.raw_entries(owner), today);

        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        let member_id = owner.user_id().to_string();
        let last_active_at = members.get(&member_id).map_or(now, |a| a.last_active_at);
        let activity = MemberActivity {
            member_id: member_id.clone(),
            member_name: member_name.to_string(),
            task_completed_today: completed_today,
            task_completed_this_week: completed_week.max(completed_today),
            current_streak: streak,
            last_active_at,
        };
        members.insert(member_id, activity.clone());
        activity
    }

    /// Seeds counters from stored documents. A local entry that was active
    /// more recently than the stored one is kept.
    pub fn merge_remote(&self, stored: Vec<MemberActivity>) {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        for activity in stored {
            match members.get(&activity.member_id) {
                Some(local) if local.last_active_at > activity.last_active_at => {}
                _ => {
                    members.insert(activity.member_id.clone(), activity);
                }
            }
        }
    }

    pub fn get(&self, member_id: &str) -> Option<MemberActivity> {
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(member_id)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<MemberActivity> {
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}
