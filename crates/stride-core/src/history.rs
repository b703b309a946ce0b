//! Per-day completion counters.
//!
//! One entry per (calendar day, owner). Entries are only ever created or
//! incremented by a transition into `completed`; nothing decrements them.

use crate::error::RemoteError;
use crate::models::{HistoryEntry, OwnerKey};
use crate::remote::{DocumentStore, FieldFilter, OrderBy};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Trailing window of calendar days ending at `end` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub end: NaiveDate,
    pub days: u32,
}

impl HistoryWindow {
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        Self { end, days }
    }

    pub fn start(&self) -> NaiveDate {
        self.end - Duration::days(i64::from(self.days.saturating_sub(1)))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start();
        (0..self.days).map(move |offset| start + Duration::days(i64::from(offset)))
    }
}

/// In-process completion history for every owner of a session.
#[derive(Debug, Default)]
pub struct CompletionHistory {
    entries: Mutex<BTreeMap<(OwnerKey, NaiveDate), HistoryEntry>>,
}

impl CompletionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<(OwnerKey, NaiveDate), HistoryEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Upserts the entry for `(date, owner)`: `{1, 1}` when absent, both
    /// counters +1 otherwise. Returns the updated entry.
    pub fn record_completion(&self, date: NaiveDate, owner: &OwnerKey) -> HistoryEntry {
        let mut entries = self.guard();
        let entry = entries
            .entry((owner.clone(), date))
            .or_insert_with(|| HistoryEntry::empty(date, owner.clone()));
        entry.completed_tasks += 1;
        entry.total_tasks += 1;
        entry.clone()
    }

    /// One entry per day of `window`, ascending, zero-filled for idle days.
    pub fn entries(&self, owner: &OwnerKey, window: HistoryWindow) -> Vec<HistoryEntry> {
        let entries = self.guard();
        window
            .dates()
            .map(|date| {
                entries
                    .get(&(owner.clone(), date))
                    .cloned()
                    .unwrap_or_else(|| HistoryEntry::empty(date, owner.clone()))
            })
            .collect()
    }

    /// Stored entries only, ascending by date.
    pub fn raw_entries(&self, owner: &OwnerKey) -> Vec<HistoryEntry> {
        self.guard()
            .range((owner.clone(), NaiveDate::MIN)..=(owner.clone(), NaiveDate::MAX))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn get(&self, date: NaiveDate, owner: &OwnerKey) -> Option<HistoryEntry> {
        self.guard().get(&(owner.clone(), date)).cloned()
    }

    /// Replaces stored counters with `incoming` values, one per (date, owner).
    /// Used when the remote copy is re-read.
    pub fn merge_remote(&self, incoming: impl IntoIterator<Item = HistoryEntry>) {
        let mut entries = self.guard();
        for entry in incoming {
            entries.insert((entry.owner.clone(), entry.date), entry);
        }
    }
}

/// Colour bucket 0..=4 for the streak grid.
pub fn intensity(entry: &HistoryEntry) -> u8 {
    if entry.total_tasks == 0 {
        return 0;
    }
    let rate = entry.completion_rate();
    if rate <= 0.0 {
        0
    } else if rate < 0.25 {
        1
    } else if rate < 0.5 {
        2
    } else if rate < 0.75 {
        3
    } else {
        4
    }
}

/// Σcompleted / Σtotal over `entries`; `None` when nothing was recorded.
pub fn completion_rate(entries: &[HistoryEntry]) -> Option<f64> {
    let (completed, total) = entries.iter().fold((0u64, 0u64), |(c, t), e| {
        (c + u64::from(e.completed_tasks), t + u64::from(e.total_tasks))
    });
    if total == 0 {
        None
    } else {
        Some(completed as f64 / total as f64)
    }
}

pub const HISTORY_COLLECTION: &str = "taskCompletions";

/// Stored shape of a history entry in the `taskCompletions` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    pub date: NaiveDate,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub completed_tasks: u32,
    pub total_tasks: u32,
}

impl From<&HistoryEntry> for HistoryDocument {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            date: entry.date,
            user_id: entry.owner.user_id().to_string(),
            team_id: entry.owner.team_id().map(str::to_string),
            completed_tasks: entry.completed_tasks,
            total_tasks: entry.total_tasks.max(entry.completed_tasks),
        }
    }
}

impl From<HistoryDocument> for HistoryEntry {
    fn from(doc: HistoryDocument) -> Self {
        let owner = match doc.team_id {
            Some(team_id) => OwnerKey::team_member(team_id, doc.user_id),
            None => OwnerKey::user(doc.user_id),
        };
        Self {
            date: doc.date,
            owner,
            completed_tasks: doc.completed_tasks,
            total_tasks: doc.total_tasks.max(doc.completed_tasks),
        }
    }
}

fn owner_filters(owner: &OwnerKey) -> Vec<FieldFilter> {
    let mut filters = vec![FieldFilter::eq("userId", owner.user_id())];
    if let Some(team_id) = owner.team_id() {
        filters.push(FieldFilter::eq("teamId", team_id));
    }
    filters
}

/// Personal and team entries of one user share `userId`; `teamId` tells them apart.
fn same_owner(doc: &HistoryDocument, owner: &OwnerKey) -> bool {
    doc.user_id == owner.user_id() && doc.team_id.as_deref() == owner.team_id()
}

/// Every remote history document of `owner`, oldest first.
pub(crate) async fn load_remote(
    store: Arc<dyn DocumentStore>,
    owner: &OwnerKey,
) -> Result<Vec<HistoryEntry>, RemoteError> {
    let docs = store
        .query(HISTORY_COLLECTION, &owner_filters(owner), Some(OrderBy::asc("date")))
        .await?;
    let mut entries = Vec::with_capacity(docs.len());
    for doc in docs {
        let history: HistoryDocument = serde_json::from_value(doc.data)?;
        if same_owner(&history, owner) {
            entries.push(HistoryEntry::from(history));
        }
    }
    Ok(entries)
}

/// Writes `entry` over the remote document for its (date, owner), creating it if needed.
pub(crate) async fn upsert_remote(
    store: Arc<dyn DocumentStore>,
    entry: HistoryEntry,
) -> Result<(), RemoteError> {
    let mut filters = owner_filters(&entry.owner);
    filters.push(FieldFilter::eq("date", entry.date.to_string()));
    let body = serde_json::to_value(HistoryDocument::from(&entry))?;

    let existing = store.query(HISTORY_COLLECTION, &filters, None).await?;
    let target = existing.into_iter().find(|doc| {
        serde_json::from_value::<HistoryDocument>(doc.data.clone())
            .map(|h| same_owner(&h, &entry.owner))
            .unwrap_or(false)
    });
    match target {
        Some(doc) => store.update(HISTORY_COLLECTION, &doc.id, body).await,
        None => store.insert(HISTORY_COLLECTION, body).await.map(|_| ()),
    }
}
