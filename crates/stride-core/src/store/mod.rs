//! Task persistence with transparent local fallback.
//!
//! [`TaskStore`] is the single entry point for creating and mutating tasks.
//! It writes through to the remote [`DocumentStore`](crate::remote::DocumentStore)
//! while the session is in remote mode and keeps an in-memory [`LocalMirror`]
//! that always reflects every applied mutation. The first remote failure
//! switches the whole session to local-only mode for good.

use crate::clock::{Calendar, Clock};
use crate::error::{CoreError, RemoteError};
use crate::history::CompletionHistory;
use crate::models::{OwnerKey, Task, TaskStatus, UpdateTaskData};
use crate::remote::{is_local_id, Document, FieldFilter, RemoteLink, StoreMode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod records;
pub mod tasks;

/// A record kind the store can persist: personal [`Task`]s or team tasks.
pub trait TaskRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Creation input.
    type Draft: Send + 'static;

    const COLLECTION: &'static str;
    /// Prefix of ids minted while the remote is unavailable.
    const LOCAL_ID_PREFIX: &'static str;

    /// Validates and normalises `draft` into a record without an id.
    fn build(draft: Self::Draft, owner: &OwnerKey, now: DateTime<Utc>) -> Result<Self, CoreError>;

    fn task(&self) -> &Task;

    fn task_mut(&mut self) -> &mut Task;

    /// Equality filters selecting the records visible to `owner`.
    fn scope_filters(owner: &OwnerKey) -> Vec<FieldFilter>;

    fn apply_update(&mut self, patch: &UpdateTaskData) {
        patch.apply_to(self.task_mut());
    }

    fn id(&self) -> &str {
        &self.task().id
    }

    /// Document body: the record without its id.
    fn to_document(&self) -> Result<Value, serde_json::Error> {
        let mut body = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut body {
            map.remove("id");
        }
        Ok(body)
    }

    /// Rejects documents whose id lies in the local id space.
    fn from_document(doc: Document) -> Result<Self, RemoteError> {
        if is_local_id(&doc.id) {
            return Err(RemoteError::InvalidResponse(format!(
                "remote returned reserved id {}",
                doc.id
            )));
        }
        let mut body = doc.data;
        match &mut body {
            Value::Object(map) => {
                map.insert("id".to_string(), Value::String(doc.id));
            }
            _ => {
                return Err(RemoteError::InvalidResponse(format!(
                    "document {} is not an object",
                    doc.id
                )))
            }
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Remote patch for an applied update: the fields `patch` touched, with
    /// their normalised values, plus `updatedAt`.
    fn remote_patch(&self, patch: &UpdateTaskData) -> Result<Value, serde_json::Error> {
        let touched = serde_json::to_value(patch)?;
        let current = self.to_document()?;
        let mut out = serde_json::Map::new();
        if let (Value::Object(touched), Value::Object(current)) = (touched, &current) {
            for key in touched.keys() {
                if let Some(value) = current.get(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out.insert(
            "updatedAt".to_string(),
            serde_json::to_value(self.task().updated_at)?,
        );
        if patch.status.is_some() {
            out.insert(
                "completedAt".to_string(),
                serde_json::to_value(self.task().completed_at)?,
            );
        }
        Ok(Value::Object(out))
    }
}

/// In-memory copy of the records a store knows about.
///
/// Owned by the session and shared with the store by `Arc`. Also the id
/// source for records created while offline.
#[derive(Debug)]
pub struct LocalMirror<R> {
    records: Mutex<Vec<R>>,
    next_local: AtomicU64,
}

impl<R> Default for LocalMirror<R> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_local: AtomicU64::new(1),
        }
    }
}

impl<R: TaskRecord> LocalMirror<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<R>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `local-task-1`, `local-task-2`, ...; never reused within a session.
    pub fn next_local_id(&self) -> String {
        let n = self.next_local.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", R::LOCAL_ID_PREFIX, n)
    }

    pub fn insert(&self, record: R) {
        self.guard().insert(0, record);
    }

    pub fn replace_all(&self, records: Vec<R>) {
        *self.guard() = records;
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.guard().iter().find(|r| r.id() == id).cloned()
    }

    /// Applies `f` to the record with `id`, returning its state before and after.
    pub fn modify(&self, id: &str, f: impl FnOnce(&mut R)) -> Option<(R, R)> {
        let mut records = self.guard();
        let record = records.iter_mut().find(|r| r.id() == id)?;
        let before = record.clone();
        f(record);
        Some((before, record.clone()))
    }

    pub fn remove(&self, id: &str) -> Option<R> {
        let mut records = self.guard();
        let index = records.iter().position(|r| r.id() == id)?;
        Some(records.remove(index))
    }

    /// Newest-created first.
    pub fn snapshot(&self) -> Vec<R> {
        let mut records = self.guard().clone();
        records.sort_by(|a, b| b.task().created_at.cmp(&a.task().created_at));
        records
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

/// Operations shared by the personal store and the team workspace.
#[async_trait]
pub trait TaskRepository<R: TaskRecord>: Send + Sync {
    async fn add(&self, draft: R::Draft) -> Result<R, CoreError>;
    async fn update(&self, id: &str, patch: UpdateTaskData) -> Result<(), CoreError>;
    async fn delete(&self, id: &str) -> Result<(), CoreError>;
    async fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), CoreError>;
    /// Re-reads the remote copy; a no-op in local mode.
    async fn refresh(&self) -> Result<(), CoreError>;
    fn list(&self) -> Vec<R>;
    fn get(&self, id: &str) -> Option<R>;
    fn mode(&self) -> StoreMode;
}

/// Write-through store for one record kind and one owner scope.
pub struct TaskStore<R: TaskRecord> {
    link: RemoteLink,
    mirror: Arc<LocalMirror<R>>,
    history: Arc<CompletionHistory>,
    owner: OwnerKey,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
}

impl<R: TaskRecord> TaskStore<R> {
    pub fn new(
        link: RemoteLink,
        mirror: Arc<LocalMirror<R>>,
        history: Arc<CompletionHistory>,
        owner: OwnerKey,
        clock: Arc<dyn Clock>,
        calendar: Calendar,
    ) -> Self {
        Self {
            link,
            mirror,
            history,
            owner,
            clock,
            calendar,
        }
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    pub fn history(&self) -> &Arc<CompletionHistory> {
        &self.history
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn link(&self) -> &RemoteLink {
        &self.link
    }
}
