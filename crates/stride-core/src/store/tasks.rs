use super::{TaskRecord, TaskRepository, TaskStore};
use crate::diagnostics::NonFatal;
use crate::error::{CoreError, RemoteError};
use crate::history::{self, HistoryWindow};
use crate::models::{CompletionEvent, HistoryEntry, TaskStatus, UpdateTaskData};
use crate::remote::{is_local_id, OrderBy, StoreMode};
use async_trait::async_trait;

impl<R: TaskRecord> TaskStore<R> {
    /// Applies `patch` to the mirror, returning the record before and after.
    fn apply_local(&self, id: &str, patch: &UpdateTaskData) -> Result<(R, R), CoreError> {
        patch.validate()?;
        let now = self.clock.now();
        self.mirror
            .modify(id, |record| {
                let was_completed = record.task().status == TaskStatus::Completed;
                record.apply_update(patch);
                let task = record.task_mut();
                task.updated_at = now.max(task.created_at);
                match (was_completed, task.status == TaskStatus::Completed) {
                    (false, true) => task.completed_at = Some(task.updated_at),
                    (_, false) => task.completed_at = None,
                    (true, true) => {}
                }
            })
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    async fn push_update(&self, record: &R, patch: &UpdateTaskData) -> Result<(), CoreError> {
        if is_local_id(record.id()) {
            return Ok(());
        }
        let id = record.id().to_string();
        let body = record.remote_patch(patch)?;
        self.link
            .call("update", move |store| async move {
                store.update(R::COLLECTION, &id, body).await
            })
            .await?;
        Ok(())
    }

    /// Mirrors one history entry to the remote. Failures are reported, never returned.
    async fn sync_history(&self, entry: HistoryEntry) {
        let result = self
            .link
            .call("history_sync", move |store| history::upsert_remote(store, entry))
            .await;
        if let Err(source) = result {
            self.link.diagnostics().report(NonFatal::HistorySync {
                owner: self.owner.to_string(),
                source,
            });
        }
    }

    /// `(completed_at, priority)` for every completed record.
    pub fn completion_events(&self) -> Vec<CompletionEvent> {
        self.mirror
            .snapshot()
            .iter()
            .map(|r| r.task())
            .filter_map(|t| {
                t.completion_instant().map(|completed_at| CompletionEvent {
                    completed_at,
                    priority: t.priority,
                })
            })
            .collect()
    }

    /// Records not yet completed.
    pub fn pending_count(&self) -> usize {
        self.mirror
            .snapshot()
            .iter()
            .filter(|r| r.task().status != TaskStatus::Completed)
            .count()
    }

    /// Trailing `days` of this store's completion history, ending today.
    pub fn history_window(&self, days: u32) -> Vec<HistoryEntry> {
        let today = self.calendar.local_date(self.clock.now());
        self.history
            .entries(&self.owner, HistoryWindow::trailing(today, days))
    }
}

#[async_trait]
impl<R: TaskRecord> TaskRepository<R> for TaskStore<R> {
    async fn add(&self, draft: R::Draft) -> Result<R, CoreError> {
        let mut record = R::build(draft, &self.owner, self.clock.now())?;
        let body = record.to_document()?;

        let inserted = self
            .link
            .call("insert", move |store| async move {
                let id = store.insert(R::COLLECTION, body).await?;
                if is_local_id(&id) {
                    return Err(RemoteError::InvalidResponse(format!(
                        "remote assigned reserved id {}",
                        id
                    )));
                }
                Ok(id)
            })
            .await;

        let (id, outcome) = match inserted {
            Ok(Some(id)) => (id, Ok(())),
            Ok(None) => (self.mirror.next_local_id(), Ok(())),
            Err(err) => (self.mirror.next_local_id(), Err(CoreError::RemoteUnavailable(err))),
        };
        record.task_mut().id = id;
        self.mirror.insert(record.clone());
        tracing::debug!(id = %record.id(), collection = R::COLLECTION, "task added");
        outcome.map(|()| record)
    }

    async fn update(&self, id: &str, patch: UpdateTaskData) -> Result<(), CoreError> {
        let (_, after) = self.apply_local(id, &patch)?;
        self.push_update(&after, &patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let removed = self
            .mirror
            .remove(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if is_local_id(removed.id()) {
            return Ok(());
        }
        let id = removed.id().to_string();
        self.link
            .call("delete", move |store| async move {
                store.delete(R::COLLECTION, &id).await
            })
            .await?;
        Ok(())
    }

    async fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), CoreError> {
        let patch = UpdateTaskData::status(status);
        let (before, after) = self.apply_local(id, &patch)?;
        let pushed = self.push_update(&after, &patch).await;

        if before.task().status != TaskStatus::Completed && status == TaskStatus::Completed {
            let today = self.calendar.local_date(self.clock.now());
            let entry = self.history.record_completion(today, &self.owner);
            tracing::debug!(owner = %self.owner, completed = entry.completed_tasks, "completion recorded");
            self.sync_history(entry).await;
        }
        pushed
    }

    async fn refresh(&self) -> Result<(), CoreError> {
        let filters = R::scope_filters(&self.owner);
        let owner = self.owner.clone();
        let fetched = self
            .link
            .call("refresh", move |store| async move {
                let docs = store
                    .query(R::COLLECTION, &filters, Some(OrderBy::desc("createdAt")))
                    .await?;
                let records = docs
                    .into_iter()
                    .map(R::from_document)
                    .collect::<Result<Vec<R>, RemoteError>>()?;
                let entries = history::load_remote(store, &owner).await?;
                Ok((records, entries))
            })
            .await?;

        if let Some((records, entries)) = fetched {
            tracing::debug!(count = records.len(), collection = R::COLLECTION, "mirror refreshed");
            self.mirror.replace_all(records);
            self.history.merge_remote(entries);
        }
        Ok(())
    }

    fn list(&self) -> Vec<R> {
        self.mirror.snapshot()
    }

    fn get(&self, id: &str) -> Option<R> {
        self.mirror.get(id)
    }

    fn mode(&self) -> StoreMode {
        self.link.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Calendar, Clock, FixedClock};
    use crate::diagnostics::RecordingDiagnostics;
    use crate::history::CompletionHistory;
    use crate::models::{NewTaskData, OwnerKey, Task, TaskPriority};
    use crate::remote::{
        Document, DocumentStore, FieldFilter, MemoryDocumentStore, ModeSwitch, RemoteLink,
        DEFAULT_REMOTE_TIMEOUT,
    };
    use crate::store::LocalMirror;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        remote: Arc<MemoryDocumentStore>,
        clock: Arc<FixedClock>,
        diagnostics: Arc<RecordingDiagnostics>,
        store: TaskStore<Task>,
    }

    fn fixture() -> Fixture {
        let remote = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap()));
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let link = RemoteLink::new(
            remote.clone(),
            DEFAULT_REMOTE_TIMEOUT,
            Arc::new(ModeSwitch::new()),
            diagnostics.clone(),
        );
        let store = TaskStore::new(
            link,
            Arc::new(LocalMirror::new()),
            Arc::new(CompletionHistory::new()),
            OwnerKey::user("u1"),
            clock.clone(),
            Calendar::default(),
        );
        Fixture { remote, clock, diagnostics, store }
    }

    #[tokio::test]
    async fn add_writes_through_to_the_remote() {
        let f = fixture();
        let task = f.store.add(NewTaskData::titled("Write report")).await.unwrap();
        assert!(!task.id.starts_with("local-"));
        assert_eq!(f.remote.documents("tasks").len(), 1);
        assert_eq!(f.store.list(), vec![task]);
        assert_eq!(f.store.mode(), StoreMode::Remote);
    }

    #[tokio::test]
    async fn blank_title_changes_nothing() {
        let f = fixture();
        let err = f.store.add(NewTaskData::titled("")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(f.store.list().is_empty());
        assert_eq!(f.remote.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_without_remote_calls() {
        let f = fixture();
        let update = f.store.update("missing", UpdateTaskData::status(TaskStatus::Completed)).await;
        let delete = f.store.delete("missing").await;
        assert!(matches!(update, Err(CoreError::NotFound(_))));
        assert!(matches!(delete, Err(CoreError::NotFound(_))));
        assert_eq!(f.remote.calls(), 0);
    }

    #[tokio::test]
    async fn failed_update_is_still_applied_locally() {
        let f = fixture();
        let task = f.store.add(NewTaskData::titled("Call mom")).await.unwrap();
        f.remote.set_failure(Some(RemoteError::PermissionDenied("revoked".into())));
        f.clock.advance(Duration::minutes(5));

        let patch = UpdateTaskData { priority: Some(TaskPriority::High), ..Default::default() };
        let err = f.store.update(&task.id, patch).await.unwrap_err();
        assert!(err.is_remote_unavailable());

        let stored = f.store.get(&task.id).unwrap();
        assert_eq!(stored.priority, TaskPriority::High);
        assert_eq!(stored.updated_at, f.clock.now());
        assert_eq!(f.store.mode(), StoreMode::LocalFallback);
        assert_eq!(f.diagnostics.count(), 1);
    }

    #[tokio::test]
    async fn completing_twice_counts_once() {
        let f = fixture();
        let task = f.store.add(NewTaskData::titled("Stretch")).await.unwrap();
        f.store.set_status(&task.id, TaskStatus::Completed).await.unwrap();
        f.store.set_status(&task.id, TaskStatus::Completed).await.unwrap();

        let today = f.clock.now().date_naive();
        let entry = f.store.history().get(today, &OwnerKey::user("u1")).unwrap();
        assert_eq!(entry.completed_tasks, 1);
        assert_eq!(f.remote.documents("taskCompletions").len(), 1);
        assert_eq!(f.store.completion_events().len(), 1);
        assert_eq!(f.store.pending_count(), 0);
    }

    #[tokio::test]
    async fn later_edits_keep_the_completion_instant() {
        let f = fixture();
        let task = f.store.add(NewTaskData::titled("Stretch")).await.unwrap();
        f.clock.advance(Duration::hours(1));
        f.store.set_status(&task.id, TaskStatus::Completed).await.unwrap();
        let completed_at = f.clock.now();

        f.clock.advance(Duration::hours(6));
        let patch = UpdateTaskData { title: Some("Stretch well".into()), ..Default::default() };
        f.store.update(&task.id, patch).await.unwrap();

        let events = f.store.completion_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].completed_at, completed_at);
        assert_eq!(f.remote.documents("tasks")[0].data["completedAt"], json!(completed_at));

        f.store.set_status(&task.id, TaskStatus::Pending).await.unwrap();
        assert!(f.store.get(&task.id).unwrap().completed_at.is_none());
        assert!(f.store.completion_events().is_empty());
    }

    /// Fails every call touching the history collection.
    struct HistoryOutage(MemoryDocumentStore);

    #[async_trait]
    impl DocumentStore for HistoryOutage {
        async fn insert(&self, collection: &str, doc: serde_json::Value) -> Result<String, RemoteError> {
            self.check(collection)?;
            self.0.insert(collection, doc).await
        }
        async fn update(&self, collection: &str, id: &str, patch: serde_json::Value) -> Result<(), RemoteError> {
            self.check(collection)?;
            self.0.update(collection, id, patch).await
        }
        async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
            self.check(collection)?;
            self.0.delete(collection, id).await
        }
        async fn query(
            &self,
            collection: &str,
            filters: &[FieldFilter],
            order_by: Option<OrderBy>,
        ) -> Result<Vec<Document>, RemoteError> {
            self.check(collection)?;
            self.0.query(collection, filters, order_by).await
        }
    }

    impl HistoryOutage {
        fn check(&self, collection: &str) -> Result<(), RemoteError> {
            if collection == "taskCompletions" {
                Err(RemoteError::Network("history shard down".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn history_sync_failure_is_reported_not_returned() {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let link = RemoteLink::new(
            Arc::new(HistoryOutage(MemoryDocumentStore::new())),
            DEFAULT_REMOTE_TIMEOUT,
            Arc::new(ModeSwitch::new()),
            diagnostics.clone(),
        );
        let store: TaskStore<Task> = TaskStore::new(
            link,
            Arc::new(LocalMirror::new()),
            Arc::new(CompletionHistory::new()),
            OwnerKey::user("u1"),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap())),
            Calendar::default(),
        );

        let task = store.add(NewTaskData::titled("Stretch")).await.unwrap();
        store.set_status(&task.id, TaskStatus::Completed).await.unwrap();

        assert_eq!(store.mode(), StoreMode::LocalFallback);
        let events = diagnostics.events();
        assert!(matches!(events[0], NonFatal::RemoteFallback { operation: "history_sync", .. }));
        assert!(matches!(events[1], NonFatal::HistorySync { .. }));
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(store.history().get(today, store.owner()).unwrap().completed_tasks, 1);
    }

    #[tokio::test]
    async fn refresh_replaces_mirror_and_history() {
        let f = fixture();
        f.remote.put(
            "tasks",
            Document {
                id: "r1".into(),
                data: json!({
                    "title": "From elsewhere", "dueDate": "2026-10-16T00:00:00Z",
                    "status": "pending", "priority": "low", "userId": "u1",
                    "createdAt": "2026-10-14T00:00:00Z", "updatedAt": "2026-10-14T00:00:00Z"
                }),
            },
        );
        f.remote.put(
            "taskCompletions",
            Document {
                id: "h1".into(),
                data: json!({"date": "2026-10-14", "userId": "u1", "completedTasks": 3, "totalTasks": 4}),
            },
        );

        f.store.refresh().await.unwrap();
        let tasks = f.store.list();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "r1");
        let window = f.store.history_window(2);
        assert_eq!(window[0].completed_tasks, 3);
        assert_eq!(window[1].completed_tasks, 0);
    }

    #[tokio::test]
    async fn refresh_rejects_reserved_remote_ids() {
        let f = fixture();
        f.store.add(NewTaskData::titled("Keep me")).await.unwrap();
        f.remote.put(
            "tasks",
            Document {
                id: "local-task-1".into(),
                data: json!({
                    "title": "Imposter", "dueDate": "2026-10-16T00:00:00Z",
                    "status": "pending", "priority": "low", "userId": "u1",
                    "createdAt": "2026-10-14T00:00:00Z", "updatedAt": "2026-10-14T00:00:00Z"
                }),
            },
        );

        let err = f.store.refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::RemoteUnavailable(RemoteError::InvalidResponse(_))));
        assert_eq!(f.store.list().len(), 1);
        assert_eq!(f.store.list()[0].title, "Keep me");
        assert_eq!(f.store.mode(), StoreMode::LocalFallback);
    }

    #[tokio::test]
    async fn local_mode_refresh_is_a_no_op() {
        let f = fixture();
        f.remote.set_failure(Some(RemoteError::Network("down".into())));
        let _ = f.store.add(NewTaskData::titled("Buy milk")).await;
        f.remote.set_failure(None);
        let calls = f.remote.calls();

        f.store.refresh().await.unwrap();
        assert_eq!(f.remote.calls(), calls);
        assert_eq!(f.store.list()[0].id, "local-task-1");
    }
}
