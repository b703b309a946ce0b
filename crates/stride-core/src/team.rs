//! Team workspace: shared tasks plus their derived statistics.

use crate::diagnostics::NonFatal;
use crate::error::CoreError;
use crate::models::{
    MemberActivity, NewTeamTaskData, OwnerKey, TaskStatus, TeamStats, TeamTask, UpdateTaskData,
};
use crate::error::RemoteError;
use crate::remote::{self, DocumentStore, FieldFilter, StoreMode};
use crate::stats::{ActivityTracker, StatsAggregator, TeamRoster};
use crate::store::{TaskRepository, TaskStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub const TEAM_STATS_COLLECTION: &str = "teamStats";
pub const MEMBER_ACTIVITY_COLLECTION: &str = "teamMemberActivities";

/// Team task store that keeps a [`TeamStats`] snapshot current.
///
/// Every mutation that reached the mirror is followed by a full recompute.
/// The snapshot is swapped atomically, so readers holding an older `Arc`
/// keep a consistent view.
pub struct TeamWorkspace {
    store: TaskStore<TeamTask>,
    team_id: String,
    roster: TeamRoster,
    aggregator: StatsAggregator,
    activity: ActivityTracker,
    stats: Mutex<Arc<TeamStats>>,
}

impl TeamWorkspace {
    /// `store` must be scoped to a team member.
    pub fn new(store: TaskStore<TeamTask>, roster: TeamRoster) -> Result<Self, CoreError> {
        let team_id = store
            .owner()
            .team_id()
            .ok_or_else(|| CoreError::Validation("Team workspace needs a team".to_string()))?
            .to_string();
        let aggregator = StatsAggregator;
        let initial = aggregator.recompute(&team_id, &store.list(), &roster, store.clock().now());
        Ok(Self {
            store,
            team_id,
            roster,
            aggregator,
            activity: ActivityTracker::new(),
            stats: Mutex::new(Arc::new(initial)),
        })
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn store(&self) -> &TaskStore<TeamTask> {
        &self.store
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn stats(&self) -> Arc<TeamStats> {
        Arc::clone(&self.stats.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn activity(&self) -> Vec<MemberActivity> {
        self.activity.snapshot()
    }

    async fn publish_stats(&self) -> Arc<TeamStats> {
        let now = self.store.clock().now();
        let snapshot = Arc::new(self.aggregator.recompute(
            &self.team_id,
            &self.store.list(),
            &self.roster,
            now,
        ));
        *self.stats.lock().unwrap_or_else(|e| e.into_inner()) = Arc::clone(&snapshot);
        tracing::info!(
            team_id = %self.team_id,
            total = snapshot.total_tasks,
            completed = snapshot.completed_tasks,
            rate = snapshot.team_completion_rate,
            "team stats updated"
        );

        let body = match serde_json::to_value(snapshot.as_ref()) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "could not encode team stats");
                return snapshot;
            }
        };
        let filters = vec![FieldFilter::eq("teamId", self.team_id.as_str())];
        let result = self
            .store
            .link()
            .call("stats_sync", move |store| {
                remote::upsert(store, TEAM_STATS_COLLECTION, filters, body)
            })
            .await;
        if let Err(source) = result {
            self.store.link().diagnostics().report(NonFatal::StatsSync {
                team_id: self.team_id.clone(),
                source,
            });
        }
        snapshot
    }

    /// Optimistic bump, then a recount from history, then a best-effort publish.
    async fn track_completion(&self, member: &OwnerKey) {
        let now = self.store.clock().now();
        let name = self.roster.name_of(member.user_id()).to_string();
        self.activity.record_completion(member.user_id(), &name, now);

        let today = self.store.calendar().local_date(now);
        let reconciled = self
            .activity
            .reconcile(member, &name, self.store.history(), today, now);

        let mut body = match serde_json::to_value(&reconciled) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "could not encode member activity");
                return;
            }
        };
        if let serde_json::Value::Object(map) = &mut body {
            map.insert("teamId".to_string(), self.team_id.clone().into());
        }
        let filters = vec![
            FieldFilter::eq("teamId", self.team_id.as_str()),
            FieldFilter::eq("memberId", reconciled.member_id.as_str()),
        ];
        let result = self
            .store
            .link()
            .call("activity_sync", move |store| {
                remote::upsert(store, MEMBER_ACTIVITY_COLLECTION, filters, body)
            })
            .await;
        if let Err(source) = result {
            self.store.link().diagnostics().report(NonFatal::ActivitySync {
                member_id: reconciled.member_id,
                source,
            });
        }
    }
}

/// Reads every stored member activity of `team_id`.
async fn load_activities(
    store: Arc<dyn DocumentStore>,
    team_id: String,
) -> Result<Vec<MemberActivity>, RemoteError> {
    let docs = store
        .query(
            MEMBER_ACTIVITY_COLLECTION,
            &[FieldFilter::eq("teamId", team_id.as_str())],
            None,
        )
        .await?;
    let mut activities = Vec::with_capacity(docs.len());
    for doc in docs {
        activities.push(serde_json::from_value(doc.data)?);
    }
    Ok(activities)
}

/// Errors after which the mirror is unchanged.
fn nothing_applied<T>(result: &Result<T, CoreError>) -> bool {
    matches!(result, Err(err) if !err.is_remote_unavailable())
}

#[async_trait]
impl TaskRepository<TeamTask> for TeamWorkspace {
    async fn add(&self, draft: NewTeamTaskData) -> Result<TeamTask, CoreError> {
        let result = self.store.add(draft).await;
        if !nothing_applied(&result) {
            self.publish_stats().await;
        }
        result
    }

    async fn update(&self, id: &str, patch: UpdateTaskData) -> Result<(), CoreError> {
        let result = self.store.update(id, patch).await;
        if !nothing_applied(&result) {
            self.publish_stats().await;
        }
        result
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let result = self.store.delete(id).await;
        if !nothing_applied(&result) {
            self.publish_stats().await;
        }
        result
    }

    async fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), CoreError> {
        let previous = self.store.get(id).map(|t| t.status);
        let result = self.store.set_status(id, status).await;
        if nothing_applied(&result) {
            return result;
        }
        if status == TaskStatus::Completed && previous != Some(TaskStatus::Completed) {
            let member = self.store.owner().clone();
            self.track_completion(&member).await;
        }
        self.publish_stats().await;
        result
    }

    async fn refresh(&self) -> Result<(), CoreError> {
        let result = self.store.refresh().await;
        let team_id = self.team_id.clone();
        let loaded = self
            .store
            .link()
            .call("activity_load", move |store| load_activities(store, team_id))
            .await;
        self.publish_stats().await;
        match loaded {
            Ok(Some(activities)) => {
                tracing::debug!(count = activities.len(), "member activity loaded");
                self.activity.merge_remote(activities);
                result
            }
            Ok(None) => result,
            Err(err) => result.and(Err(err.into())),
        }
    }

    fn list(&self) -> Vec<TeamTask> {
        self.store.list()
    }

    fn get(&self, id: &str) -> Option<TeamTask> {
        self.store.get(id)
    }

    fn mode(&self) -> StoreMode {
        self.store.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Calendar, FixedClock};
    use crate::diagnostics::RecordingDiagnostics;
    use crate::error::RemoteError;
    use crate::history::CompletionHistory;
    use crate::models::NewTaskData;
    use crate::remote::{MemoryDocumentStore, ModeSwitch, RemoteLink, DEFAULT_REMOTE_TIMEOUT};
    use crate::store::LocalMirror;
    use chrono::{TimeZone, Utc};

    fn workspace() -> (TeamWorkspace, Arc<MemoryDocumentStore>, Arc<RecordingDiagnostics>) {
        let remote = Arc::new(MemoryDocumentStore::new());
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
            OwnerKey::team_member("team-1", "ana"),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 15, 14, 0, 0).unwrap())),
            Calendar::default(),
        );
        let roster = TeamRoster::new().with_member("ana", "Ana").with_member("bo", "Bo");
        (TeamWorkspace::new(store, roster).unwrap(), remote, diagnostics)
    }

    fn draft(title: &str, assignee: Option<&str>) -> NewTeamTaskData {
        NewTeamTaskData {
            task: NewTaskData::titled(title),
            assignee_id: assignee.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn stats_follow_every_mutation() {
        let (ws, remote, _) = workspace();
        let a = ws.add(draft("Design", None)).await.unwrap();
        let b = ws.add(draft("Review", Some("bo"))).await.unwrap();
        assert_eq!(ws.stats().total_tasks, 2);

        ws.set_status(&a.id, TaskStatus::Completed).await.unwrap();
        ws.set_status(&b.id, TaskStatus::InProgress).await.unwrap();
        let stats = ws.stats();
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.in_progress_tasks, 1);
        assert_eq!(stats.team_completion_rate, 50.0);
        assert_eq!(stats.member_contributions[0].member_name, "Ana");

        ws.delete(&b.id).await.unwrap();
        assert_eq!(ws.stats().total_tasks, 1);
        assert_eq!(remote.documents(TEAM_STATS_COLLECTION).len(), 1);
        assert_eq!(remote.documents(TEAM_STATS_COLLECTION)[0].data["totalTasks"], 1);
    }

    #[tokio::test]
    async fn completion_tracks_member_activity() {
        let (ws, remote, _) = workspace();
        let task = ws.add(draft("Ship", None)).await.unwrap();
        ws.set_status(&task.id, TaskStatus::Completed).await.unwrap();
        ws.set_status(&task.id, TaskStatus::Completed).await.unwrap();

        let activity = ws.activity();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].member_name, "Ana");
        assert_eq!(activity[0].task_completed_today, 1);
        assert_eq!(activity[0].current_streak, 1);
        let docs = remote.documents(MEMBER_ACTIVITY_COLLECTION);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["teamId"], "team-1");
    }

    #[tokio::test]
    async fn refresh_loads_member_activity_from_the_remote() {
        let (ws, remote, _) = workspace();
        let task = ws.add(draft("Ship", None)).await.unwrap();
        ws.set_status(&task.id, TaskStatus::Completed).await.unwrap();

        let link = RemoteLink::new(
            remote.clone(),
            DEFAULT_REMOTE_TIMEOUT,
            Arc::new(ModeSwitch::new()),
            Arc::new(RecordingDiagnostics::new()),
        );
        let store = TaskStore::new(
            link,
            Arc::new(LocalMirror::new()),
            Arc::new(CompletionHistory::new()),
            OwnerKey::team_member("team-1", "bo"),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 15, 15, 0, 0).unwrap())),
            Calendar::default(),
        );
        let other = TeamWorkspace::new(store, TeamRoster::new()).unwrap();
        assert!(other.activity().is_empty());

        other.refresh().await.unwrap();
        let activity = other.activity();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].member_id, "ana");
        assert_eq!(activity[0].task_completed_today, 1);
        assert_eq!(other.stats().completed_tasks, 1);
    }

    #[tokio::test]
    async fn unknown_id_leaves_stats_untouched() {
        let (ws, _, _) = workspace();
        let before = ws.stats();
        let err = ws.set_status("nope", TaskStatus::Completed).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(Arc::ptr_eq(&before, &ws.stats()));
    }

    #[tokio::test]
    async fn offline_mutations_still_recompute() {
        let (ws, remote, diagnostics) = workspace();
        remote.set_failure(Some(RemoteError::Network("down".into())));
        let err = ws.add(draft("Offline", None)).await.unwrap_err();
        assert!(err.is_remote_unavailable());
        assert_eq!(ws.mode(), StoreMode::LocalFallback);
        assert_eq!(ws.stats().total_tasks, 1);
        assert_eq!(ws.list()[0].id, "local-team-task-1");
        assert_eq!(diagnostics.count(), 1);
    }
}
