//! Session wiring.
//!
//! A [`Session`] owns everything that must be shared by the stores of one
//! client: the remote link with its one-way mode switch, the local mirrors,
//! the completion history, the clock and the calendar.

use crate::behavior::BehaviorAnalyzer;
use crate::clock::{Calendar, Clock, SystemClock};
use crate::db::establish_connection;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::CoreError;
use crate::history::{self, CompletionHistory};
use crate::models::{HistoryEntry, OwnerKey, Task, TeamTask};
use crate::notify::{NotificationPlanner, NotificationPolicy, NotificationSink};
use crate::remote::{
    DocumentStore, MemoryDocumentStore, ModeSwitch, RemoteLink, SqliteDocumentStore, StoreMode,
};
use crate::settings::SessionSettings;
use crate::stats::TeamRoster;
use crate::store::{LocalMirror, TaskStore};
use crate::team::TeamWorkspace;
use std::sync::Arc;

pub struct SessionBuilder {
    settings: SessionSettings,
    store: Option<Arc<dyn DocumentStore>>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    local_only: bool,
}

impl SessionBuilder {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            store: None,
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(TracingDiagnostics),
            local_only: false,
        }
    }

    pub fn remote(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Starts the session already in local-only mode.
    pub fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    pub fn build(self) -> Result<Session, CoreError> {
        if self.settings.user_id.trim().is_empty() {
            return Err(CoreError::Config("user_id must not be empty".to_string()));
        }
        let calendar = Calendar::from_name(&self.settings.timezone)?;
        let (store, mode) = match self.store {
            Some(store) if !self.local_only => (store, ModeSwitch::new()),
            Some(store) => (store, ModeSwitch::local_only()),
            None => (
                Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
                ModeSwitch::local_only(),
            ),
        };
        let link = RemoteLink::new(
            store,
            self.settings.remote_timeout(),
            Arc::new(mode),
            Arc::clone(&self.diagnostics),
        );
        Ok(Session {
            settings: self.settings,
            link,
            history: Arc::new(CompletionHistory::new()),
            tasks: Arc::new(LocalMirror::new()),
            team_tasks: Arc::new(LocalMirror::new()),
            clock: self.clock,
            calendar,
            diagnostics: self.diagnostics,
        })
    }
}

pub struct Session {
    settings: SessionSettings,
    link: RemoteLink,
    history: Arc<CompletionHistory>,
    tasks: Arc<LocalMirror<Task>>,
    team_tasks: Arc<LocalMirror<TeamTask>>,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Session {
    pub fn builder(settings: SessionSettings) -> SessionBuilder {
        SessionBuilder::new(settings)
    }

    /// Session backed by the SQLite document store at `database_path`.
    pub async fn open(settings: SessionSettings, database_path: &str) -> Result<Self, CoreError> {
        let pool = establish_connection(database_path).await?;
        tracing::debug!(database_path, "document store opened");
        Self::builder(settings)
            .remote(Arc::new(SqliteDocumentStore::new(pool)))
            .build()
    }

    /// Session that never touches a remote store.
    pub fn offline(settings: SessionSettings) -> Result<Self, CoreError> {
        Self::builder(settings).build()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn mode(&self) -> StoreMode {
        self.link.mode()
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn history(&self) -> &Arc<CompletionHistory> {
        &self.history
    }

    pub fn owner(&self) -> OwnerKey {
        OwnerKey::user(self.settings.user_id.clone())
    }

    /// Personal tasks of the session user.
    pub fn tasks(&self) -> TaskStore<Task> {
        TaskStore::new(
            self.link.clone(),
            Arc::clone(&self.tasks),
            Arc::clone(&self.history),
            self.owner(),
            Arc::clone(&self.clock),
            self.calendar,
        )
    }

    /// Tasks of the configured team, acting as the session user.
    pub fn team_tasks(&self) -> Result<TaskStore<TeamTask>, CoreError> {
        let team_id = self
            .settings
            .team_id
            .clone()
            .ok_or_else(|| CoreError::Config("no team_id configured".to_string()))?;
        Ok(TaskStore::new(
            self.link.clone(),
            Arc::clone(&self.team_tasks),
            Arc::clone(&self.history),
            OwnerKey::team_member(team_id, self.settings.user_id.clone()),
            Arc::clone(&self.clock),
            self.calendar,
        ))
    }

    pub fn team_workspace(&self, roster: TeamRoster) -> Result<TeamWorkspace, CoreError> {
        TeamWorkspace::new(self.team_tasks()?, roster)
    }

    /// Merges `entries` into the history and writes them through to the
    /// remote. Local state is kept even when the remote write fails.
    pub async fn import_history(&self, entries: Vec<HistoryEntry>) -> Result<usize, CoreError> {
        let count = entries.len();
        self.history.merge_remote(entries.clone());
        self.link
            .call("history_import", move |store| async move {
                for entry in entries {
                    history::upsert_remote(Arc::clone(&store), entry).await?;
                }
                Ok(())
            })
            .await?;
        Ok(count)
    }

    pub fn analyzer(&self) -> BehaviorAnalyzer {
        BehaviorAnalyzer::new(self.calendar)
    }

    pub fn planner(&self, sink: Arc<dyn NotificationSink>) -> NotificationPlanner {
        NotificationPlanner::new(
            NotificationPolicy::new(self.settings.notifications.clone(), self.calendar),
            self.calendar,
            sink,
            Arc::clone(&self.diagnostics),
        )
        .with_history_days(self.settings.history_window_days)
    }
}
