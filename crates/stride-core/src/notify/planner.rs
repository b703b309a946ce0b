use super::messages::{MessageKind, DEFAULT_MESSAGE};
use super::policy::{NoSendReason, NotificationPolicy, PlannedSend, CLASSIFICATION_DAYS};
use super::sink::NotificationSink;
use crate::behavior::BehaviorAnalyzer;
use crate::clock::Calendar;
use crate::diagnostics::{Diagnostics, NonFatal};
use crate::error::CoreError;
use crate::history::DEFAULT_WINDOW_DAYS;
use crate::models::{CompletionEvent, HistoryEntry, OwnerKey};
use crate::store::{TaskRecord, TaskStore};
use crate::streak::current_streak;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// What the planner reads about a user.
pub trait BehaviorSource: Send + Sync {
    fn owner(&self) -> &OwnerKey;
    /// Trailing `days` of history ending today, ascending.
    fn recent_history(&self, days: u32) -> Result<Vec<HistoryEntry>, CoreError>;
    fn completion_events(&self) -> Vec<CompletionEvent>;
    fn pending_tasks(&self) -> usize;
}

impl<R: TaskRecord> BehaviorSource for TaskStore<R> {
    fn owner(&self) -> &OwnerKey {
        TaskStore::owner(self)
    }

    fn recent_history(&self, days: u32) -> Result<Vec<HistoryEntry>, CoreError> {
        Ok(self.history_window(days))
    }

    fn completion_events(&self) -> Vec<CompletionEvent> {
        TaskStore::completion_events(self)
    }

    fn pending_tasks(&self) -> usize {
        self.pending_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub kind: MessageKind,
    pub data: Value,
    pub delay: Option<std::time::Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Skip {
        reason: NoSendReason,
        next: Option<PlannedSend>,
    },
    NothingPending,
    Send(Notification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub plan: Plan,
    /// Set when the sink accepted the notification.
    pub delivery_id: Option<String>,
}

/// One notification tick: evaluate, compose, deliver.
pub struct NotificationPlanner {
    policy: NotificationPolicy,
    analyzer: BehaviorAnalyzer,
    calendar: Calendar,
    sink: Arc<dyn NotificationSink>,
    diagnostics: Arc<dyn Diagnostics>,
    rng: Mutex<fastrand::Rng>,
    history_days: u32,
}

impl NotificationPlanner {
    pub fn new(
        policy: NotificationPolicy,
        calendar: Calendar,
        sink: Arc<dyn NotificationSink>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            policy,
            analyzer: BehaviorAnalyzer::new(calendar),
            calendar,
            sink,
            diagnostics,
            rng: Mutex::new(fastrand::Rng::new()),
            history_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days.max(CLASSIFICATION_DAYS);
        self
    }

    pub fn policy(&self) -> &NotificationPolicy {
        &self.policy
    }

    /// Decides what would be sent at `now` without delivering anything.
    pub fn plan(&self, source: &dyn BehaviorSource, now: DateTime<Utc>) -> Plan {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(reason) = self.policy.check(now) {
            return Plan::Skip {
                reason,
                next: self.policy.plan_next(now, &mut rng),
            };
        }
        let pending = source.pending_tasks();
        if pending == 0 {
            return Plan::NothingPending;
        }

        let user_id = source.owner().user_id().to_string();
        let (message, history) = match source.recent_history(self.history_days) {
            Ok(history) => {
                let today = self.calendar.local_date(now);
                let streak = current_streak(&history, today);
                let week_start = history.len().saturating_sub(CLASSIFICATION_DAYS as usize);
                let family = NotificationPolicy::classify(&history[week_start..], streak);
                tracing::debug!(user_id = %user_id, ?family, streak, "message family chosen");
                (family.pick(&mut rng), history)
            }
            Err(err) => {
                self.diagnostics
                    .report(NonFatal::MessageFallback(err.to_string()));
                (DEFAULT_MESSAGE, Vec::new())
            }
        };

        let pattern = self
            .analyzer
            .analyze_with_events(&user_id, &history, &source.completion_events());
        let optimal_hour = pattern.peak_hour().unwrap_or_else(|| self.calendar.hour(now));
        let optimal_day = pattern
            .peak_weekday()
            .unwrap_or_else(|| self.calendar.weekday_index(now));

        Plan::Send(Notification {
            title: message.title.to_string(),
            body: message.body.to_string(),
            kind: message.kind,
            data: json!({
                "type": message.kind,
                "userId": user_id,
                "pendingTasks": pending,
                "optimalHour": optimal_hour,
                "optimalDay": optimal_day,
            }),
            delay: None,
        })
    }

    /// Plans and, when there is something to send, hands it to the sink.
    /// Delivery failures are reported and swallowed.
    pub async fn tick(&self, source: &dyn BehaviorSource, now: DateTime<Utc>) -> TickOutcome {
        let plan = self.plan(source, now);
        let delivery_id = match &plan {
            Plan::Send(notification) => self.deliver(notification).await,
            Plan::Skip { reason, .. } => {
                tracing::debug!(%reason, "notification skipped");
                None
            }
            Plan::NothingPending => None,
        };
        TickOutcome { plan, delivery_id }
    }

    async fn deliver(&self, notification: &Notification) -> Option<String> {
        let result = self
            .sink
            .schedule(
                &notification.title,
                &notification.body,
                notification.data.clone(),
                notification.delay,
            )
            .await;
        match result {
            Ok(id) => Some(id),
            Err(err) => {
                self.diagnostics.report(NonFatal::Delivery(err));
                None
            }
        }
    }
}
