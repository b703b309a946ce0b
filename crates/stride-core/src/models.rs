use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

/// A personal task as stored in the `tasks` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `userId` in stored documents.
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the task enters `Completed`, cleared when it leaves it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Instant the task was completed. Older documents without
    /// `completedAt` fall back to `updated_at`.
    pub fn completion_instant(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TaskStatus::Completed => Some(self.completed_at.unwrap_or(self.updated_at)),
            _ => None,
        }
    }
}

/// A task shared by a team. Carries every personal task field; `owner_id`
/// holds the creator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamTask {
    #[serde(flatten)]
    pub task: Task,
    pub team_id: String,
    pub assignee_id: String,
    pub creator_id: String,
}

impl std::ops::Deref for TeamTask {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

/// Data for a new personal task. Unset fields are normalised by the store.
#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Vec<String>,
}

impl NewTaskData {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::CoreError> {
        validate_title(&self.title)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTeamTaskData {
    pub task: NewTaskData,
    /// Defaults to the acting member.
    pub assignee_id: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Only meaningful for team tasks; ignored for personal ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

impl UpdateTaskData {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::CoreError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Applies the patch to the shared task fields.
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tags) = &self.tags {
            task.tags = normalize_tags(tags.clone());
        }
    }
}

fn validate_title(title: &str) -> Result<(), crate::error::CoreError> {
    if title.trim().is_empty() {
        return Err(crate::error::CoreError::Validation(
            "Task title is required".to_string(),
        ));
    }
    Ok(())
}

/// Trims tags and drops empty ones, keeping caller order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whose completion counters a history entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwnerKey {
    User(String),
    TeamMember { team_id: String, user_id: String },
}

impl OwnerKey {
    pub fn user(user_id: impl Into<String>) -> Self {
        OwnerKey::User(user_id.into())
    }

    pub fn team_member(team_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        OwnerKey::TeamMember {
            team_id: team_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            OwnerKey::User(user_id) => user_id,
            OwnerKey::TeamMember { user_id, .. } => user_id,
        }
    }

    pub fn team_id(&self) -> Option<&str> {
        match self {
            OwnerKey::User(_) => None,
            OwnerKey::TeamMember { team_id, .. } => Some(team_id),
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::User(user_id) => write!(f, "user:{}", user_id),
            OwnerKey::TeamMember { team_id, user_id } => write!(f, "team:{}/{}", team_id, user_id),
        }
    }
}

/// Completion counters for one owner on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub owner: OwnerKey,
    pub completed_tasks: u32,
    pub total_tasks: u32,
}

impl HistoryEntry {
    pub fn empty(date: NaiveDate, owner: OwnerKey) -> Self {
        Self {
            date,
            owner,
            completed_tasks: 0,
            total_tasks: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.completed_tasks > 0
    }

    pub fn completion_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            f64::from(self.completed_tasks) / f64::from(self.total_tasks)
        }
    }
}

/// When a task was completed and how important it was. Input for behaviour analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    pub completed_at: DateTime<Utc>,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityBreakdown {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberContribution {
    pub member_id: String,
    pub member_name: String,
    pub tasks_completed: u32,
    pub completion_percentage: f64,
}

/// Derived snapshot of a team's task state. Replaced wholesale on every recompute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_id: String,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub pending_tasks: u32,
    pub in_progress_tasks: u32,
    pub tasks_by_priority: PriorityBreakdown,
    pub member_contributions: Vec<MemberContribution>,
    pub team_completion_rate: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberActivity {
    pub member_id: String,
    pub member_name: String,
    pub task_completed_today: u32,
    pub task_completed_this_week: u32,
    pub current_streak: u32,
    pub last_active_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(status.to_string().parse::<TaskStatus>(), Ok(status));
        }
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn update_patch_only_serializes_set_fields() {
        let patch = UpdateTaskData {
            priority: Some(TaskPriority::High),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "priority": "high" }));
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(NewTaskData::titled("   ").validate().is_err());
        assert!(NewTaskData::titled("Buy milk").validate().is_ok());
        let patch = UpdateTaskData {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn tags_are_trimmed_and_empty_ones_dropped() {
        let tags = normalize_tags(vec![" work ".into(), "".into(), "home".into()]);
        assert_eq!(tags, vec!["work".to_string(), "home".to_string()]);
    }

    #[test]
    fn team_task_document_is_flat() {
        let now = Utc::now();
        let task = TeamTask {
            task: Task {
                id: "t1".into(),
                title: "Ship".into(),
                description: String::new(),
                due_date: now,
                status: TaskStatus::Pending,
                priority: TaskPriority::High,
                tags: vec![],
                owner_id: "alice".into(),
                created_at: now,
                updated_at: now,
                completed_at: None,
            },
            team_id: "team-1".into(),
            assignee_id: "bob".into(),
            creator_id: "alice".into(),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["teamId"], "team-1");
        assert_eq!(value["title"], "Ship");
        assert_eq!(value["userId"], "alice");
        let back: TeamTask = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }
}
