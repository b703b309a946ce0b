use super::TaskRecord;
use crate::error::CoreError;
use crate::models::{
    normalize_tags, NewTaskData, NewTeamTaskData, OwnerKey, Task, TaskStatus, TeamTask,
    UpdateTaskData,
};
use crate::remote::FieldFilter;
use chrono::{DateTime, Utc};

pub const TASKS_COLLECTION: &str = "tasks";
pub const TEAM_TASKS_COLLECTION: &str = "teamTasks";

impl TaskRecord for Task {
    type Draft = NewTaskData;

    const COLLECTION: &'static str = TASKS_COLLECTION;
    const LOCAL_ID_PREFIX: &'static str = "local-task-";

    fn build(draft: NewTaskData, owner: &OwnerKey, now: DateTime<Utc>) -> Result<Self, CoreError> {
        draft.validate()?;
        let status = draft.status.unwrap_or_default();
        Ok(Task {
            id: String::new(),
            title: draft.title.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            due_date: draft.due_date.unwrap_or(now),
            status,
            priority: draft.priority.unwrap_or_default(),
            tags: normalize_tags(draft.tags),
            owner_id: owner.user_id().to_string(),
            created_at: now,
            updated_at: now,
            completed_at: (status == TaskStatus::Completed).then_some(now),
        })
    }

    fn task(&self) -> &Task {
        self
    }

    fn task_mut(&mut self) -> &mut Task {
        self
    }

    fn scope_filters(owner: &OwnerKey) -> Vec<FieldFilter> {
        vec![FieldFilter::eq("userId", owner.user_id())]
    }
}

impl TaskRecord for TeamTask {
    type Draft = NewTeamTaskData;

    const COLLECTION: &'static str = TEAM_TASKS_COLLECTION;
    const LOCAL_ID_PREFIX: &'static str = "local-team-task-";

    fn build(draft: NewTeamTaskData, owner: &OwnerKey, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let team_id = owner
            .team_id()
            .ok_or_else(|| CoreError::Validation("Team tasks need a team".to_string()))?
            .to_string();
        let task = Task::build(draft.task, owner, now)?;
        let assignee_id = draft
            .assignee_id
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| owner.user_id().to_string());
        Ok(TeamTask {
            task,
            team_id,
            assignee_id,
            creator_id: owner.user_id().to_string(),
        })
    }

    fn task(&self) -> &Task {
        &self.task
    }

    fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    fn scope_filters(owner: &OwnerKey) -> Vec<FieldFilter> {
        match owner.team_id() {
            Some(team_id) => vec![FieldFilter::eq("teamId", team_id)],
            None => vec![FieldFilter::eq("userId", owner.user_id())],
        }
    }

    fn apply_update(&mut self, patch: &UpdateTaskData) {
        patch.apply_to(&mut self.task);
        if let Some(assignee) = patch.assignee_id.as_deref().map(str::trim) {
            if !assignee.is_empty() {
                self.assignee_id = assignee.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use crate::remote::Document;
    use crate::error::RemoteError;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2026-10-15T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn build_fills_defaults() {
        let draft = NewTaskData {
            title: "  Buy milk ".into(),
            tags: vec![" errand".into(), " ".into()],
            ..Default::default()
        };
        let task = Task::build(draft, &OwnerKey::user("u1"), now()).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.due_date, now());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.tags, vec!["errand".to_string()]);
        assert_eq!(task.owner_id, "u1");
    }

    #[test]
    fn team_task_needs_a_team_scope() {
        let draft = NewTeamTaskData {
            task: NewTaskData::titled("Plan sprint"),
            assignee_id: None,
        };
        assert!(matches!(
            TeamTask::build(draft.clone(), &OwnerKey::user("u1"), now()),
            Err(CoreError::Validation(_))
        ));
        let task = TeamTask::build(draft, &OwnerKey::team_member("t1", "u1"), now()).unwrap();
        assert_eq!(task.assignee_id, "u1");
        assert_eq!(task.creator_id, "u1");
        assert_eq!(task.team_id, "t1");
    }

    #[test]
    fn documents_with_reserved_ids_are_rejected() {
        let mut task = Task::build(NewTaskData::titled("x"), &OwnerKey::user("u1"), now()).unwrap();
        task.id = "abc".into();
        let body = task.to_document().unwrap();
        assert!(body.get("id").is_none());

        let ok = Task::from_document(Document { id: "abc".into(), data: body.clone() }).unwrap();
        assert_eq!(ok, task);

        let err = Task::from_document(Document { id: "local-task-9".into(), data: body }).unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[test]
    fn remote_patch_carries_normalised_touched_fields() {
        let mut task = Task::build(NewTaskData::titled("x"), &OwnerKey::user("u1"), now()).unwrap();
        let patch = UpdateTaskData {
            tags: Some(vec![" a ".into(), "".into()]),
            assignee_id: Some("bob".into()),
            ..Default::default()
        };
        task.apply_update(&patch);
        let value = task.remote_patch(&patch).unwrap();
        assert_eq!(value, json!({"tags": ["a"], "updatedAt": "2026-10-15T09:00:00Z"}));
    }
}
