use anyhow::Result;
use stride_core::models::{TaskStatus, TeamTask};
use stride_core::session::Session;
use stride_core::store::TaskRepository;

use super::load_tasks;
use crate::cli::ListCommand;
use crate::views::table::{display_tasks, ViewTask};

pub(crate) fn matches(command: &ListCommand, status: TaskStatus, tags: &[String]) -> bool {
    command.status.map_or(true, |s| s == status)
        && command
            .tag
            .as_ref()
            .map_or(true, |tag| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
}

pub async fn list_tasks(session: &Session, command: ListCommand) -> Result<()> {
    let tasks = load_tasks(session).await;
    let view_tasks: Vec<ViewTask> = tasks
        .list()
        .into_iter()
        .filter(|t| matches(&command, t.status, &t.tags))
        .map(|t| ViewTask {
            id: t.id,
            title: t.title,
            status: t.status,
            priority: t.priority,
            due_date: t.due_date,
            tags: t.tags,
            assignee: None,
        })
        .collect();
    display_tasks(&view_tasks, session.clock().now());
    Ok(())
}

pub(crate) fn team_view(task: TeamTask, assignee: String) -> ViewTask {
    let TeamTask { task, .. } = task;
    ViewTask {
        id: task.id,
        title: task.title,
        status: task.status,
        priority: task.priority,
        due_date: task.due_date,
        tags: task.tags,
        assignee: Some(assignee),
    }
}
