use anyhow::Result;
use owo_colors::OwoColorize;
use stride_core::models::UpdateTaskData;
use stride_core::session::Session;
use stride_core::store::TaskRepository;

use super::load_tasks;
use crate::cli::EditCommand;
use crate::parser::parse_due_date;
use crate::util::resolve_task_id;

pub async fn edit_task(session: &Session, command: EditCommand) -> Result<()> {
    let tasks = load_tasks(session).await;
    let id = resolve_task_id(&tasks.list(), &command.id)?;
    let task = tasks
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Task not found"))?;

    let due_date = command
        .due
        .as_deref()
        .map(|d| parse_due_date(d, session.clock().now(), session.calendar()))
        .transpose()?;

    let tags = if command.add_tag.is_empty() && command.remove_tag.is_empty() {
        None
    } else {
        let mut tags: Vec<String> = task
            .tags
            .iter()
            .filter(|t| !command.remove_tag.contains(t))
            .cloned()
            .collect();
        for tag in command.add_tag {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Some(tags)
    };

    let mut patch = UpdateTaskData {
        title: command.title,
        description: command.description,
        due_date,
        status: command.status,
        priority: command.priority,
        tags,
        assignee_id: None,
    };
    if patch == UpdateTaskData::default() {
        println!("Nothing to change.");
        return Ok(());
    }

    // Status goes through set_status so completions reach the history.
    let status = patch.status.take();
    if patch != UpdateTaskData::default() {
        tasks.update(&id, patch).await?;
    }
    if let Some(status) = status {
        tasks.set_status(&id, status).await?;
    }

    let updated = tasks.get(&id).unwrap_or(task);
    println!("{} Updated task: '{}'", "✓".green().bold(), updated.title);
    Ok(())
}
