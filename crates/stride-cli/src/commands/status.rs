use anyhow::Result;
use owo_colors::OwoColorize;
use stride_core::models::TaskStatus;
use stride_core::session::Session;
use stride_core::store::TaskRepository;
use stride_core::streak::current_streak;

use super::load_tasks;
use crate::cli::IdCommand;
use crate::util::resolve_task_id;

pub async fn set_status(session: &Session, command: IdCommand, status: TaskStatus) -> Result<()> {
    let tasks = load_tasks(session).await;
    let id = resolve_task_id(&tasks.list(), &command.id)?;
    let already_done = tasks.get(&id).map(|t| t.status) == Some(TaskStatus::Completed);
    tasks.set_status(&id, status).await?;

    let title = tasks.get(&id).map(|t| t.title).unwrap_or_default();
    match status {
        TaskStatus::Completed if already_done => println!("Task '{}' was already completed.", title),
        TaskStatus::Completed => {
            println!("{} Completed task: '{}'", "✓".green().bold(), title);
            let today = session.calendar().local_date(session.clock().now());
            let streak = current_streak(&tasks.history_window(session.settings().history_window_days), today);
            if streak > 1 {
                println!("  {} {} day streak, keep it going!", "🔥".yellow(), streak);
            }
        }
        TaskStatus::InProgress => println!("Started task: '{}'", title),
        TaskStatus::Pending => println!("Reopened task: '{}'", title),
    }
    Ok(())
}
