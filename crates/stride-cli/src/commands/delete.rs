use anyhow::Result;
use dialoguer::Confirm;
use stride_core::session::Session;
use stride_core::store::TaskRepository;

use super::load_tasks;
use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

/// Asks before deleting unless `force` is set.
pub(crate) fn confirm(title: &str, force: bool) -> bool {
    if force {
        return true;
    }
    Confirm::new()
        .with_prompt(format!("Are you sure you want to delete task '{}'?", title))
        .default(false)
        .interact()
        .unwrap_or(false)
}

pub async fn delete_task(session: &Session, command: DeleteCommand) -> Result<()> {
    let tasks = load_tasks(session).await;
    let id = resolve_task_id(&tasks.list(), &command.id)?;
    let title = tasks.get(&id).map(|t| t.title).unwrap_or_default();

    if !confirm(&title, command.force) {
        println!("Deletion cancelled.");
        return Ok(());
    }
    tasks.delete(&id).await?;
    println!("Deleted task: '{}'", title);
    Ok(())
}
