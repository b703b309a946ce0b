use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use stride_core::models::{NewTaskData, Task};
use stride_core::session::Session;
use stride_core::store::TaskRepository;

use super::load_tasks;
use crate::cli::AddCommand;
use crate::parser::parse_due_date;

pub(crate) fn draft_from(session: &Session, command: AddCommand) -> Result<NewTaskData> {
    let due_date = command
        .due
        .as_deref()
        .map(|d| parse_due_date(d, session.clock().now(), session.calendar()))
        .transpose()?;
    Ok(NewTaskData {
        title: command.title,
        description: command.description,
        due_date,
        status: None,
        priority: command.priority,
        tags: command.tag,
    })
}

pub async fn add_task(session: &Session, command: AddCommand) -> Result<()> {
    let draft = draft_from(session, command)?;
    let tasks = load_tasks(session).await;
    let added = tasks.add(draft).await?;
    print_created(&added);
    Ok(())
}

pub(crate) fn print_created(task: &Task) {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!(
        "{} Created task: {}",
        "✓".style(success_style),
        task.title.bright_white().bold()
    );
    println!("  {} Task ID: {}", "→".style(info_style), task.id.yellow());
    println!(
        "  {} Due: {}",
        "→".style(info_style),
        task.due_date.format("%Y-%m-%d %H:%M").to_string().cyan()
    );
}
