pub mod add;
pub mod delete;
pub mod edit;
pub mod insights;
pub mod list;
pub mod notify;
pub mod seed;
pub mod status;
pub mod streak;
pub mod team;

use owo_colors::OwoColorize;
use stride_core::error::CoreError;
use stride_core::models::Task;
use stride_core::session::Session;
use stride_core::store::{TaskRepository, TaskStore};

/// Personal store with its mirror loaded from the database.
pub(crate) async fn load_tasks(session: &Session) -> TaskStore<Task> {
    let tasks = session.tasks();
    if let Err(err) = tasks.refresh().await {
        warn(&err);
    }
    tasks
}

pub(crate) fn warn(err: &CoreError) {
    eprintln!("{} {}", "Warning:".yellow().bold(), err);
}
