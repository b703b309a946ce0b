use anyhow::Result;
use std::sync::Arc;
use stride_core::notify::{NotificationSink, Plan};
use stride_core::session::Session;

use super::load_tasks;
use crate::cli::NotifyCommand;
use crate::sink::ConsoleSink;

pub async fn notify(session: &Session, command: NotifyCommand) -> Result<()> {
    let tasks = load_tasks(session).await;
    let sink: Arc<dyn NotificationSink> = Arc::new(ConsoleSink);
    let planner = session.planner(sink);
    let now = session.clock().now();

    let plan = if command.dry_run {
        planner.plan(&tasks, now)
    } else {
        planner.tick(&tasks, now).await.plan
    };

    match plan {
        Plan::Send(notification) if command.dry_run => {
            println!("Would send ({}): {}", notification.kind, notification.title);
            println!("   {}", notification.body);
        }
        Plan::Send(_) => {}
        Plan::NothingPending => println!("Nothing pending, no reminder needed."),
        Plan::Skip { reason, next } => {
            println!("No reminder now: {}.", reason);
            if let Some(next) = next {
                let local = next.at.with_timezone(&session.calendar().timezone());
                println!("Next window opens {}.", local.format("%a %H:%M"));
            }
        }
    }
    Ok(())
}
