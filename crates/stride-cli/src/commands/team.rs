use anyhow::Result;
use owo_colors::OwoColorize;
use stride_core::models::{NewTeamTaskData, TaskStatus};
use stride_core::session::Session;
use stride_core::stats::TeamRoster;
use stride_core::store::TaskRepository;
use stride_core::team::TeamWorkspace;

use super::add::{draft_from, print_created};
use super::delete::confirm;
use super::list::{matches, team_view};
use super::warn;
use crate::cli::{TeamCommand, TeamSubcommand};
use crate::util::resolve_task_id;
use crate::views::table::{display_activity, display_tasks, display_team_stats};

async fn load_workspace(session: &Session, roster: TeamRoster) -> Result<TeamWorkspace> {
    let workspace = session.team_workspace(roster)?;
    if let Err(err) = workspace.refresh().await {
        warn(&err);
    }
    Ok(workspace)
}

pub async fn team_command(session: &Session, roster: TeamRoster, command: TeamCommand) -> Result<()> {
    let workspace = load_workspace(session, roster).await?;

    match command.command {
        TeamSubcommand::Add(add) => {
            let draft = NewTeamTaskData {
                task: draft_from(session, add.task)?,
                assignee_id: add.assignee,
            };
            let added = workspace.add(draft).await?;
            print_created(&added.task);
            println!(
                "  {} Assigned to: {}",
                "→".blue(),
                workspace.roster().name_of(&added.assignee_id)
            );
        }
        TeamSubcommand::List(list) => {
            let tasks = workspace
                .list()
                .into_iter()
                .filter(|t| matches(&list, t.status, &t.tags))
                .map(|t| {
                    let assignee = workspace.roster().name_of(&t.assignee_id).to_string();
                    team_view(t, assignee)
                })
                .collect::<Vec<_>>();
            display_tasks(&tasks, session.clock().now());
        }
        TeamSubcommand::Start(id) => {
            let id = resolve_task_id(&workspace.list(), &id.id)?;
            workspace.set_status(&id, TaskStatus::InProgress).await?;
            println!("Started team task {}.", id);
        }
        TeamSubcommand::Done(id) => {
            let id = resolve_task_id(&workspace.list(), &id.id)?;
            workspace.set_status(&id, TaskStatus::Completed).await?;
            println!("{} Completed team task {}.", "✓".green().bold(), id);
            display_activity(&workspace.activity());
        }
        TeamSubcommand::Delete(delete) => {
            let id = resolve_task_id(&workspace.list(), &delete.id)?;
            let title = workspace.get(&id).map(|t| t.task.title).unwrap_or_default();
            if !confirm(&title, delete.force) {
                println!("Deletion cancelled.");
                return Ok(());
            }
            workspace.delete(&id).await?;
            println!("Deleted team task: '{}'", title);
        }
        TeamSubcommand::Stats => {
            println!(
                "{} {}",
                "Team".bright_white().bold(),
                workspace.team_id().bright_white().bold()
            );
            display_team_stats(&workspace.stats());
            display_activity(&workspace.activity());
        }
    }
    Ok(())
}
