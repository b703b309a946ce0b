use crate::util::short_id;
use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use stride_core::models::{MemberActivity, TaskPriority, TaskStatus, TeamStats};

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub tags: Vec<String>,
    /// Only set for team tasks.
    pub assignee: Option<String>,
}

pub fn display_tasks(tasks: &[ViewTask], now: DateTime<Utc>) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let team = tasks.iter().any(|t| t.assignee.is_some());
    let mut table = Table::new();
    let mut header = vec!["ID", "Title", "Status", "Due", "Tags"];
    if team {
        header.push("Assignee");
    }
    table.set_header(header);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title_cell = Cell::new(&task.title);
        title_cell = match task.status {
            TaskStatus::Completed => title_cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey),
            TaskStatus::Pending | TaskStatus::InProgress => match task.priority {
                TaskPriority::High => title_cell.fg(Color::Red).add_attribute(Attribute::Bold),
                TaskPriority::Medium => title_cell.fg(Color::Yellow),
                TaskPriority::Low => title_cell.fg(Color::Green),
            },
        };
        row.add_cell(title_cell);

        let status_cell = Cell::new(task.status.to_string());
        row.add_cell(match task.status {
            TaskStatus::Completed => status_cell.fg(Color::Green),
            TaskStatus::InProgress => status_cell.fg(Color::Cyan),
            TaskStatus::Pending => status_cell,
        });

        let due_text = task.due_date.humanize();
        let due_cell = if task.status != TaskStatus::Completed && task.due_date < now {
            Cell::new(due_text).fg(Color::Red)
        } else if task.status != TaskStatus::Completed && task.due_date.date_naive() == now.date_naive() {
            Cell::new(due_text).fg(Color::Yellow)
        } else {
            Cell::new(due_text)
        };
        row.add_cell(due_cell);

        row.add_cell(Cell::new(if task.tags.is_empty() {
            "None".to_string()
        } else {
            task.tags.join(", ")
        }));
        if team {
            row.add_cell(Cell::new(task.assignee.as_deref().unwrap_or("")));
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_team_stats(stats: &TeamStats) {
    let mut summary = Table::new();
    summary.set_header(vec!["Total", "Completed", "In progress", "Pending", "Low", "Medium", "High", "Rate"]);
    summary.add_row(vec![
        Cell::new(stats.total_tasks),
        Cell::new(stats.completed_tasks).fg(Color::Green),
        Cell::new(stats.in_progress_tasks).fg(Color::Cyan),
        Cell::new(stats.pending_tasks),
        Cell::new(stats.tasks_by_priority.low),
        Cell::new(stats.tasks_by_priority.medium),
        Cell::new(stats.tasks_by_priority.high),
        Cell::new(format!("{:.1}%", stats.team_completion_rate)).add_attribute(Attribute::Bold),
    ]);
    println!("{summary}");

    if stats.member_contributions.is_empty() {
        println!("No completed tasks yet.");
        return;
    }
    let mut members = Table::new();
    members.set_header(vec!["Member", "Completed", "Share"]);
    for contribution in &stats.member_contributions {
        members.add_row(vec![
            Cell::new(&contribution.member_name),
            Cell::new(contribution.tasks_completed),
            Cell::new(format!("{:.1}%", contribution.completion_percentage)),
        ]);
    }
    println!("{members}");
}

pub fn display_activity(activity: &[MemberActivity]) {
    if activity.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Member", "Today", "This week", "Streak", "Last active"]);
    for member in activity {
        table.add_row(vec![
            Cell::new(&member.member_name),
            Cell::new(member.task_completed_today),
            Cell::new(member.task_completed_this_week),
            Cell::new(member.current_streak),
            Cell::new(member.last_active_at.humanize()),
        ]);
    }
    println!("{table}");
}
