use clap::{Parser, Subcommand};
use stride_core::models::{TaskPriority, TaskStatus};

/// Stride: task tracking with completion streaks and gentle nudges
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file (defaults to $STRIDE_CONFIG, then ./stride.toml)
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Mark a task as in progress
    Start(IdCommand),
    /// Mark a task as completed
    Done(IdCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Show current and longest streak with the last 14 days
    Streak,
    /// Show activity patterns and a routine suggestion
    Insights,
    /// Evaluate the notification policy and deliver a reminder
    Notify(NotifyCommand),
    /// Fill the completion history with random demo data
    Seed(SeedCommand),
    /// Work with the configured team
    Team(TeamCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date of the task (e.g. "tomorrow", "next friday 5pm")
    #[arg(long)]
    pub due: Option<String>,
    /// The priority of the task (low, medium, high)
    #[arg(short, long)]
    pub priority: Option<TaskPriority>,
    /// Tags to add to the task
    #[arg(short, long, num_args = 1..)]
    pub tag: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only show tasks with this status
    #[arg(short, long)]
    pub status: Option<TaskStatus>,
    /// Only show tasks carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct IdCommand {
    /// The ID (or a unique prefix of it) of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub due: Option<String>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// Add tags to the task
    #[arg(long, num_args = 1..)]
    pub add_tag: Vec<String>,

    /// Remove tags from the task
    #[arg(long, num_args = 1..)]
    pub remove_tag: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to delete
    pub id: String,
    /// Force deletion without confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct NotifyCommand {
    /// Print the decision without delivering anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SeedCommand {
    /// Number of days of history to generate, ending today
    #[arg(long, default_value_t = 30)]
    pub days: u32,
    /// Seed for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct TeamCommand {
    #[command(subcommand)]
    pub command: TeamSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TeamSubcommand {
    /// Add a team task
    Add(TeamAddCommand),
    /// List team tasks
    List(ListCommand),
    /// Mark a team task as in progress
    Start(IdCommand),
    /// Mark a team task as completed
    Done(IdCommand),
    /// Delete a team task
    Delete(DeleteCommand),
    /// Show team statistics and member activity
    Stats,
}

#[derive(Parser, Debug, Clone)]
pub struct TeamAddCommand {
    #[command(flatten)]
    pub task: AddCommand,
    /// Member the task is assigned to (defaults to you)
    #[arg(short, long)]
    pub assignee: Option<String>,
}
