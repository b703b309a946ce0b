use anyhow::Result;
use owo_colors::OwoColorize;
use stride_core::history::completion_rate;
use stride_core::session::Session;
use stride_core::streak::{current_streak, longest_streak};

use super::load_tasks;
use crate::views::grid::render_grid;

const GRID_DAYS: u32 = 14;

pub async fn show_streak(session: &Session) -> Result<()> {
    let tasks = load_tasks(session).await;
    let today = session.calendar().local_date(session.clock().now());
    let all = session.history().raw_entries(&session.owner());
    let recent = tasks.history_window(GRID_DAYS);

    println!(
        "{} Current streak: {} days",
        "🔥".yellow(),
        current_streak(&all, today).to_string().bold()
    );
    println!(
        "{} Longest streak: {} days",
        "🏆".yellow(),
        longest_streak(&all).to_string().bold()
    );
    if let Some(rate) = completion_rate(&recent) {
        println!("  Completion rate (last {} days): {:.0}%", GRID_DAYS, rate * 100.0);
    }
    println!();
    println!("{}", render_grid(&recent));
    Ok(())
}
