use anyhow::Result;
use chrono::Weekday;
use owo_colors::OwoColorize;
use stride_core::session::Session;

use super::load_tasks;

fn weekday_name(index: usize) -> Weekday {
    // Sunday first.
    [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ][index % 7]
}

pub async fn show_insights(session: &Session) -> Result<()> {
    let tasks = load_tasks(session).await;
    let history = tasks.history_window(session.settings().history_window_days);
    let pattern = session.analyzer().analyze_with_events(
        &session.settings().user_id,
        &history,
        &tasks.completion_events(),
    );

    if pattern.is_neutral() {
        println!("Not enough history yet. Complete a few tasks over several days and check back.");
        return Ok(());
    }

    println!("{}", "Your patterns".bright_white().bold());
    if let Some(hour) = pattern.peak_hour() {
        println!("  {} Most productive hour: {:02}:00", "→".blue(), hour);
    }
    if let Some(day) = pattern.peak_weekday() {
        println!("  {} Most productive day: {}", "→".blue(), weekday_name(day));
    }
    if pattern.average_session_duration > 0 {
        println!(
            "  {} Average session: {} min",
            "→".blue(),
            pattern.average_session_duration
        );
    }
    println!();
    println!("{} {}", "💡".yellow(), pattern.routine_suggestion());
    Ok(())
}
