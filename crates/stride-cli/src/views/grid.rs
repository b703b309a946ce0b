use chrono::Datelike;
use owo_colors::OwoColorize;
use stride_core::history::intensity;
use stride_core::models::HistoryEntry;

const BLOCK: &str = "■";

/// One coloured block per day, oldest first, with weekday initials below.
pub fn render_grid(entries: &[HistoryEntry]) -> String {
    let blocks: Vec<String> = entries
        .iter()
        .map(|entry| match intensity(entry) {
            0 => BLOCK.bright_black().to_string(),
            1 => BLOCK.red().to_string(),
            2 => BLOCK.yellow().to_string(),
            3 => BLOCK.green().to_string(),
            _ => BLOCK.bright_green().bold().to_string(),
        })
        .collect();
    let labels: Vec<String> = entries
        .iter()
        .map(|entry| entry.date.weekday().to_string()[..1].to_string())
        .collect();
    format!("{}\n{}", blocks.join(" "), labels.join(" "))
}
