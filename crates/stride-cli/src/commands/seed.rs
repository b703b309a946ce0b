use anyhow::Result;
use owo_colors::OwoColorize;
use stride_core::dev::DemoHistory;
use stride_core::session::Session;

use crate::cli::SeedCommand;

pub async fn seed_history(session: &Session, command: SeedCommand) -> Result<()> {
    let mut generator = match command.seed {
        Some(seed) => DemoHistory::with_rng(fastrand::Rng::with_seed(seed)),
        None => DemoHistory::new(),
    };
    let today = session.calendar().local_date(session.clock().now());
    let entries = generator.generate(&session.owner(), today, command.days);
    let count = session.import_history(entries).await?;
    println!("{} Seeded {} days of demo history.", "✓".green().bold(), count);
    Ok(())
}
