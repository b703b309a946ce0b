use clap::Parser;
use owo_colors::{OwoColorize, Style};
use stride_core::error::CoreError;
use stride_core::models::TaskStatus;
use stride_core::session::Session;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod parser;
mod sink;
mod timezone;
mod util;
mod views;

use config::StrideConfig;
use util::CliError;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = cli::Cli::parse();

    let config = match StrideConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let session = match open_session(&config).await {
        Ok(session) => session,
        Err(e) => {
            handle_error(e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&session, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&session, command).await,
        cli::Commands::Start(command) => {
            commands::status::set_status(&session, command, TaskStatus::InProgress).await
        }
        cli::Commands::Done(command) => {
            commands::status::set_status(&session, command, TaskStatus::Completed).await
        }
        cli::Commands::Edit(command) => commands::edit::edit_task(&session, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&session, command).await,
        cli::Commands::Streak => commands::streak::show_streak(&session).await,
        cli::Commands::Insights => commands::insights::show_insights(&session).await,
        cli::Commands::Notify(command) => commands::notify::notify(&session, command).await,
        cli::Commands::Seed(command) => commands::seed::seed_history(&session, command).await,
        cli::Commands::Team(command) => {
            commands::team::team_command(&session, config.roster(), command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `STRIDE_LOG` takes the usual filter syntax.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("STRIDE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Opens the SQLite-backed session, or an offline one when the database is
/// unusable. Settings errors are not recoverable.
async fn open_session(config: &StrideConfig) -> anyhow::Result<Session> {
    let mut settings = config.session_settings();
    settings.timezone = timezone::normalize_timezone_input(&settings.timezone)?;

    match Session::open(settings.clone(), &config.database_path).await {
        Ok(session) => Ok(session),
        Err(e @ (CoreError::Config(_) | CoreError::InvalidTimezone(_))) => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, path = %config.database_path, "database unavailable");
            eprintln!(
                "{} Could not open '{}' ({}). Working offline; changes will not be saved.",
                "Warning:".yellow().bold(),
                config.database_path,
                e
            );
            Ok(Session::offline(settings)?)
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::RemoteUnavailable(source) => {
                eprintln!(
                    "{} {} The change was applied locally but not saved.",
                    "Warning:".yellow().bold(),
                    source
                );
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s.yellow());
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else if let Some(CliError::AmbiguousId(prefix, candidates)) = err.downcast_ref::<CliError>() {
        eprintln!(
            "{} Ambiguous ID '{}'.",
            "Error:".style(error_style),
            prefix
        );
        eprintln!("Did you mean one of these?");
        for (id, title) in candidates {
            eprintln!("  {} ({})", id.yellow(), title);
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
