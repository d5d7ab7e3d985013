use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tend_core::db;
use tend_core::error::CoreError;
use tend_core::repository::SqliteRepository;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = cli::Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TEND_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let config = config::Config::new()?;
    let user = cli.user.unwrap_or_else(|| config.user.clone());

    let db_pool = db::establish_connection(&config.database_path).await?;
    let repository = SqliteRepository::new(db_pool, config.scheduler_config()?);
    tracing::debug!(user = %user, database = %config.database_path, "repository ready");

    match cli.command {
        cli::Commands::Item(command) => {
            commands::item::item_command(&repository, &user, command).await
        }
        cli::Commands::Site(command) => {
            commands::site::site_command(&repository, &user, command).await
        }
        cli::Commands::Task(command) => {
            commands::task::task_command(&repository, &user, command).await
        }
        cli::Commands::Do(command) => commands::r#do::do_task(&repository, &user, command).await,
        cli::Commands::Due(command) => commands::due::list_due(&repository, &user, command).await,
        cli::Commands::Calendar(command) => {
            commands::calendar::show_calendar(&repository, &user, command, config.calendar_days)
                .await
        }
        cli::Commands::History(command) => {
            commands::history::show_history(&repository, &user, command).await
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
            CoreError::InvalidState(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s.yellow());
            }
            CoreError::AmbiguousId(candidates) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, label) in candidates {
                    eprintln!("  {} ({})", id.yellow(), label);
                }
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!(
                    "{} {}. Use IANA names like 'America/New_York'.",
                    "Error:".style(error_style),
                    s
                );
            }
            _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
