//! Questscribe CLI - play AI-narrated adventures from the terminal

mod commands;
mod config;
mod logging;
mod render;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use questscribe_core::SessionEvent;
use questscribe_http::ClientError;
use tracing::{Level, debug, error, info, warn};

#[derive(Parser)]
#[command(name = "questscribe")]
#[command(about = "Create characters and play AI-narrated adventures")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the session token, configuration and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Configuration file (defaults to questscribe.toml in the data directory)
    #[arg(short = 'c', long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, env = "QUESTSCRIBE_BASE_URL")]
    base_url: Option<String>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    let mut settings = config::Settings::load(&data_dir, cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }
    debug!(base_url = %settings.api.base_url, data_dir = %data_dir.display(), "Starting Questscribe CLI");

    let app = commands::App::new(settings, data_dir)?;
    let mut events = app.client.session().subscribe();

    let result = cli.command.execute(&app).await;

    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::TokenRefreshed => info!("Session token refreshed"),
            SessionEvent::Invalidated { reason } => warn!("Session ended: {reason}"),
            SessionEvent::LoggedIn | SessionEvent::LoggedOut => {}
        }
    }

    match result {
        Ok(()) => {
            debug!("Command completed successfully");
        }
        Err(e) => {
            if e
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_unauthenticated)
            {
                eprintln!("{e}");
                eprintln!("Please log in with `questscribe login` and try again.");
            } else {
                eprintln!("Error: {e:#}");
            }
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
