//! # Outreach CRM API Main Entry Point
//!
//! This is the main entry point for the Outreach CRM API service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use outreach_crm::{
    config::{AppConfig, ConfigLoader},
    db,
    error_tracking::{self, ErrorReporter},
    server::run_server,
    telemetry,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "outreach-crm", about = "Outreach CRM API server", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            println!("{}", config.redacted_json()?);
            Ok(())
        }
        Command::Migrate => {
            init_observability(&config)?;
            let db = db::init_pool(&config).await?;
            db::run_migrations(&db).await?;
            Ok(())
        }
        Command::Serve => {
            init_observability(&config)?;
            info!(profile = %config.profile, "Loaded configuration");

            let db = db::init_pool(&config).await?;
            if config.run_migrations {
                db::run_migrations(&db).await?;
            }

            run_server(config, db).await
        }
    }
}

fn init_observability(config: &AppConfig) -> anyhow::Result<()> {
    telemetry::init_tracing(config).context("Failed to initialize tracing")?;
    let reporter =
        ErrorReporter::from_config(config).context("Failed to build error reporter")?;
    error_tracking::install(reporter);
    Ok(())
}
