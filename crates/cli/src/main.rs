//! Threadline CLI - database migrations and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! tl-cli migrate
//!
//! # Load the demo catalog (categories, colors, sizes, products, stock)
//! tl-cli seed
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL`, falling back to
//! `DATABASE_URL`. A `.env` file is loaded if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "Threadline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending storefront database migrations
    Migrate,
    /// Load the demo catalog
    Seed {
        /// Run migrations before seeding
        #[arg(long)]
        migrate: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let pool = commands::connect().await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed { migrate } => {
            if migrate {
                commands::migrate::run(&pool).await?;
            }
            commands::seed::run(&pool).await?;
        }
    }
    Ok(())
}
