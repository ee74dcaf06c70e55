//! Moonlit Promise CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mp-cli migrate storefront
//! mp-cli migrate admin
//! mp-cli migrate all
//!
//! # Insert the sample catalog (skipped if products exist)
//! mp-cli seed catalog
//! mp-cli seed catalog --file my-catalog.yaml
//!
//! # Delete stale OTP requests and expired sessions
//! mp-cli cleanup
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Moonlit Promise CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the database with sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Run one cleanup pass (stale OTPs, expired sessions)
    Cleanup,
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert sample categories and products
    Catalog {
        /// YAML file to load instead of the built-in catalog
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                let report = commands::seed::catalog(file.as_deref()).await?;
                tracing::info!(
                    "Inserted {} categories and {} products",
                    report.categories,
                    report.products
                );
            }
        },
        Commands::Cleanup => {
            let report = commands::cleanup::run().await?;
            tracing::info!("Removed {} stale OTP requests", report.otp_requests);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_seed_with_file() {
        let cli = Cli::try_parse_from(["mp-cli", "seed", "catalog", "--file", "x.yaml"]).unwrap();
        match cli.command {
            Commands::Seed {
                target: SeedTarget::Catalog { file },
            } => assert_eq!(file, Some(PathBuf::from("x.yaml"))),
            _ => panic!("expected seed catalog"),
        }
    }
}
