//! CLI subcommand implementations.

pub mod cleanup;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using the first of `var` or `DATABASE_URL` that is set.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither is set, or
/// `CommandError::Database` if the connection fails.
pub async fn connect(var: &'static str) -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let url = std::env::var(var)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(var))?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(secrecy::ExposeSecret::expose_secret(&url))
        .await?;
    Ok(pool)
}
