//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli migrate storefront
//! mp-cli migrate admin
//! mp-cli migrate all
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront connection (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin connection (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! - Storefront (`shop` schema): `crates/storefront/migrations/`
//! - Admin (`admin` schema, sessions): `crates/admin/migrations/`
//!
//! Both sets may share one database and one `_sqlx_migrations` table, so
//! each run ignores migrations it does not own.

use sqlx::migrate::{MigrateError, Migrator};
use thiserror::Error;

use super::{CommandError, connect};

fn storefront_migrator() -> Migrator {
    sqlx::migrate!("../storefront/migrations")
}

fn admin_migrator() -> Migrator {
    sqlx::migrate!("../admin/migrations")
}

/// Errors from running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

async fn run(name: &str, var: &'static str, mut migrator: Migrator) -> Result<(), MigrationError> {
    let pool = connect(var).await?;
    migrator.set_ignore_missing(true);

    tracing::info!(target_set = name, count = migrator.migrations.len(), "Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!(target_set = name, "Migrations complete");
    Ok(())
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    run("storefront", "STOREFRONT_DATABASE_URL", storefront_migrator()).await
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    run("admin", "ADMIN_DATABASE_URL", admin_migrator()).await
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_sets_do_not_share_versions() {
        let storefront = storefront_migrator();
        let admin = admin_migrator();
        for ours in storefront.iter() {
            assert!(
                admin.iter().all(|theirs| theirs.version != ours.version),
                "version {} appears in both migration sets",
                ours.version
            );
        }
    }

    #[test]
    fn test_storefront_migrations_create_shop_schema() {
        let storefront = storefront_migrator();
        let first = storefront.iter().next().expect("storefront has migrations");
        assert!(first.sql.contains("CREATE SCHEMA IF NOT EXISTS shop"));
    }
}
