//! Command implementations for the `strata` CLI.
//!
//! Each submodule corresponds to a top-level CLI command.

use sqlx::SqlitePool;
use strata_core::StrataSettings;
use strata_migrate::{DirectorySource, Migrator, SourceProvider};
use strata_sqlx::{SqlFileLoader, SqliteRecord};

/// Running and reverting migrations — `strata migrate`.
pub mod migrate;

/// Scaffolding — `strata new <name>`.
///
/// Writes the next `<index>-<date>-<name>.migration.<ext>` file into the
/// migrations directory.
pub mod new_migration;

/// Migration listing — `strata status`.
pub mod status;

/// Built-in scaffold template and placeholder rendering.
pub mod templates;

/// Build a migrator over the configured directory and database.
pub async fn open_migrator(
    settings: &StrataSettings,
) -> Result<Migrator<SqlitePool>, Box<dyn std::error::Error>> {
    let url = settings.require_database_url()?;
    let pool = strata_sqlx::connect(url).await?;
    let record = SqliteRecord::with_table(pool.clone(), settings.table.as_str())?;

    let source = DirectorySource::new(&settings.migrations_dir, SqlFileLoader);
    let provider = SourceProvider::new(source).with_extension(settings.extension.as_str());

    let mut migrator =
        Migrator::new(provider, record, pool).allow_unordered_migrations(settings.allow_unordered);
    if let Some(timeout) = settings.timeout {
        migrator = migrator.with_timeout(timeout);
    }
    tracing::debug!(
        dir = %settings.migrations_dir.display(),
        table = %settings.table,
        "Migrator ready"
    );
    Ok(migrator)
}
