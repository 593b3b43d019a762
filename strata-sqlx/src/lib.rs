//! # strata-sqlx — SQLite target for Strata migrations
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-backed
//! pieces needed to run `strata-migrate` against a SQLite database.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqliteRecord`] | `AppliedRecord` kept in a bookkeeping table |
//! | [`SqlMigration`] | Up/down scripts parsed from a `.sql` file |
//! | [`SqlFileLoader`] | `UnitLoader` plugging `SqlMigration` into `DirectorySource` |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `MigrateError` |
//! | [`connect`] | Open a pool, creating the database file when missing |
//!
//! # Quick start
//!
//! ```ignore
//! use strata_migrate::{DirectorySource, Migrator, SourceProvider};
//! use strata_sqlx::{connect, SqlFileLoader, SqliteRecord};
//!
//! let pool = connect("sqlite://app.db").await?;
//! let provider = SourceProvider::new(DirectorySource::new("migrations", SqlFileLoader))
//!     .with_extension("sql");
//! let migrator = Migrator::new(provider, SqliteRecord::new(pool.clone()), pool);
//! let result = migrator.migrate_to_latest().await;
//! ```

pub mod error;
pub mod record;
pub mod sql;

pub use error::{SqlxErrorExt, SqlxResult};
pub use record::{SqliteRecord, DEFAULT_TABLE};
pub use sql::{SqlFileLoader, SqlMigration, SqlParseError};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Open a single-connection pool for `url`, creating the database file when
/// it does not exist.
///
/// Migrations run one at a time, so one connection is all the runner needs;
/// it also keeps `sqlite::memory:` databases alive across queries.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Re-exports of the most commonly used types from both `strata-migrate` and this crate.
pub mod prelude {
    pub use crate::{connect, SqlFileLoader, SqlMigration, SqliteRecord, SqlxErrorExt};
    pub use strata_migrate::prelude::*;
}
