use crate::error::BoxError;
use async_trait::async_trait;
use std::sync::Arc;

/// One executable migration unit.
///
/// `H` is the opaque handle to the target system (a pool, a connection, a
/// client) supplied by the caller when the [`Migrator`](crate::Migrator) is
/// built. A unit never tracks whether it has been applied; that is the job of
/// the [`AppliedRecord`](crate::AppliedRecord).
///
/// # Example
///
/// ```ignore
/// struct CreateUsers;
///
/// #[async_trait]
/// impl Migration<SqlitePool> for CreateUsers {
///     async fn up(&self, pool: &SqlitePool) -> Result<(), BoxError> {
///         sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)").execute(pool).await?;
///         Ok(())
///     }
///
///     async fn down(&self, pool: &SqlitePool) -> Result<(), BoxError> {
///         sqlx::query("DROP TABLE users").execute(pool).await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Migration<H>: Send + Sync
where
    H: Send + Sync + 'static,
{
    /// Apply the migration.
    async fn up(&self, handle: &H) -> Result<(), BoxError>;

    /// Revert the migration. Units without a revert step succeed without
    /// touching the target.
    async fn down(&self, _handle: &H) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Shared, type-erased migration unit.
pub type DynMigration<H> = Arc<dyn Migration<H>>;

/// Turns the raw content of a backing-store entry into a migration unit.
///
/// [`DirectorySource`](crate::DirectorySource) reads the file and hands the
/// text to its loader; malformed content is reported as an error and surfaces
/// as [`MigrateError::Load`](crate::MigrateError::Load).
pub trait UnitLoader<H>: Send + Sync
where
    H: Send + Sync + 'static,
{
    fn load(&self, entry: &str, content: &str) -> Result<DynMigration<H>, BoxError>;
}
