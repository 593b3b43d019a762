//! Applied record kept in a bookkeeping table of the migrated database.

use crate::error::{SqlxErrorExt, SqlxResult};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use strata_migrate::{async_trait, AppliedEntry, AppliedRecord, MigrateError, MigrationKey};

/// Default bookkeeping table name.
pub const DEFAULT_TABLE: &str = "strata_migration";

/// [`AppliedRecord`] stored in a SQLite table.
///
/// Rows carry an explicit `position` so the log keeps application order even
/// when keys were applied out of key order.
///
/// ```ignore
/// let record = SqliteRecord::new(pool.clone());
/// record.ensure_table().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteRecord {
    pool: SqlitePool,
    table: String,
}

impl SqliteRecord {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Use a custom table name.
    ///
    /// The name is interpolated into SQL, so only ASCII letters, digits and
    /// underscores are accepted.
    pub fn with_table(pool: SqlitePool, table: impl Into<String>) -> SqlxResult<Self> {
        let table = table.into();
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(MigrateError::Record(
                format!("invalid migration table name '{table}'").into(),
            ));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the bookkeeping table if it does not exist yet.
    pub async fn ensure_table(&self) -> SqlxResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                name TEXT PRIMARY KEY NOT NULL, \
                position INTEGER NOT NULL, \
                executed_at TEXT NOT NULL\
            )",
            self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_migrate_error())?;
        tracing::debug!(table = %self.table, "Migration table ready");
        Ok(())
    }
}

#[async_trait]
impl AppliedRecord for SqliteRecord {
    async fn load(&self) -> Result<Vec<MigrationKey>, MigrateError> {
        Ok(self.history().await?.into_iter().map(|e| e.key).collect())
    }

    async fn history(&self) -> Result<Vec<AppliedEntry>, MigrateError> {
        self.ensure_table().await?;
        let sql = format!(
            "SELECT name, executed_at FROM {} ORDER BY position",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.into_migrate_error())?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name").map_err(|e| e.into_migrate_error())?;
            let executed_at: String = row
                .try_get("executed_at")
                .map_err(|e| e.into_migrate_error())?;
            let executed_at = match DateTime::parse_from_rfc3339(&executed_at) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(err) => {
                    tracing::warn!(key = %name, value = %executed_at, error = %err, "Unreadable execution timestamp");
                    None
                }
            };
            entries.push(AppliedEntry {
                key: MigrationKey::parse(&name)?,
                executed_at,
            });
        }
        Ok(entries)
    }

    async fn append(&self, key: &MigrationKey) -> Result<(), MigrateError> {
        let sql = format!(
            "INSERT INTO {table} (name, position, executed_at) \
             SELECT ?, COALESCE(MAX(position), 0) + 1, ? FROM {table}",
            table = self.table
        );
        sqlx::query(&sql)
            .bind(key.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| e.into_migrate_error())?;
        Ok(())
    }

    async fn remove_last(&self) -> Result<Option<MigrationKey>, MigrateError> {
        let mut tx = self.pool.begin().await.map_err(|e| e.into_migrate_error())?;

        let select = format!(
            "SELECT name FROM {} ORDER BY position DESC LIMIT 1",
            self.table
        );
        let row = sqlx::query(&select)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| e.into_migrate_error())?;
        let Some(row) = row else {
            return Ok(None);
        };
        let name: String = row.try_get("name").map_err(|e| e.into_migrate_error())?;

        let delete = format!("DELETE FROM {} WHERE name = ?", self.table);
        sqlx::query(&delete)
            .bind(&name)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.into_migrate_error())?;
        tx.commit().await.map_err(|e| e.into_migrate_error())?;

        Ok(Some(MigrationKey::parse(&name)?))
    }
}
