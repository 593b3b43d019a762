use crate::error::MigrateError;
use crate::key::MigrationKey;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// One entry of the applied log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEntry {
    pub key: MigrationKey,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Ordered log of migrations that ran successfully against the target system.
///
/// The log is append / remove-last only: the most recent entry is always the
/// one a rollback undoes.
#[async_trait]
pub trait AppliedRecord: Send + Sync {
    /// Applied keys, oldest first.
    async fn load(&self) -> Result<Vec<MigrationKey>, MigrateError>;

    /// Applied entries with their execution timestamps, oldest first.
    async fn history(&self) -> Result<Vec<AppliedEntry>, MigrateError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .map(|key| AppliedEntry {
                key,
                executed_at: None,
            })
            .collect())
    }

    async fn append(&self, key: &MigrationKey) -> Result<(), MigrateError>;

    /// Drop the most recent entry, returning it.
    async fn remove_last(&self) -> Result<Option<MigrationKey>, MigrateError>;
}

/// In-process applied record.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    entries: Arc<Mutex<Vec<AppliedEntry>>>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-applied sequence of keys.
    pub fn with_applied(keys: impl IntoIterator<Item = MigrationKey>) -> Self {
        let entries = keys
            .into_iter()
            .map(|key| AppliedEntry {
                key,
                executed_at: None,
            })
            .collect();
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Current applied keys, oldest first.
    pub fn keys(&self) -> Vec<MigrationKey> {
        self.lock().iter().map(|e| e.key.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AppliedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AppliedRecord for MemoryRecord {
    async fn load(&self) -> Result<Vec<MigrationKey>, MigrateError> {
        Ok(self.keys())
    }

    async fn history(&self) -> Result<Vec<AppliedEntry>, MigrateError> {
        Ok(self.lock().clone())
    }

    async fn append(&self, key: &MigrationKey) -> Result<(), MigrateError> {
        self.lock().push(AppliedEntry {
            key: key.clone(),
            executed_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn remove_last(&self) -> Result<Option<MigrationKey>, MigrateError> {
        Ok(self.lock().pop().map(|e| e.key))
    }
}
