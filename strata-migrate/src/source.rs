//! Backing stores that migrations are discovered in.
//!
//! A [`MigrationSource`] only knows how to enumerate its entries and turn one
//! entry into a unit; filtering, key extraction and duplicate detection live in
//! [`SourceProvider`](crate::SourceProvider) so every store variant resolves
//! the same way.

use crate::error::MigrateError;
use crate::migration::{DynMigration, UnitLoader};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One enumerated entry of a backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub is_file: bool,
}

impl SourceEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: true,
        }
    }
}

/// Capability set of a migration backing store.
#[async_trait]
pub trait MigrationSource<H>: Send + Sync
where
    H: Send + Sync + 'static,
{
    /// Enumerate every entry at the store's location.
    ///
    /// Fails with [`MigrateError::Io`] when the location is missing or unreadable.
    async fn list_entries(&self) -> Result<Vec<SourceEntry>, MigrateError>;

    /// Materialize the unit behind one entry.
    ///
    /// Fails with [`MigrateError::Load`] on malformed content.
    async fn load_unit(&self, entry: &SourceEntry) -> Result<DynMigration<H>, MigrateError>;
}

/// Migrations stored as files in a single directory.
pub struct DirectorySource<H: Send + Sync + 'static> {
    dir: PathBuf,
    loader: Arc<dyn UnitLoader<H>>,
}

impl<H: Send + Sync + 'static> DirectorySource<H> {
    pub fn new(dir: impl Into<PathBuf>, loader: impl UnitLoader<H> + 'static) -> Self {
        Self {
            dir: dir.into(),
            loader: Arc::new(loader),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl<H: Send + Sync + 'static> MigrationSource<H> for DirectorySource<H> {
    async fn list_entries(&self) -> Result<Vec<SourceEntry>, MigrateError> {
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| MigrateError::io(&self.dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| MigrateError::io(&self.dir, e))?
        {
            // Follows symlinks, unlike DirEntry::file_type. A dangling link
            // is not a file and must not fail the listing.
            let is_file = match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) => metadata.is_file(),
                Err(err) => {
                    tracing::debug!(entry = ?entry.file_name(), error = %err, "Skipping unreadable entry");
                    false
                }
            };
            entries.push(SourceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn load_unit(&self, entry: &SourceEntry) -> Result<DynMigration<H>, MigrateError> {
        let path = self.dir.join(&entry.name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| MigrateError::io(&path, e))?;
        let content =
            String::from_utf8(bytes).map_err(|e| MigrateError::load(&entry.name, e))?;
        self.loader
            .load(&entry.name, &content)
            .map_err(|e| MigrateError::load(&entry.name, e))
    }
}

/// Migrations compiled into the binary, registered under entry names.
///
/// ```ignore
/// let source = EmbeddedSource::new()
///     .with("000-2024-01-01-init.migration.rs", Arc::new(Init))
///     .with("001-2024-01-15-add-users.migration.rs", Arc::new(AddUsers));
/// ```
pub struct EmbeddedSource<H: Send + Sync + 'static> {
    entries: Vec<(String, DynMigration<H>)>,
}

impl<H: Send + Sync + 'static> EmbeddedSource<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, unit: DynMigration<H>) -> Self {
        self.add(name, unit);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, unit: DynMigration<H>) {
        self.entries.push((name.into(), unit));
    }
}

impl<H: Send + Sync + 'static> Default for EmbeddedSource<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<H: Send + Sync + 'static> MigrationSource<H> for EmbeddedSource<H> {
    async fn list_entries(&self) -> Result<Vec<SourceEntry>, MigrateError> {
        Ok(self
            .entries
            .iter()
            .map(|(name, _)| SourceEntry::file(name.clone()))
            .collect())
    }

    async fn load_unit(&self, entry: &SourceEntry) -> Result<DynMigration<H>, MigrateError> {
        self.entries
            .iter()
            .find(|(name, _)| *name == entry.name)
            .map(|(_, unit)| Arc::clone(unit))
            .ok_or_else(|| MigrateError::load(&entry.name, "no embedded migration with this name"))
    }
}
