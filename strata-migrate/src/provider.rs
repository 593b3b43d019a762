use crate::error::MigrateError;
use crate::key::{split_entry_name, MigrationKey};
use crate::set::MigrationSet;
use crate::source::{MigrationSource, SourceEntry};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces the full set of migrations on demand.
#[async_trait]
pub trait MigrationProvider<H>: Send + Sync
where
    H: Send + Sync + 'static,
{
    /// Resolve every migration currently available.
    async fn get_migrations(&self) -> Result<MigrationSet<H>, MigrateError>;
}

type EntryFilter = Arc<dyn Fn(&SourceEntry) -> bool + Send + Sync>;

/// Resolves a [`MigrationSource`] into a [`MigrationSet`].
///
/// Entries are kept when they are files named `<key>.migration.<ext>` (any
/// extension unless narrowed with [`with_extension`](Self::with_extension)),
/// or when they pass a custom [`with_filter`](Self::with_filter) predicate.
/// Every kept entry must carry a well-formed key; keys must be unique.
pub struct SourceProvider<S> {
    source: S,
    filter: EntryFilter,
}

impl<S> SourceProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: Arc::new(|entry: &SourceEntry| {
                entry.is_file && split_entry_name(&entry.name).is_some()
            }),
        }
    }

    /// Only accept `<key>.migration.<extension>` files.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.filter = Arc::new(move |entry: &SourceEntry| {
            entry.is_file
                && matches!(split_entry_name(&entry.name), Some((_, ext)) if ext == extension)
        });
        self
    }

    /// Replace the entry filter.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&SourceEntry) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether an entry would be picked up by this provider.
    pub fn accepts(&self, entry: &SourceEntry) -> bool {
        (self.filter)(entry)
    }

    /// Resolve the source.
    pub async fn resolve<H>(&self) -> Result<MigrationSet<H>, MigrateError>
    where
        H: Send + Sync + 'static,
        S: MigrationSource<H>,
    {
        let entries = self.source.list_entries().await?;

        let mut keyed: Vec<(MigrationKey, SourceEntry)> = Vec::new();
        for entry in entries.into_iter().filter(|e| self.accepts(e)) {
            let key = match MigrationKey::from_entry_name(&entry.name) {
                Some(key) => key?,
                None => MigrationKey::parse(&entry.name)?,
            };
            if keyed.iter().any(|(k, _)| *k == key) {
                return Err(MigrateError::DuplicateKey(key));
            }
            keyed.push((key, entry));
        }

        let mut set = MigrationSet::new();
        for (key, entry) in keyed {
            tracing::debug!(key = %key, entry = %entry.name, "Loading migration");
            let unit = self.source.load_unit(&entry).await?;
            set.insert(key, unit)?;
        }
        tracing::debug!(count = set.len(), "Resolved migrations");
        Ok(set)
    }
}

#[async_trait]
impl<H, S> MigrationProvider<H> for SourceProvider<S>
where
    H: Send + Sync + 'static,
    S: MigrationSource<H>,
{
    async fn get_migrations(&self) -> Result<MigrationSet<H>, MigrateError> {
        self.resolve().await
    }
}
