use crate::error::MigrateError;
use crate::key::MigrationKey;
use crate::migration::DynMigration;
use std::collections::BTreeMap;

/// Key-ordered collection of resolved migrations.
///
/// Produced fresh by every [`MigrationProvider::get_migrations`] call. Once
/// handed out it is only read; picking up new migrations means resolving again.
///
/// [`MigrationProvider::get_migrations`]: crate::MigrationProvider::get_migrations
pub struct MigrationSet<H: Send + Sync + 'static> {
    units: BTreeMap<MigrationKey, DynMigration<H>>,
}

impl<H: Send + Sync + 'static> MigrationSet<H> {
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// Add a unit, rejecting a key that is already present.
    pub fn insert(&mut self, key: MigrationKey, unit: DynMigration<H>) -> Result<(), MigrateError> {
        if self.units.contains_key(&key) {
            return Err(MigrateError::DuplicateKey(key));
        }
        self.units.insert(key, unit);
        Ok(())
    }

    pub fn get(&self, key: &MigrationKey) -> Option<&DynMigration<H>> {
        self.units.get(key)
    }

    pub fn contains(&self, key: &MigrationKey) -> bool {
        self.units.contains_key(key)
    }

    /// Keys in ascending (run) order.
    pub fn keys(&self) -> impl Iterator<Item = &MigrationKey> {
        self.units.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MigrationKey, &DynMigration<H>)> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<H: Send + Sync + 'static> Default for MigrationSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Send + Sync + 'static> std::fmt::Debug for MigrationSet<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.units.keys()).finish()
    }
}
