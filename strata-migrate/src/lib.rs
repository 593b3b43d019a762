//! # strata-migrate
//!
//! File-based migration discovery and execution.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MigrationKey`] | Sortable `<index>-<date>-<name>` identifier |
//! | [`Migration`] | One unit with `up` / `down` against a target handle |
//! | [`MigrationSource`] | Backing store: [`DirectorySource`], [`EmbeddedSource`] |
//! | [`SourceProvider`] | Resolves a source into a key-ordered [`MigrationSet`] |
//! | [`AppliedRecord`] | Ordered log of applied keys owned by the target system |
//! | [`Migrator`] | Reconciles and runs pending migrations, one at a time |
//! | [`ExecutionResult`] | Top-level error plus per-migration outcomes |

pub mod error;
pub mod key;
pub mod migration;
pub mod migrator;
pub mod provider;
pub mod record;
pub mod result;
pub mod set;
pub mod source;

pub use async_trait::async_trait;
pub use error::{BoxError, ErrorKind, MigrateError};
pub use key::MigrationKey;
pub use migration::{DynMigration, Migration, UnitLoader};
pub use migrator::{MigrationTarget, Migrator};
pub use provider::{MigrationProvider, SourceProvider};
pub use record::{AppliedEntry, AppliedRecord, MemoryRecord};
pub use result::{Direction, ExecutionResult, MigrationInfo, MigrationOutcome, OutcomeStatus};
pub use set::MigrationSet;
pub use source::{DirectorySource, EmbeddedSource, MigrationSource, SourceEntry};

pub mod prelude {
    //! Re-exports of the most commonly used migration types.
    pub use crate::{
        async_trait, AppliedRecord, BoxError, Migration, MigrationKey, MigrationProvider,
        MigrationTarget, Migrator, SourceProvider,
    };
}
