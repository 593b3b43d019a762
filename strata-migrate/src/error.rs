use crate::key::MigrationKey;
use crate::result::Direction;
use std::path::PathBuf;
use std::time::Duration;

/// Boxed error returned by migration units and target-system drivers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of a [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backing store or template unreadable/unwritable.
    Io,
    /// Duplicate keys, malformed entries, unloadable content, missing migrations.
    Resolution,
    /// An unapplied migration sorts before an applied one.
    Order,
    /// A unit's `up`/`down` reported failure (or timed out).
    MigrationFailure,
    /// The applied record could not be read or written.
    Record,
}

/// Errors produced while resolving or executing migrations.
#[derive(Debug)]
pub enum MigrateError {
    Io {
        location: PathBuf,
        source: std::io::Error,
    },
    DuplicateKey(MigrationKey),
    MalformedName {
        entry: String,
        reason: String,
    },
    Load {
        entry: String,
        source: BoxError,
    },
    /// A key in the applied record has no resolved migration.
    Missing(MigrationKey),
    /// The requested target key is not part of the resolved set.
    UnknownTarget(String),
    Order {
        pending: MigrationKey,
        applied: MigrationKey,
    },
    Failed {
        key: MigrationKey,
        direction: Direction,
        source: BoxError,
    },
    Timeout {
        key: MigrationKey,
        direction: Direction,
        after: Duration,
    },
    Record(BoxError),
}

impl MigrateError {
    pub fn io(location: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io {
            location: location.into(),
            source,
        }
    }

    pub fn load(entry: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MigrateError::Load {
            entry: entry.into(),
            source: source.into(),
        }
    }

    /// Construct a `Record` variant from any driver error.
    ///
    /// Used by target-system crates (e.g. `strata-sqlx`) to wrap
    /// driver-specific bookkeeping failures.
    pub fn record(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MigrateError::Record(Box::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Io { .. } => ErrorKind::Io,
            MigrateError::DuplicateKey(_)
            | MigrateError::MalformedName { .. }
            | MigrateError::Load { .. }
            | MigrateError::Missing(_)
            | MigrateError::UnknownTarget(_) => ErrorKind::Resolution,
            MigrateError::Order { .. } => ErrorKind::Order,
            MigrateError::Failed { .. } | MigrateError::Timeout { .. } => {
                ErrorKind::MigrationFailure
            }
            MigrateError::Record(_) => ErrorKind::Record,
        }
    }
}

impl std::fmt::Display for MigrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrateError::Io { location, source } => {
                write!(f, "I/O error at '{}': {source}", location.display())
            }
            MigrateError::DuplicateKey(key) => write!(f, "Duplicate migration key: {key}"),
            MigrateError::MalformedName { entry, reason } => {
                write!(f, "Malformed migration name '{entry}': {reason}")
            }
            MigrateError::Load { entry, source } => {
                write!(f, "Failed to load migration '{entry}': {source}")
            }
            MigrateError::Missing(key) => write!(
                f,
                "Corrupted migrations: previously applied migration {key} is missing"
            ),
            MigrateError::UnknownTarget(key) => write!(f, "Unknown migration target: {key}"),
            MigrateError::Order { pending, applied } => write!(
                f,
                "Unordered migrations: {pending} is not applied but sorts before applied {applied}"
            ),
            MigrateError::Failed {
                key,
                direction,
                source,
            } => write!(f, "Migration {key} failed ({direction}): {source}"),
            MigrateError::Timeout {
                key,
                direction,
                after,
            } => write!(
                f,
                "Migration {key} timed out ({direction}) after {}ms",
                after.as_millis()
            ),
            MigrateError::Record(err) => write!(f, "Applied record error: {err}"),
        }
    }
}

impl std::error::Error for MigrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrateError::Io { source, .. } => Some(source),
            MigrateError::Load { source, .. }
            | MigrateError::Failed { source, .. }
            | MigrateError::Record(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}
