use strata_migrate::MigrateError;

/// Extension trait for converting `sqlx::Error` into `MigrateError`.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for MigrateError`
/// in this crate. Instead, use `.into_migrate_error()` or the `?` operator with `SqlxResult`.
pub trait SqlxErrorExt {
    fn into_migrate_error(self) -> MigrateError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_migrate_error(self) -> MigrateError {
        MigrateError::record(self)
    }
}

/// Convenience alias for bookkeeping results using `MigrateError`.
pub type SqlxResult<T> = Result<T, MigrateError>;
