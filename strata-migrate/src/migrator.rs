use crate::error::MigrateError;
use crate::key::MigrationKey;
use crate::migration::DynMigration;
use crate::provider::MigrationProvider;
use crate::record::AppliedRecord;
use crate::result::{Direction, ExecutionResult, MigrationInfo, MigrationOutcome};
use crate::set::MigrationSet;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Where [`Migrator::migrate_to`] should leave the target system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTarget {
    /// Applied up to and including this key, nothing after it.
    Key(MigrationKey),
    /// Nothing applied.
    None,
}

#[derive(Debug, Clone)]
enum Request {
    Latest,
    Up,
    Down,
    To(MigrationTarget),
}

/// Reconciles resolved migrations against the applied record and runs the
/// difference, one unit at a time.
///
/// Every run resolves the provider afresh. A failing unit stops the run; the
/// units that completed before it stay applied and recorded.
///
/// # Example
///
/// ```ignore
/// let provider = SourceProvider::new(DirectorySource::new("migrations", SqlFileLoader))
///     .with_extension("sql");
/// let migrator = Migrator::new(provider, SqliteRecord::new(pool.clone()), pool);
///
/// let result = migrator.migrate_to_latest().await;
/// for outcome in &result.results {
///     println!("{} {:?}", outcome.key, outcome.status);
/// }
/// if let Some(err) = result.error {
///     eprintln!("migration failed: {err}");
///     std::process::exit(1);
/// }
/// ```
pub struct Migrator<H: Send + Sync + 'static> {
    provider: Arc<dyn MigrationProvider<H>>,
    record: Arc<dyn AppliedRecord>,
    handle: H,
    allow_unordered: bool,
    timeout: Option<Duration>,
}

impl<H: Send + Sync + 'static> Migrator<H> {
    pub fn new(
        provider: impl MigrationProvider<H> + 'static,
        record: impl AppliedRecord + 'static,
        handle: H,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            record: Arc::new(record),
            handle,
            allow_unordered: false,
            timeout: None,
        }
    }

    /// Allow applying migrations that sort before already-applied ones.
    pub fn allow_unordered_migrations(mut self, allow: bool) -> Self {
        self.allow_unordered = allow;
        self
    }

    /// Fail a unit that does not complete within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Apply every pending migration in key order.
    pub async fn migrate_to_latest(&self) -> ExecutionResult {
        self.execute(Request::Latest).await
    }

    /// Apply only the next pending migration.
    pub async fn migrate_up(&self) -> ExecutionResult {
        self.execute(Request::Up).await
    }

    /// Revert the most recently applied migration.
    pub async fn migrate_down(&self) -> ExecutionResult {
        self.execute(Request::Down).await
    }

    /// Move forward or backward until `target` is the last applied migration.
    pub async fn migrate_to(&self, target: MigrationTarget) -> ExecutionResult {
        self.execute(Request::To(target)).await
    }

    /// Every resolved migration with its applied state, in key order.
    pub async fn migrations(&self) -> Result<Vec<MigrationInfo>, MigrateError> {
        let set = self.provider.get_migrations().await?;
        let history = self.record.history().await?;
        Ok(set
            .keys()
            .map(|key| {
                let entry = history.iter().find(|e| &e.key == key);
                MigrationInfo {
                    key: key.clone(),
                    applied: entry.is_some(),
                    executed_at: entry.and_then(|e| e.executed_at),
                }
            })
            .collect())
    }

    async fn execute(&self, request: Request) -> ExecutionResult {
        let (set, applied) = match self.prepare().await {
            Ok(state) => state,
            Err(err) => return ExecutionResult::aborted(err),
        };

        let resolved: Vec<MigrationKey> = set.keys().cloned().collect();
        let steps = match plan(&request, &resolved, &applied, self.allow_unordered) {
            Ok(steps) => steps,
            Err(err) => return ExecutionResult::aborted(err),
        };

        if steps.is_empty() {
            tracing::info!("No pending migrations");
        } else {
            tracing::info!(count = steps.len(), "Running migrations");
        }
        self.run(&set, steps).await
    }

    async fn prepare(&self) -> Result<(MigrationSet<H>, Vec<MigrationKey>), MigrateError> {
        let set = self.provider.get_migrations().await?;
        let applied = self.record.load().await?;
        if let Some(missing) = applied.iter().find(|key| !set.contains(key)) {
            return Err(MigrateError::Missing(missing.clone()));
        }
        Ok((set, applied))
    }

    async fn run(
        &self,
        set: &MigrationSet<H>,
        steps: Vec<(MigrationKey, Direction)>,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();

        for (key, direction) in steps {
            let Some(unit) = set.get(&key) else {
                result.error = Some(MigrateError::Missing(key));
                return result;
            };

            let outcome = match self.invoke(unit, &key, direction).await {
                Ok(()) => match direction {
                    Direction::Up => self.record.append(&key).await,
                    Direction::Down => self.record.remove_last().await.map(|_| ()),
                },
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => {
                    tracing::info!(key = %key, direction = %direction, "Migration succeeded");
                    result.results.push(MigrationOutcome::success(key, direction));
                }
                Err(err) => {
                    tracing::warn!(key = %key, direction = %direction, error = %err, "Migration failed");
                    result.results.push(MigrationOutcome::error(key, direction));
                    result.error = Some(err);
                    return result;
                }
            }
        }

        result
    }

    async fn invoke(
        &self,
        unit: &DynMigration<H>,
        key: &MigrationKey,
        direction: Direction,
    ) -> Result<(), MigrateError> {
        let call = async {
            match direction {
                Direction::Up => unit.up(&self.handle).await,
                Direction::Down => unit.down(&self.handle).await,
            }
        };

        let completed = match self.timeout {
            Some(after) => match tokio::time::timeout(after, call).await {
                Ok(completed) => completed,
                Err(_) => {
                    return Err(MigrateError::Timeout {
                        key: key.clone(),
                        direction,
                        after,
                    })
                }
            },
            None => call.await,
        };

        completed.map_err(|source| MigrateError::Failed {
            key: key.clone(),
            direction,
            source,
        })
    }
}

/// Compute the steps a request needs, given resolved keys (ascending) and the
/// applied log (oldest first).
fn plan(
    request: &Request,
    resolved: &[MigrationKey],
    applied: &[MigrationKey],
    allow_unordered: bool,
) -> Result<Vec<(MigrationKey, Direction)>, MigrateError> {
    let up = |keys: Vec<MigrationKey>| -> Vec<(MigrationKey, Direction)> {
        keys.into_iter().map(|k| (k, Direction::Up)).collect()
    };
    let down = |keys: &[MigrationKey]| -> Vec<(MigrationKey, Direction)> {
        keys.iter()
            .rev()
            .map(|k| (k.clone(), Direction::Down))
            .collect()
    };

    match request {
        Request::Latest => Ok(up(pending(resolved, applied, allow_unordered)?)),
        Request::Up => {
            let mut next = pending(resolved, applied, allow_unordered)?;
            next.truncate(1);
            Ok(up(next))
        }
        Request::Down => Ok(down(applied.last().map(std::slice::from_ref).unwrap_or(&[]))),
        Request::To(MigrationTarget::None) => Ok(down(applied)),
        Request::To(MigrationTarget::Key(target)) => {
            if !resolved.contains(target) {
                return Err(MigrateError::UnknownTarget(target.to_string()));
            }
            match applied.iter().position(|k| k == target) {
                Some(pos) => Ok(down(&applied[pos + 1..])),
                None => {
                    let mut keys = pending(resolved, applied, allow_unordered)?;
                    keys.retain(|k| k <= target);
                    Ok(up(keys))
                }
            }
        }
    }
}

/// Resolved keys not yet applied, ascending.
///
/// Unless unordered runs are allowed, a pending key sorting before the
/// highest applied key is an error: applying it would fill a gap in history.
fn pending(
    resolved: &[MigrationKey],
    applied: &[MigrationKey],
    allow_unordered: bool,
) -> Result<Vec<MigrationKey>, MigrateError> {
    let applied_keys: HashSet<&MigrationKey> = applied.iter().collect();
    let pending: Vec<MigrationKey> = resolved
        .iter()
        .filter(|k| !applied_keys.contains(k))
        .cloned()
        .collect();

    if !allow_unordered {
        if let Some(highest) = applied.iter().max() {
            if let Some(gap) = pending.iter().find(|k| *k < highest) {
                return Err(MigrateError::Order {
                    pending: gap.clone(),
                    applied: highest.clone(),
                });
            }
        }
    }

    Ok(pending)
}
