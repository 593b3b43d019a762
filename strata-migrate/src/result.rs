use crate::error::MigrateError;
use crate::key::MigrationKey;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which operation of a unit was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Result of running a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub key: MigrationKey,
    pub direction: Direction,
    pub status: OutcomeStatus,
}

impl MigrationOutcome {
    pub fn success(key: MigrationKey, direction: Direction) -> Self {
        Self {
            key,
            direction,
            status: OutcomeStatus::Success,
        }
    }

    pub fn error(key: MigrationKey, direction: Direction) -> Self {
        Self {
            key,
            direction,
            status: OutcomeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Result of one migrator invocation.
///
/// `error` is set when the run was aborted, either before any unit ran
/// (resolution, order, record failures) or by the failing unit, whose
/// outcome is then the last entry of `results`.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub error: Option<MigrateError>,
    pub results: Vec<MigrationOutcome>,
}

impl ExecutionResult {
    pub(crate) fn aborted(error: MigrateError) -> Self {
        Self {
            error: Some(error),
            results: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a plain `Result`, discarding the outcome list on success.
    pub fn into_result(self) -> Result<Vec<MigrationOutcome>, MigrateError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}

/// Status of one resolved migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub key: MigrationKey,
    pub applied: bool,
    pub executed_at: Option<DateTime<Utc>>,
}
