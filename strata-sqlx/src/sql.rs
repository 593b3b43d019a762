//! Migrations written as plain `.sql` files.
//!
//! A file is split into an up and a down script by marker comments:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```
//!
//! A file without markers is an up script only. Each script runs inside its
//! own transaction, committed before the migrator updates the bookkeeping
//! table. If that update then fails, the schema change stays applied but
//! unrecorded: the run ends with an error outcome for that migration and a
//! `Record` error.

use sqlx::{Executor, SqliteConnection, SqlitePool};
use std::sync::Arc;
use strata_migrate::{async_trait, BoxError, DynMigration, Migration, UnitLoader};

pub const UP_MARKER: &str = "-- migrate:up";
pub const DOWN_MARKER: &str = "-- migrate:down";

/// Content of a migration file that could not be split into scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlParseError(pub String);

impl std::fmt::Display for SqlParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid SQL migration: {}", self.0)
    }
}

impl std::error::Error for SqlParseError {}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Up,
    Down,
}

/// An up script and an optional down script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    up: String,
    down: Option<String>,
}

impl SqlMigration {
    pub fn new(up: impl Into<String>, down: Option<String>) -> Self {
        Self {
            up: up.into(),
            down,
        }
    }

    pub fn parse(content: &str) -> Result<Self, SqlParseError> {
        let mut section = Section::Preamble;
        let mut seen_up = false;
        let mut seen_down = false;
        let mut preamble = String::new();
        let mut up = String::new();
        let mut down = String::new();

        for line in content.lines() {
            let marker = line.trim();
            if marker.eq_ignore_ascii_case(UP_MARKER) {
                if seen_up {
                    return Err(SqlParseError(format!("duplicate '{UP_MARKER}' marker")));
                }
                if seen_down {
                    return Err(SqlParseError(format!(
                        "'{UP_MARKER}' must come before '{DOWN_MARKER}'"
                    )));
                }
                seen_up = true;
                section = Section::Up;
                continue;
            }
            if marker.eq_ignore_ascii_case(DOWN_MARKER) {
                if seen_down {
                    return Err(SqlParseError(format!("duplicate '{DOWN_MARKER}' marker")));
                }
                seen_down = true;
                section = Section::Down;
                continue;
            }

            let buf = match section {
                Section::Preamble => &mut preamble,
                Section::Up => &mut up,
                Section::Down => &mut down,
            };
            buf.push_str(line);
            buf.push('\n');
        }

        if !seen_up && !seen_down {
            up = preamble;
        } else {
            if !seen_up {
                return Err(SqlParseError(format!("missing '{UP_MARKER}' marker")));
            }
            let stray = preamble
                .lines()
                .map(str::trim)
                .any(|l| !l.is_empty() && !l.starts_with("--"));
            if stray {
                return Err(SqlParseError(format!(
                    "statements found before '{UP_MARKER}'"
                )));
            }
        }

        if is_blank(&up) {
            return Err(SqlParseError("up script is empty".into()));
        }
        let down = (!is_blank(&down)).then_some(down);
        Ok(Self { up, down })
    }

    pub fn up_sql(&self) -> &str {
        &self.up
    }

    pub fn down_sql(&self) -> Option<&str> {
        self.down.as_deref()
    }
}

/// Whether a script holds nothing but whitespace and line comments.
fn is_blank(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with("--"))
}

async fn run_script(pool: &SqlitePool, sql: &str) -> Result<(), BoxError> {
    let mut tx = pool.begin().await?;
    // An explicitly typed connection keeps the future Send inside async_trait.
    let conn: &mut SqliteConnection = &mut tx;
    Executor::execute(conn, sqlx::raw_sql(sql)).await?;
    tx.commit().await?;
    Ok(())
}

#[async_trait]
impl Migration<SqlitePool> for SqlMigration {
    async fn up(&self, pool: &SqlitePool) -> Result<(), BoxError> {
        run_script(pool, &self.up).await
    }

    async fn down(&self, pool: &SqlitePool) -> Result<(), BoxError> {
        match &self.down {
            Some(sql) => run_script(pool, sql).await,
            None => Ok(()),
        }
    }
}

/// [`UnitLoader`] parsing file content as a [`SqlMigration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlFileLoader;

impl UnitLoader<SqlitePool> for SqlFileLoader {
    fn load(&self, _entry: &str, content: &str) -> Result<DynMigration<SqlitePool>, BoxError> {
        Ok(Arc::new(SqlMigration::parse(content)?))
    }
}
