use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, ConfigProperties, StrataConfig};

/// Settings consumed by the `strata` commands.
///
/// ```yaml
/// strata:
///   database:
///     url: sqlite://app.db
///   migrations:
///     directory: migrations
///     extension: sql
///     table: strata_migration
///     unordered: false
///     width: 3
///     timeout: 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrataSettings {
    /// Connection URL; only the commands that touch the database need it.
    pub database_url: Option<String>,
    pub migrations_dir: PathBuf,
    pub extension: String,
    pub table: String,
    pub allow_unordered: bool,
    /// Scaffold template; `None` uses the built-in one.
    pub template: Option<PathBuf>,
    pub index_width: usize,
    pub timeout: Option<Duration>,
}

impl Default for StrataSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            migrations_dir: PathBuf::from("migrations"),
            extension: "sql".to_string(),
            table: "strata_migration".to_string(),
            allow_unordered: false,
            template: None,
            index_width: 3,
            timeout: None,
        }
    }
}

impl StrataSettings {
    /// The database URL, or `NotFound` when it was never configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::NotFound("strata.database.url".to_string()))
    }
}

impl ConfigProperties for StrataSettings {
    fn prefix() -> &'static str {
        "strata"
    }

    fn from_config(config: &StrataConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let key = |suffix: &str| format!("{}.{suffix}", Self::prefix());

        let extension: String = config.get_or(&key("migrations.extension"), defaults.extension)?;
        let extension = extension.trim_start_matches('.').to_string();
        if extension.is_empty() {
            return Err(ConfigError::Invalid {
                key: key("migrations.extension"),
                message: "must not be empty".into(),
            });
        }

        let index_width: usize = config.get_or(&key("migrations.width"), defaults.index_width)?;
        if index_width == 0 {
            return Err(ConfigError::Invalid {
                key: key("migrations.width"),
                message: "must be at least 1".into(),
            });
        }

        let timeout: Option<u64> = config.get_or(&key("migrations.timeout"), None)?;
        let directory: String = config.get_or(
            &key("migrations.directory"),
            defaults.migrations_dir.to_string_lossy().into_owned(),
        )?;
        let template: Option<String> = config.get_or(&key("migrations.template"), None)?;

        Ok(Self {
            database_url: config.get_or(&key("database.url"), None)?,
            migrations_dir: PathBuf::from(directory),
            extension,
            table: config.get_or(&key("migrations.table"), defaults.table)?,
            allow_unordered: config.get_or(&key("migrations.unordered"), false)?,
            template: template.map(PathBuf::from),
            index_width,
            timeout: timeout.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}
