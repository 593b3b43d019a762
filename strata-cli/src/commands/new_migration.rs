use chrono::NaiveDate;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use strata_core::StrataSettings;
use strata_migrate::{key::split_entry_name, MigrateError, MigrationKey};

use super::templates::{render, DEFAULT_TEMPLATE};

/// Count the well-formed migration files with the configured extension.
///
/// A missing directory counts as empty.
pub fn count_migrations(dir: &Path, extension: &str) -> Result<usize, MigrateError> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in fs::read_dir(dir).map_err(|e| MigrateError::io(dir, e))? {
        let entry = entry.map_err(|e| MigrateError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let matches_ext = matches!(split_entry_name(&name), Some((_, ext)) if ext == extension);
        if matches_ext
            && entry.path().is_file()
            && matches!(MigrationKey::from_entry_name(&name), Some(Ok(_)))
        {
            count += 1;
        }
    }
    Ok(count)
}

/// Write a new migration named `name` dated `date` and return its path.
pub fn scaffold(
    settings: &StrataSettings,
    name: &str,
    date: NaiveDate,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = &settings.migrations_dir;
    let index = count_migrations(dir, &settings.extension)?;
    let key = MigrationKey::compose(index, settings.index_width, date, name)?;

    let template = match &settings.template {
        Some(path) => fs::read_to_string(path).map_err(|e| MigrateError::io(path, e))?,
        None => DEFAULT_TEMPLATE.to_string(),
    };
    let date = date.format("%Y-%m-%d").to_string();
    let content = render(
        &template,
        &[("key", key.as_str()), ("name", name), ("date", &date)],
    );

    fs::create_dir_all(dir).map_err(|e| MigrateError::io(dir, e))?;
    let path = dir.join(key.entry_name(&settings.extension));
    if path.exists() {
        return Err(format!("Migration file '{}' already exists", path.display()).into());
    }
    fs::write(&path, content).map_err(|e| MigrateError::io(&path, e))?;
    tracing::debug!(key = %key, path = %path.display(), "Scaffolded migration");
    Ok(path)
}

/// `strata new <name>`, dated today in local time.
pub fn run(settings: &StrataSettings, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = scaffold(settings, name, chrono::Local::now().date_naive())?;
    println!(
        "{} Created migration: {}",
        "✓".green(),
        path.display().to_string().cyan()
    );
    if settings.template.is_none() {
        println!(
            "  {} the up section is empty; other commands will reject this file until it is filled in",
            "note:".yellow()
        );
    }
    Ok(())
}
