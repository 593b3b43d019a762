use crate::error::MigrateError;
use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Borrow;

/// Fixed infix separating a migration key from its file extension.
pub const MIGRATION_INFIX: &str = ".migration.";

const DATE_LEN: usize = "YYYY-MM-DD".len();

/// Unique, sortable identifier of one migration.
///
/// A key has the shape `<zero-padded-index>-<YYYY-MM-DD>-<name>`. Keys compare
/// lexically, so the zero-padded index forces run order to match creation
/// order even when names would sort differently.
///
/// ```
/// use strata_migrate::MigrationKey;
///
/// let key = MigrationKey::parse("003-2024-05-01-add-users").unwrap();
/// assert_eq!(key.index(), "003");
/// assert_eq!(key.name(), "add-users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MigrationKey(String);

impl MigrationKey {
    /// Parse and validate a key against the naming grammar.
    pub fn parse(stem: &str) -> Result<Self, MigrateError> {
        let malformed = |reason: &str| MigrateError::MalformedName {
            entry: stem.to_string(),
            reason: reason.to_string(),
        };

        let (index, rest) = stem
            .split_once('-')
            .ok_or_else(|| malformed("expected <index>-<date>-<name>"))?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("index must be a zero-padded number"));
        }

        let bytes = rest.as_bytes();
        if bytes.len() < DATE_LEN + 2 || bytes[DATE_LEN] != b'-' {
            return Err(malformed("expected a YYYY-MM-DD date after the index"));
        }
        let date = &rest[..DATE_LEN];
        if !is_date_shaped(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(malformed("invalid date, expected YYYY-MM-DD"));
        }

        let name = &rest[DATE_LEN + 1..];
        if name.contains(['.', '/', '\\']) {
            return Err(malformed("name must not contain '.' or path separators"));
        }

        Ok(MigrationKey(stem.to_string()))
    }

    /// Extract the key from an entry name of the form `<key>.migration.<ext>`.
    ///
    /// Returns `None` when the name does not carry the migration suffix at all,
    /// and an error when it does but the stem breaks the grammar.
    pub fn from_entry_name(name: &str) -> Option<Result<Self, MigrateError>> {
        let (stem, _ext) = split_entry_name(name)?;
        Some(Self::parse(stem).map_err(|err| match err {
            MigrateError::MalformedName { reason, .. } => MigrateError::MalformedName {
                entry: name.to_string(),
                reason,
            },
            other => other,
        }))
    }

    /// Build the key for a new migration.
    pub fn compose(
        index: usize,
        width: usize,
        date: NaiveDate,
        name: &str,
    ) -> Result<Self, MigrateError> {
        let stem = format!("{index:0width$}-{}-{name}", date.format("%Y-%m-%d"));
        Self::parse(&stem)
    }

    /// Entry name for this key with the given extension.
    pub fn entry_name(&self, extension: &str) -> String {
        format!("{}{MIGRATION_INFIX}{extension}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn index(&self) -> &str {
        self.0.split_once('-').map(|(index, _)| index).unwrap_or_default()
    }

    pub fn date(&self) -> &str {
        let start = self.index().len() + 1;
        &self.0[start..start + DATE_LEN]
    }

    pub fn name(&self) -> &str {
        &self.0[self.index().len() + DATE_LEN + 2..]
    }
}

/// Split `<stem>.migration.<ext>` into `(stem, ext)`.
pub fn split_entry_name(name: &str) -> Option<(&str, &str)> {
    let pos = name.rfind(MIGRATION_INFIX)?;
    let stem = &name[..pos];
    let ext = &name[pos + MIGRATION_INFIX.len()..];
    if stem.is_empty() || ext.is_empty() || ext.contains('.') {
        return None;
    }
    Some((stem, ext))
}

fn is_date_shaped(date: &str) -> bool {
    date.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    })
}

impl std::fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for MigrationKey {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
