use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use strata_migrate::{
    async_trait, BoxError, DirectorySource, DynMigration, EmbeddedSource, ErrorKind,
    MigrateError, Migration, MigrationKey, MigrationProvider, MigrationSet, SourceEntry,
    SourceProvider, UnitLoader,
};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

struct Script {
    body: String,
}

#[async_trait]
impl Migration<Journal> for Script {
    async fn up(&self, journal: &Journal) -> Result<(), BoxError> {
        journal.0.lock().unwrap().push(self.body.clone());
        Ok(())
    }
}

struct ScriptLoader;

impl UnitLoader<Journal> for ScriptLoader {
    fn load(&self, _entry: &str, content: &str) -> Result<DynMigration<Journal>, BoxError> {
        if content.trim() == "broken" {
            return Err("unparseable script".into());
        }
        Ok(Arc::new(Script {
            body: content.trim().to_string(),
        }))
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn provider(dir: &Path) -> SourceProvider<DirectorySource<Journal>> {
    SourceProvider::new(DirectorySource::new(dir, ScriptLoader))
}

async fn resolve(
    provider: &SourceProvider<DirectorySource<Journal>>,
) -> Result<MigrationSet<Journal>, MigrateError> {
    provider.get_migrations().await
}

fn key_names(set: &MigrationSet<Journal>) -> Vec<String> {
    set.keys().map(|k| k.to_string()).collect()
}

// ── Directory source ────────────────────────────────────────────────

#[tokio::test]
async fn resolves_matching_files_in_key_order() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "002-2024-03-01-c.migration.sql", "c");
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "001-2024-02-01-b.migration.sql", "b");

    let set = resolve(&provider(tmp.path())).await.unwrap();

    assert_eq!(
        key_names(&set),
        vec![
            "000-2024-01-01-a",
            "001-2024-02-01-b",
            "002-2024-03-01-c"
        ]
    );
}

#[tokio::test]
async fn ignores_entries_outside_the_naming_convention() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "README.md", "docs");
    write(tmp.path(), "template.sql", "-- template");
    fs::create_dir(tmp.path().join("001-2024-01-02-dir.migration.sql")).unwrap();

    let set = resolve(&provider(tmp.path())).await.unwrap();

    assert_eq!(key_names(&set), vec!["000-2024-01-01-a"]);
}

#[tokio::test]
async fn loaded_units_carry_file_content() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "create a\n");

    let set = resolve(&provider(tmp.path())).await.unwrap();
    let journal = Journal::default();
    let key = MigrationKey::parse("000-2024-01-01-a").unwrap();
    set.get(&key).unwrap().up(&journal).await.unwrap();

    assert_eq!(*journal.0.lock().unwrap(), vec!["create a".to_string()]);
}

#[tokio::test]
async fn extension_filter_narrows_entries() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "001-2024-01-02-b.migration.ts", "b");

    let set = resolve(&provider(tmp.path()).with_extension("sql"))
        .await
        .unwrap();

    assert_eq!(key_names(&set), vec!["000-2024-01-01-a"]);
}

#[tokio::test]
async fn custom_filter_replaces_default() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "001-2024-01-02-skip.migration.sql", "b");

    let provider = provider(tmp.path())
        .with_filter(|entry: &SourceEntry| entry.is_file && !entry.name.contains("skip"));
    let set = resolve(&provider).await.unwrap();

    assert_eq!(key_names(&set), vec!["000-2024-01-01-a"]);
}

#[tokio::test]
async fn resolving_twice_yields_identical_sets() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "001-2024-01-02-b.migration.sql", "b");

    let provider = provider(tmp.path());
    let first = resolve(&provider).await.unwrap();
    let second = resolve(&provider).await.unwrap();

    assert_eq!(key_names(&first), key_names(&second));
}

#[tokio::test]
async fn new_files_are_picked_up_on_next_resolution() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    let provider = provider(tmp.path());
    assert_eq!(resolve(&provider).await.unwrap().len(), 1);

    write(tmp.path(), "001-2024-01-02-b.migration.sql", "b");
    assert_eq!(resolve(&provider).await.unwrap().len(), 2);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_directory_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = resolve(&provider(&tmp.path().join("nope")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(matches!(err, MigrateError::Io { .. }));
}

#[tokio::test]
async fn duplicate_keys_are_rejected() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    write(tmp.path(), "000-2024-01-01-a.migration.ts", "a again");

    let err = resolve(&provider(tmp.path())).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(matches!(err, MigrateError::DuplicateKey(ref k) if k.as_str() == "000-2024-01-01-a"));
}

#[tokio::test]
async fn malformed_name_is_a_resolution_error() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "add-users.migration.sql", "a");

    let err = resolve(&provider(tmp.path())).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(err.to_string().contains("add-users.migration.sql"));
}

#[tokio::test]
async fn unloadable_content_is_a_load_error() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "broken");

    let err = resolve(&provider(tmp.path())).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(matches!(err, MigrateError::Load { ref entry, .. } if entry == "000-2024-01-01-a.migration.sql"));
}

#[tokio::test]
async fn non_utf8_content_is_a_load_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("000-2024-01-01-a.migration.sql"),
        [0xff, 0xfe, 0x00],
    )
    .unwrap();

    let err = resolve(&provider(tmp.path())).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(matches!(err, MigrateError::Load { ref entry, .. } if entry == "000-2024-01-01-a.migration.sql"));
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_symlink_is_skipped() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "000-2024-01-01-a.migration.sql", "a");
    std::os::unix::fs::symlink("/nonexistent/target", tmp.path().join(".#lockfile.sql")).unwrap();

    let set = resolve(&provider(tmp.path())).await.unwrap();

    assert_eq!(key_names(&set), vec!["000-2024-01-01-a"]);
}

// ── Embedded source ─────────────────────────────────────────────────

fn script(body: &str) -> DynMigration<Journal> {
    Arc::new(Script {
        body: body.to_string(),
    })
}

#[tokio::test]
async fn embedded_source_resolves_like_a_directory() {
    let source = EmbeddedSource::new()
        .with("001-2024-01-02-b.migration.rs", script("b"))
        .with("000-2024-01-01-a.migration.rs", script("a"));

    let set: MigrationSet<Journal> =
        SourceProvider::new(source).get_migrations().await.unwrap();

    assert_eq!(key_names(&set), vec!["000-2024-01-01-a", "001-2024-01-02-b"]);
}

#[tokio::test]
async fn embedded_duplicates_are_rejected() {
    let source = EmbeddedSource::new()
        .with("000-2024-01-01-a.migration.rs", script("a"))
        .with("000-2024-01-01-a.migration.rs", script("a"));

    let result: Result<MigrationSet<Journal>, _> =
        SourceProvider::new(source).get_migrations().await;
    let err = result.unwrap_err();

    assert!(matches!(err, MigrateError::DuplicateKey(_)));
}
