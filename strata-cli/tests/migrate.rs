use std::fs;
use std::path::Path;
use strata_cli::commands::migrate::{self, MigrateAction};
use strata_cli::commands::{new_migration, status};
use strata_core::{ConfigError, StrataSettings};
use strata_migrate::{Direction, ErrorKind, MigrateError};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Three migrations in `<tmp>/migrations` and a database file next to them.
fn project(tmp: &TempDir) -> StrataSettings {
    let dir = tmp.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    write(
        &dir,
        "000-2024-01-01-init.migration.sql",
        "-- migrate:up\nCREATE TABLE users (id INTEGER PRIMARY KEY);\n-- migrate:down\nDROP TABLE users;\n",
    );
    write(
        &dir,
        "001-2024-01-02-posts.migration.sql",
        "-- migrate:up\nCREATE TABLE posts (id INTEGER PRIMARY KEY);\n-- migrate:down\nDROP TABLE posts;\n",
    );
    write(
        &dir,
        "002-2024-01-03-tags.migration.sql",
        "-- migrate:up\nCREATE TABLE tags (id INTEGER PRIMARY KEY);\n-- migrate:down\nDROP TABLE tags;\n",
    );

    StrataSettings {
        database_url: Some(format!("sqlite://{}", tmp.path().join("app.db").display())),
        migrations_dir: dir,
        ..StrataSettings::default()
    }
}

fn keys(result: &strata_migrate::ExecutionResult) -> Vec<(String, Direction)> {
    result
        .results
        .iter()
        .map(|o| (o.key.to_string(), o.direction))
        .collect()
}

#[tokio::test]
async fn latest_then_nothing_to_do() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);

    let first = migrate::execute(&settings, &MigrateAction::Latest).await.unwrap();
    assert!(first.is_success());
    assert_eq!(first.results.len(), 3);

    let second = migrate::execute(&settings, &MigrateAction::Latest).await.unwrap();
    assert!(second.is_success());
    assert!(second.results.is_empty());
}

#[tokio::test]
async fn up_down_and_reset() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);

    let up = migrate::execute(&settings, &MigrateAction::Up).await.unwrap();
    assert_eq!(
        keys(&up),
        vec![("000-2024-01-01-init".to_string(), Direction::Up)]
    );

    migrate::execute(&settings, &MigrateAction::Latest).await.unwrap();
    let down = migrate::execute(&settings, &MigrateAction::Down).await.unwrap();
    assert_eq!(
        keys(&down),
        vec![("002-2024-01-03-tags".to_string(), Direction::Down)]
    );

    let reset = migrate::execute(&settings, &MigrateAction::Reset).await.unwrap();
    assert_eq!(
        keys(&reset),
        vec![
            ("001-2024-01-02-posts".to_string(), Direction::Down),
            ("000-2024-01-01-init".to_string(), Direction::Down),
        ]
    );

    let infos = status::collect(&settings).await.unwrap();
    assert!(infos.iter().all(|i| !i.applied));
}

#[tokio::test]
async fn to_key_stops_at_target() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);

    let result = migrate::execute(
        &settings,
        &MigrateAction::To("001-2024-01-02-posts".into()),
    )
    .await
    .unwrap();
    assert_eq!(result.results.len(), 2);

    let infos = status::collect(&settings).await.unwrap();
    let applied: Vec<bool> = infos.iter().map(|i| i.applied).collect();
    assert_eq!(applied, vec![true, true, false]);
    assert!(infos[0].executed_at.is_some());
}

#[tokio::test]
async fn malformed_target_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);

    let err = migrate::execute(&settings, &MigrateAction::To("posts".into()))
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<MigrateError>().is_some());
}

#[tokio::test]
async fn failing_migration_aborts_run() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);
    write(
        &settings.migrations_dir,
        "001-2024-01-02-posts.migration.sql",
        "-- migrate:up\nCREATE TABLE broken (;\n",
    );

    let result = migrate::execute(&settings, &MigrateAction::Latest).await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.results.len(), 2);
    assert!(result.results[0].is_success());
    assert!(!result.results[1].is_success());

    // run() surfaces the abort as an error for the exit code.
    assert!(migrate::run(&settings, MigrateAction::Latest).await.is_err());

    let infos = status::collect(&settings).await.unwrap();
    let applied: Vec<bool> = infos.iter().map(|i| i.applied).collect();
    assert_eq!(applied, vec![true, false, false]);
}

#[tokio::test]
async fn missing_database_url_fails_before_running() {
    let tmp = TempDir::new().unwrap();
    let settings = StrataSettings {
        database_url: None,
        ..project(&tmp)
    };

    let err = migrate::execute(&settings, &MigrateAction::Latest)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotFound(_))
    ));
}

#[tokio::test]
async fn status_json_lists_every_migration() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);
    migrate::execute(&settings, &MigrateAction::Up).await.unwrap();

    let infos = status::collect(&settings).await.unwrap();
    let json = serde_json::to_value(&infos).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[0]["key"], "000-2024-01-01-init");
    assert_eq!(json[0]["applied"], true);
    assert_eq!(json[2]["applied"], false);

    status::run(&settings, true).await.unwrap();
}

#[tokio::test]
async fn scaffolded_file_is_rejected_until_filled_in() {
    let tmp = TempDir::new().unwrap();
    let settings = project(&tmp);
    let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let path = new_migration::scaffold(&settings, "add-users", date).unwrap();

    let err = status::collect(&settings).await.unwrap_err();
    let err = err.downcast_ref::<MigrateError>().unwrap();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(err.to_string().contains("003-2024-02-01-add-users.migration.sql"));

    fs::write(&path, "-- migrate:up\nCREATE TABLE users2 (id INTEGER);\n").unwrap();
    assert_eq!(status::collect(&settings).await.unwrap().len(), 4);
}
