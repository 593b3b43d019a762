use colored::Colorize;
use strata_core::StrataSettings;
use strata_migrate::{ExecutionResult, MigrationKey, MigrationOutcome, MigrationTarget};

/// What `strata migrate` should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateAction {
    Latest,
    Up,
    Down,
    To(String),
    Reset,
}

/// Run `action` against the configured database and return the raw result.
///
/// Configuration and connection problems are returned as `Err`; anything
/// that happens once the migrator is running is reported in the result.
pub async fn execute(
    settings: &StrataSettings,
    action: &MigrateAction,
) -> Result<ExecutionResult, Box<dyn std::error::Error>> {
    let migrator = super::open_migrator(settings).await?;
    let result = match action {
        MigrateAction::Latest => migrator.migrate_to_latest().await,
        MigrateAction::Up => migrator.migrate_up().await,
        MigrateAction::Down => migrator.migrate_down().await,
        MigrateAction::To(key) => {
            let key: MigrationKey = key.parse()?;
            migrator.migrate_to(MigrationTarget::Key(key)).await
        }
        MigrateAction::Reset => migrator.migrate_to(MigrationTarget::None).await,
    };
    Ok(result)
}

/// `strata migrate`: print every outcome, then fail if the run was aborted.
pub async fn run(
    settings: &StrataSettings,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = execute(settings, &action).await?;

    for outcome in &result.results {
        print_outcome(outcome);
    }

    match result.error {
        Some(err) => Err(err.into()),
        None => {
            if result.results.is_empty() {
                println!("{} Nothing to do", "✓".green());
            } else {
                println!(
                    "{} {} migration(s) run",
                    "✓".green(),
                    result.results.len().to_string().cyan()
                );
            }
            Ok(())
        }
    }
}

fn print_outcome(outcome: &MigrationOutcome) {
    let direction = format!("{:<4}", outcome.direction.to_string());
    if outcome.is_success() {
        println!("  {} {} {}", "✓".green(), direction.dimmed(), outcome.key);
    } else {
        println!("  {} {} {}", "✗".red(), direction.dimmed(), outcome.key.to_string().red());
    }
}
