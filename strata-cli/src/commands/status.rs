use colored::Colorize;
use strata_core::StrataSettings;
use strata_migrate::MigrationInfo;

/// Every resolved migration with its applied state, key-ordered.
pub async fn collect(
    settings: &StrataSettings,
) -> Result<Vec<MigrationInfo>, Box<dyn std::error::Error>> {
    let migrator = super::open_migrator(settings).await?;
    Ok(migrator.migrations().await?)
}

/// `strata status`: print a table, or JSON with `--json`.
pub async fn run(settings: &StrataSettings, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let infos = collect(settings).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        println!(
            "No migrations found in {}",
            settings.migrations_dir.display().to_string().cyan()
        );
        return Ok(());
    }

    for info in &infos {
        if info.applied {
            let when = info
                .executed_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("  {} {}  {}", "applied".green(), info.key, when.dimmed());
        } else {
            println!("  {} {}", "pending".yellow(), info.key);
        }
    }

    let pending = infos.iter().filter(|i| !i.applied).count();
    println!();
    println!(
        "{} applied, {} pending",
        (infos.len() - pending).to_string().green(),
        pending.to_string().yellow()
    );
    Ok(())
}
