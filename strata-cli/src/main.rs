use clap::{Parser, Subcommand};
use strata_cli::commands::{migrate, new_migration, status};
use strata_core::{StrataConfig, StrataSettings};

#[derive(Parser)]
#[command(name = "strata", version, about = "Strata: file-based database migrations")]
struct Cli {
    /// Configuration profile (overridden by STRATA_PROFILE)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply or revert migrations
    Migrate {
        #[command(subcommand)]
        action: Option<MigrateCommand>,
    },
    /// Scaffold a new migration file
    New {
        /// Migration name (e.g. add-users)
        name: String,
    },
    /// List migrations and whether they are applied
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Apply every pending migration (default)
    Latest,
    /// Apply the next pending migration
    Up,
    /// Revert the most recently applied migration
    Down,
    /// Migrate forward or back until KEY is the last applied migration
    To {
        /// Full migration key (e.g. 002-2024-03-01-add-users)
        key: String,
    },
    /// Revert every applied migration
    Reset,
}

impl From<MigrateCommand> for migrate::MigrateAction {
    fn from(command: MigrateCommand) -> Self {
        match command {
            MigrateCommand::Latest => Self::Latest,
            MigrateCommand::Up => Self::Up,
            MigrateCommand::Down => Self::Down,
            MigrateCommand::To { key } => Self::To(key),
            MigrateCommand::Reset => Self::Reset,
        }
    }
}

#[tokio::main]
async fn main() {
    strata_core::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", colored::Colorize::red(format!("Error: {e}").as_str()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings: StrataSettings = StrataConfig::load(cli.profile.as_deref())?.settings()?;

    match cli.command {
        Commands::Migrate { action } => {
            let action = action.map_or(migrate::MigrateAction::Latest, Into::into);
            migrate::run(&settings, action).await
        }
        Commands::New { name } => new_migration::run(&settings, &name),
        Commands::Status { json } => status::run(&settings, json).await,
    }
}
