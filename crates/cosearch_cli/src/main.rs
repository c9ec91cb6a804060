//! Server entry point for the contribution catalog.
//!
//! # Responsibility
//! - Load `.env`, build `Settings` once, and initialize logging.
//! - Dispatch `serve` (default), `migrate`, `seed` and `ping`.

use clap::{Parser, Subcommand};
use cosearch_api::AppState;
use cosearch_core::db::migrations::current_user_version;
use cosearch_core::db::open_db;
use cosearch_core::seed::init_data;
use cosearch_core::{default_log_level, init_logging, Notifier, Settings};
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cosearch", version, about = "Contribution catalog server")]
struct Cli {
    /// SQLite database file (overrides COSEARCH_DB_PATH)
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the store and serve the HTTP API
    Serve {
        /// Listen address (overrides COSEARCH_BIND_ADDR)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Apply pending schema migrations and exit
    Migrate,
    /// Insert the initial contributors and tags
    Seed,
    /// Print core linkage information
    Ping,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("event=cli_exit module=cli status=error error={}", err);
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(Commands::Ping) = cli.command {
        println!("cosearch_core ping={}", cosearch_core::ping());
        println!("cosearch_core version={}", cosearch_core::core_version());
        return Ok(());
    }

    dotenvy::dotenv().ok();
    let mut settings = Settings::from_env().map_err(|err| err.to_string())?;
    if let Some(db_path) = cli.db_path {
        settings.db_path = db_path;
    }

    let level = settings
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, settings.log_dir.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind_addr = bind;
            }
            serve(settings)
        }
        Commands::Migrate => migrate(&settings),
        Commands::Seed => seed(&settings),
        Commands::Ping => Ok(()),
    }
}

fn migrate(settings: &Settings) -> Result<(), String> {
    let conn = open_db(&settings.db_path).map_err(|err| err.to_string())?;
    let version = current_user_version(&conn).map_err(|err| err.to_string())?;
    info!(
        "event=migrate module=cli status=ok db_path={} schema_version={}",
        settings.db_path.display(),
        version
    );
    println!("schema version {version}");
    Ok(())
}

fn seed(settings: &Settings) -> Result<(), String> {
    let conn = open_db(&settings.db_path).map_err(|err| err.to_string())?;
    let report = init_data(&conn).map_err(|err| err.to_string())?;
    println!(
        "seeded {} contributors and {} tags",
        report.contributors, report.tags
    );
    Ok(())
}

fn serve(settings: Settings) -> Result<(), String> {
    // Migrate once up front so per-request opens find a current schema.
    drop(open_db(&settings.db_path).map_err(|err| err.to_string())?);
    let notifier = Notifier::from_settings(&settings).map_err(|err| err.to_string())?;
    let state = AppState::new(settings, notifier);

    let runtime = tokio::runtime::Runtime::new().map_err(|err| err.to_string())?;
    runtime
        .block_on(cosearch_api::serve(state))
        .map_err(|err| format!("server stopped: {err}"))
}
