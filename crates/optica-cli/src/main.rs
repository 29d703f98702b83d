mod db;
mod lens;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use optica_core::AppConfig;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "optica-cli")]
#[command(about = "Contact-lens catalog administration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Contact-lens catalog
    Lens {
        #[command(subcommand)]
        command: LensCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum LensCommands {
    /// Validate a lens payload and show the variants it would generate,
    /// without touching the database
    Preview {
        /// Path to a JSON lens payload
        file: PathBuf,
    },
    /// List stored contact lenses, most recently updated first
    List {
        /// Only lenses with at least one stocked variant
        #[arg(long)]
        available_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("optica-cli: run with --help for available commands");
        return Ok(());
    };

    match command {
        Commands::Lens {
            command: LensCommands::Preview { file },
        } => {
            init_tracing("info")?;
            lens::run_lens_preview(&file)
        }
        Commands::Lens {
            command: LensCommands::List { available_only },
        } => {
            let (config, pool) = connect().await?;
            lens::run_lens_list(pool, &config, available_only).await
        }
        Commands::Db { command } => {
            let (_, pool) = connect().await?;
            match command {
                DbCommands::Ping => db::run_db_ping(&pool).await,
                DbCommands::Migrate => db::run_db_migrate(&pool).await,
            }
        }
    }
}

async fn connect() -> anyhow::Result<(AppConfig, PgPool)> {
    let config = optica_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    let pool_config = optica_db::PoolConfig::from_app_config(&config);
    let pool = optica_db::connect_pool(&config.database_url, pool_config).await?;
    Ok((config, pool))
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
