use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use drugtable::client::browse::run_browse;
use drugtable::config::{default_database, AppConfig, StoreConfig};
use drugtable::server::{self, MigrateDirection};
use drugtable::services::{import_service, ImportService};
use drugtable::store::open_store;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// YAML configuration file; built-in defaults are used when omitted
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Sqlite,
    Memory,
}

#[derive(clap::Args, Debug)]
struct StoreArgs {
    /// Store backend, overriding the configuration file
    #[clap(long, value_enum)]
    backend: Option<Backend>,
    /// SQLite database file
    #[clap(short, long)]
    database: Option<String>,
    /// JSON file backing the memory store
    #[clap(long)]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(flatten)]
        store: StoreArgs,
        #[clap(long)]
        cors_origin: Option<String>,
        /// Load the bundled sample drugs when the store is empty
        #[clap(long)]
        seed: bool,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Replace the stored drugs with a CSV file or the bundled sample
    Import {
        #[clap(short, long)]
        file: Option<PathBuf>,
        #[clap(flatten)]
        store: StoreArgs,
    },
    /// Show the drug table from a running server
    Browse {
        #[clap(short, long)]
        url: Option<String>,
        #[clap(long)]
        company: Option<String>,
        #[clap(long)]
        page: Option<u64>,
        #[clap(short, long)]
        interactive: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = "drugs.db")]
        database: String,
    },
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
        #[clap(short, long, default_value = "drugs.db")]
        database: String,
    },
}

fn apply_store_args(config: &mut AppConfig, args: StoreArgs) {
    let (backend, database, data_file) = match &config.store {
        StoreConfig::Sqlite { database } => (Backend::Sqlite, Some(database.clone()), None),
        StoreConfig::Memory { data_file } => (Backend::Memory, None, data_file.clone()),
    };

    config.store = match args.backend.unwrap_or(backend) {
        Backend::Sqlite => StoreConfig::Sqlite {
            database: args
                .database
                .or(database)
                .unwrap_or_else(default_database),
        },
        Backend::Memory => StoreConfig::Memory {
            data_file: args.data_file.or(data_file),
        },
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let mut config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve {
            port,
            store,
            cors_origin,
            seed,
        } => {
            apply_store_args(&mut config, store);
            if let Some(port) = port {
                config.server.port = port;
            }
            if cors_origin.is_some() {
                config.server.cors_origin = cors_origin;
            }
            info!("Starting server on port {}", config.server.port);
            server::start_server(&config, seed).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initializing database: {}", database);
                server::migrate_database(&database, MigrateDirection::Up).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                info!("Running database migration: {:?}", direction);
                server::migrate_database(&database, direction).await?;
            }
        },
        Commands::Import { file, store } => {
            apply_store_args(&mut config, store);
            let drugs = match &file {
                Some(path) => {
                    info!("Importing drugs from {}", path.display());
                    let reader = std::fs::File::open(path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    import_service::read_csv(reader)?
                }
                None => {
                    info!("Importing bundled sample drugs");
                    import_service::sample_drugs()?
                }
            };
            let store = open_store(&config.store).await?;
            let summary = ImportService::new(store).import(drugs).await?;
            println!(
                "Removed {} existing, inserted {}, skipped {}",
                summary.removed, summary.inserted, summary.skipped
            );
        }
        Commands::Browse {
            url,
            company,
            page,
            interactive,
        } => {
            if let Some(url) = url {
                config.client.base_url = url;
            }
            run_browse(&config.client, company, page, interactive).await?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "sqlx=warn,sea_orm_migration=warn,{}",
            log_level
        )))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
