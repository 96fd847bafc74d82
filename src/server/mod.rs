pub mod app;
pub mod error;
pub mod handlers;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::config::AppConfig;
use crate::database::{connection::*, migrations::Migrator};
use crate::services::ImportService;
use crate::store::open_store;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(config: &AppConfig, seed: bool) -> Result<()> {
    let store = open_store(&config.store).await?;

    if seed {
        ImportService::new(store.clone()).seed_if_empty().await?;
    }

    let app = app::create_app(store, config.query, config.server.cors_origin.as_deref()).await?;

    log_routes();

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  GET  /health                 - Health check with record counts");
    info!("  GET  /api/drugs              - List drugs (company, page, limit, sortBy, sortOrder)");
    info!("  GET  /api/drugs/:id          - Fetch one drug");
    info!("  POST /api/drugs              - Create a drug");
    info!("  GET  /api/companies          - Distinct company names");
    info!("  GET  /api/companies/stats    - Per-company statistics");
    info!("  GET  /api/config             - Table configuration");
    info!("  GET  /api-docs/openapi.json  - OpenAPI document");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
