use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

use super::migrations::Migrator;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite:{}?mode=rwc", path),
        None => "sqlite:drugs.db?mode=rwc".to_string(),
    }
}

/// Open the SQLite file at `database_path` (creating parent directories) and bring
/// the schema up to date.
pub async fn connect_and_migrate(database_path: &str) -> Result<DatabaseConnection, DbErr> {
    if database_path != ":memory:" {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbErr::Custom(format!("Failed to create database directory: {}", e))
                })?;
            }
        }
    }

    let db = establish_connection(&get_database_url(Some(database_path))).await?;
    setup_database(&db).await?;
    Ok(db)
}

pub async fn setup_database(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}
