use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Connect and bring the key-value schema up to date
pub async fn connect_and_migrate(config: &Config) -> AppResult<DatabaseConnection> {
    let db = connect(config).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations complete");
    Ok(db)
}
