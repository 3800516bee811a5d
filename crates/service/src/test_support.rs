#![cfg(test)]
use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

/// Fresh migrated in-memory database; every call gets its own.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = models::db::init(&DatabaseConfig::in_memory()).await?;
    Ok(db)
}
