use std::time::Duration;

use configs::DatabaseConfig;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::errors::StoreError;

/// Open a connection pool using the pool bounds and timeouts from `cfg`.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> Result<DatabaseConnection, StoreError> {
    let mut opt = ConnectOptions::new(cfg.url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    // an in-memory database lives only as long as its connection
    if !cfg.is_in_memory() {
        opt.idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs));
    }
    let db = Database::connect(opt).await?;
    Ok(db)
}

/// Connect and bring the schema up to date. Safe to call on an existing database.
pub async fn init(cfg: &DatabaseConfig) -> Result<DatabaseConnection, StoreError> {
    let db = connect_with_config(cfg).await?;
    migrate(&db).await?;
    info!(url = %cfg.url, "database ready");
    Ok(db)
}

pub async fn migrate(db: &DatabaseConnection) -> Result<(), StoreError> {
    migration::Migrator::up(db, None).await?;
    Ok(())
}

pub async fn close(db: DatabaseConnection) -> Result<(), StoreError> {
    db.close().await?;
    Ok(())
}
