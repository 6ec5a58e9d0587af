use std::time::Duration;

use migrations::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::InventoryError;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Connection pool settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            url: config.database_url.clone(),
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            connect_timeout: Duration::from_secs(config.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database.
pub async fn establish_connection(config: &AppConfig) -> Result<DbPool, InventoryError> {
    let db_config = DbConfig::from_app_config(config);
    debug!("Configuring database connection with: {:?}", db_config);

    let mut opt = ConnectOptions::new(db_config.url.clone());
    opt.max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .connect_timeout(db_config.connect_timeout)
        .acquire_timeout(db_config.acquire_timeout)
        .idle_timeout(db_config.idle_timeout)
        .sqlx_logging(true);

    info!(
        max_connections = db_config.max_connections,
        "Connecting to database"
    );
    let pool = Database::connect(opt).await?;

    if config.auto_migrate {
        run_migrations(&pool).await?;
    }
    Ok(pool)
}

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), InventoryError> {
    info!("Running database migrations");
    Migrator::up(pool, None).await?;
    Ok(())
}
