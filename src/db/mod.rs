use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DatabasePool {
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let database_url = &config.url;

        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;

            Ok(DatabasePool::Postgres(pool))
        } else if database_url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

            // An in-memory database lives only as long as its connection.
            let pool = if database_url.contains(":memory:") {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?
            } else {
                SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await?
            };

            Ok(DatabasePool::Sqlite(pool))
        } else {
            Err(AppError::ConfigError(config::ConfigError::Message(
                "Invalid database URL. Must start with postgres:// or sqlite:".to_string(),
            )))
        }
    }

    pub async fn migrate(&self, migrations_dir: &str) -> AppResult<()> {
        let root = Path::new(migrations_dir);
        match self {
            DatabasePool::Postgres(pool) => {
                Migrator::new(root.join("postgres")).await?.run(pool).await?;
            }
            DatabasePool::Sqlite(pool) => {
                Migrator::new(root.join("sqlite")).await?.run(pool).await?;
            }
        }
        Ok(())
    }
}

/// Fresh, migrated in-memory SQLite database.
#[cfg(test)]
pub async fn test_pool() -> DatabasePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        migrations_dir: "./migrations".to_string(),
    };
    let pool = DatabasePool::new(&config).await.unwrap();
    pool.migrate(&config.migrations_dir).await.unwrap();
    pool
}
