//! Database connection handling
//!
//! This module provides the [`Connection`] seam the synchronizer executes
//! statements through, and its sqlx backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    mysql::MySqlPoolOptions, postgres::PgPoolOptions, sqlite::SqlitePoolOptions, MySql, Pool,
    Postgres, Row, Sqlite,
};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Executes SQL against a live database
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute one statement and return the number of affected rows
    async fn exec(&self, sql: &str) -> Result<u64>;

    /// First column of the first row, if any row matched
    async fn fetch_one(&self, sql: &str, params: &[&str]) -> Result<Option<String>>;
}

/// Enumeration of supported database types
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(10);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        match config.driver.to_lowercase().as_str() {
            "postgres" | "postgresql" => {
                let pool = PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            "mysql" | "mariadb" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::MySql(pool))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::Sqlite(pool))
            }
            _ => Err(Error::DatabaseError(format!(
                "Unsupported database driver: {}",
                config.driver
            ))),
        }
    }

    /// Driver name of the underlying pool
    pub fn driver(&self) -> &'static str {
        match self {
            DatabaseConnection::Postgres(_) => "postgres",
            DatabaseConnection::MySql(_) => "mysql",
            DatabaseConnection::Sqlite(_) => "sqlite",
        }
    }
}

#[async_trait]
impl Connection for DatabaseConnection {
    async fn exec(&self, sql: &str) -> Result<u64> {
        let affected = match self {
            DatabaseConnection::Postgres(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            DatabaseConnection::MySql(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            DatabaseConnection::Sqlite(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
        };
        Ok(affected)
    }

    async fn fetch_one(&self, sql: &str, params: &[&str]) -> Result<Option<String>> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(param.to_string());
                }
                let row = query.fetch_optional(pool).await?;
                Ok(row.map(|row| row.try_get::<String, _>(0)).transpose()?)
            }
            DatabaseConnection::MySql(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(param.to_string());
                }
                let row = query.fetch_optional(pool).await?;
                Ok(row.map(|row| row.try_get::<String, _>(0)).transpose()?)
            }
            DatabaseConnection::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(param.to_string());
                }
                let row = query.fetch_optional(pool).await?;
                Ok(row.map(|row| row.try_get::<String, _>(0)).transpose()?)
            }
        }
    }
}
