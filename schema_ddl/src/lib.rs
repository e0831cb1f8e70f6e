//! schema_ddl: a database-agnostic schema model with diffing and
//! dialect-specific DDL generation
//!
//! Build or load a [`Schema`], compare it against another one with the
//! [`Comparator`] and render the resulting [`SchemaDiff`] for MySQL, MariaDB,
//! PostgreSQL or SQLite through a [`Platform`]. The [`SchemaSynchronizer`]
//! executes the statements against a live database.

pub mod builder;
pub mod comparator;
pub mod config;
pub mod db;
pub mod error;
pub mod platform;
pub mod schema;
pub mod utils;

use std::sync::Arc;

// Re-export main types for easier access
pub use builder::{CreateSchemaObjectsSqlBuilder, DependencyOrderCalculator, DropSchemaObjectsSqlBuilder};
pub use comparator::{Comparator, ComparatorConfig, TableNormalizer};
pub use config::Config;
pub use db::{Connection, DatabaseConnection, SchemaProvider, SchemaSynchronizer};
pub use error::{Error, InvalidColumnType, Result, SchemaError};
pub use platform::{platform_for, Platform};
pub use schema::{Column, Index, Schema, SchemaDiff, Table, TableDiff, Type};

/// Load the configuration file, initialize logging and connect a
/// synchronizer to the configured database
pub async fn init(config_path: &str) -> Result<SchemaSynchronizer> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;

    let connection = DatabaseConnection::connect(&config.database).await?;
    tracing::info!(driver = connection.driver(), "Connected to database");

    let live_charsets = matches!(connection, DatabaseConnection::MySql(_)) && config.is_mysql_family()?;
    let synchronizer = SchemaSynchronizer::new(Arc::new(connection), config.platform()?)
        .with_comparator(config.comparator()?)
        .with_dry_run(config.synchronizer.dry_run);
    Ok(if live_charsets {
        synchronizer.with_live_charset_metadata(config.platform.default_table_options.clone())
    } else {
        synchronizer
    })
}
