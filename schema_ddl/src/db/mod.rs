//! Database module for schema_ddl
//!
//! This module handles database connections and applying schemas to them.

pub mod connection;
pub mod metadata;
pub mod synchronizer;

// Re-export key types
pub use connection::{Connection, DatabaseConnection};
pub use metadata::load_mysql_metadata;
pub use synchronizer::{SchemaProvider, SchemaSynchronizer, SnapshotProvider};
