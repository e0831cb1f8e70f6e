//! Applying schemas to a live database

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::builder::{CreateSchemaObjectsSqlBuilder, DropSchemaObjectsSqlBuilder};
use crate::comparator::{Comparator, DefaultTableOptions, MySqlNormalizer};
use crate::db::connection::Connection;
use crate::db::metadata::load_mysql_metadata;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::schema::database::Schema;
use crate::schema::sequence::Sequence;
use crate::schema::table::Table;

/// Source of the schema currently deployed on the target database
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn introspect(&self) -> Result<Schema>;
}

/// Provider answering with a fixed snapshot, e.g. the last applied schema
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    schema: Schema,
}

impl SnapshotProvider {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl SchemaProvider for SnapshotProvider {
    async fn introspect(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }
}

/// Generates and executes create, update and drop statements against one
/// database
pub struct SchemaSynchronizer {
    connection: Arc<dyn Connection>,
    platform: Box<dyn Platform>,
    comparator: Comparator,
    provider: Option<Box<dyn SchemaProvider>>,
    live_charsets: Option<DefaultTableOptions>,
    dry_run: bool,
}

impl SchemaSynchronizer {
    pub fn new(connection: Arc<dyn Connection>, platform: Box<dyn Platform>) -> Self {
        Self {
            connection,
            platform,
            comparator: Comparator::default(),
            provider: None,
            live_charsets: None,
            dry_run: false,
        }
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn SchemaProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve MySQL charsets and collations on the server before each
    /// update, normalizing tables against `defaults`
    pub fn with_live_charset_metadata(mut self, defaults: DefaultTableOptions) -> Self {
        self.live_charsets = Some(defaults);
        self
    }

    /// Log statements instead of executing them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    async fn current_schema(&self) -> Result<Schema> {
        match &self.provider {
            Some(provider) => provider.introspect().await,
            None => Err(Error::ConfigError(
                "no schema provider configured for the synchronizer".to_string(),
            )),
        }
    }

    pub fn get_create_schema(&self, schema: &Schema) -> Result<Vec<String>> {
        CreateSchemaObjectsSqlBuilder::new(self.platform()).build_sql(schema)
    }

    pub async fn create_schema(&self, schema: &Schema) -> Result<()> {
        let sql = self.get_create_schema(schema)?;
        self.process_sql(&sql).await
    }

    /// Statements turning the deployed schema into `to`; with `no_drops`
    /// nothing is removed
    pub async fn get_update_schema(&self, to: &Schema, no_drops: bool) -> Result<Vec<String>> {
        let current = self.current_schema().await?;
        let live;
        let comparator = match &self.live_charsets {
            Some(defaults) => {
                let metadata = load_mysql_metadata(self.connection.as_ref(), &[&current, to]).await?;
                live = Comparator::new(self.comparator.config().clone())
                    .with_normalizer(Box::new(MySqlNormalizer::with_static(defaults.clone(), metadata)));
                &live
            }
            None => &self.comparator,
        };
        let diff = comparator.compare_schemas(&current, to);
        if no_drops {
            diff.to_save_sql(self.platform())
        } else {
            diff.to_sql(self.platform())
        }
    }

    pub async fn update_schema(&self, to: &Schema, no_drops: bool) -> Result<()> {
        let sql = self.get_update_schema(to, no_drops).await?;
        self.process_sql(&sql).await
    }

    /// Statements dropping the objects of `schema` that are actually deployed.
    ///
    /// Sequences backing a single column primary key (`<table>_<column>_seq`)
    /// are dropped along with their table.
    pub async fn get_drop_schema(&self, schema: &Schema) -> Result<Vec<String>> {
        let current = self.current_schema().await?;
        let tables: Vec<&Table> = current
            .tables()
            .filter(|table| schema.has_table(&table.full_name()))
            .collect();

        let builder = DropSchemaObjectsSqlBuilder::new(self.platform());
        let mut sql = builder.tables_sql(&tables)?;

        if !self.platform.supports_sequences() {
            return Ok(sql);
        }

        let mut sequences: Vec<&Sequence> = schema.sequences().collect();
        for table in schema.tables() {
            let columns = table.primary_key_columns();
            let [column] = columns.as_slice() else {
                continue;
            };
            let implied = format!("{}_{}_seq", table.full_name(), column);
            if let Ok(sequence) = current.sequence(&implied) {
                sequences.push(sequence);
            }
        }
        for sequence in sequences {
            sql.push(self.platform.drop_sequence_sql(sequence)?);
        }
        Ok(sql)
    }

    /// Drop the objects of `schema`, ignoring statements that fail
    pub async fn drop_schema(&self, schema: &Schema) -> Result<()> {
        let sql = self.get_drop_schema(schema).await?;
        self.process_sql_safely(&sql).await;
        Ok(())
    }

    /// Statements dropping everything that is deployed
    pub async fn get_drop_all_schema(&self) -> Result<Vec<String>> {
        let current = self.current_schema().await?;
        DropSchemaObjectsSqlBuilder::new(self.platform()).build_sql(&current)
    }

    pub async fn drop_all_schema(&self) -> Result<()> {
        let sql = self.get_drop_all_schema().await?;
        self.process_sql(&sql).await
    }

    /// Execute statements in order, stopping at the first failure
    pub async fn process_sql(&self, statements: &[String]) -> Result<()> {
        for (position, sql) in statements.iter().enumerate() {
            if self.dry_run {
                info!(statement = position + 1, sql = sql.as_str(), "SQL (dry run)");
                continue;
            }
            self.connection.exec(sql).await?;
            info!(statement = position + 1, sql = sql.as_str(), "Executed SQL");
        }
        Ok(())
    }

    /// Execute statements in order, logging and skipping failures
    pub async fn process_sql_safely(&self, statements: &[String]) {
        for (position, sql) in statements.iter().enumerate() {
            if self.dry_run {
                info!(statement = position + 1, sql = sql.as_str(), "SQL (dry run)");
                continue;
            }
            match self.connection.exec(sql).await {
                Ok(_) => info!(statement = position + 1, sql = sql.as_str(), "Executed SQL"),
                Err(error) => warn!(sql = sql.as_str(), %error, "Ignoring failed statement"),
            }
        }
    }
}
