//! CREATE statements for a whole schema

use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;
use crate::schema::database::Schema;
use crate::schema::table::Table;

/// Builds the statements creating every object of a schema: namespaces,
/// then sequences, then tables in dependency order
pub struct CreateSchemaObjectsSqlBuilder<'a> {
    platform: &'a dyn Platform,
}

impl<'a> CreateSchemaObjectsSqlBuilder<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    pub fn build_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut sql = self.namespaces_sql(schema)?;
        sql.extend(self.sequences_sql(schema)?);
        sql.extend(self.tables_sql(schema)?);
        debug!(
            "Built {} create statements for {}",
            sql.len(),
            self.platform.name()
        );
        Ok(sql)
    }

    fn namespaces_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        if !self.platform.supports_schemas() {
            return Ok(Vec::new());
        }
        schema
            .namespaces()
            .filter(|namespace| {
                schema
                    .name()
                    .map(|default| !default.eq_ignore_ascii_case(namespace))
                    .unwrap_or(true)
            })
            .map(|namespace| self.platform.create_namespace_sql(namespace))
            .collect()
    }

    fn sequences_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        if !self.platform.supports_sequences() {
            return Ok(Vec::new());
        }
        schema
            .sequences()
            .map(|sequence| self.platform.create_sequence_sql(sequence))
            .collect()
    }

    fn tables_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        let tables: Vec<&Table> = schema.tables().collect();
        self.platform.create_tables_sql(&tables)
    }
}
