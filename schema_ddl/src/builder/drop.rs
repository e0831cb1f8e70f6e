//! DROP statements for a whole schema

use std::collections::HashMap;

use tracing::debug;

use crate::builder::dependency::order_tables;
use crate::error::Result;
use crate::platform::Platform;
use crate::schema::database::Schema;
use crate::schema::table::Table;

/// Builds the statements dropping every object of a schema.
///
/// Tables are dropped dependents first. Foreign keys that would still point
/// at an already dropped table (cycles) are dropped up front.
pub struct DropSchemaObjectsSqlBuilder<'a> {
    platform: &'a dyn Platform,
}

impl<'a> DropSchemaObjectsSqlBuilder<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    pub fn build_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        let tables: Vec<&Table> = schema.tables().collect();
        let mut sql = self.tables_sql(&tables)?;

        if self.platform.supports_sequences() {
            for sequence in schema.sequences() {
                sql.push(self.platform.drop_sequence_sql(sequence)?);
            }
        }

        if self.platform.supports_schemas() {
            for namespace in schema.namespaces() {
                let is_default = schema
                    .name()
                    .map(|default| default.eq_ignore_ascii_case(namespace))
                    .unwrap_or(false);
                if !is_default {
                    sql.push(self.platform.drop_namespace_sql(namespace)?);
                }
            }
        }

        debug!(
            "Built {} drop statements for {}",
            sql.len(),
            self.platform.name()
        );
        Ok(sql)
    }

    /// Statements dropping only the given tables
    pub fn tables_sql(&self, tables: &[&Table]) -> Result<Vec<String>> {
        let mut ordered = order_tables(tables)?;
        ordered.reverse();

        let mut sql = self.foreign_keys_sql(&ordered);
        for table in &ordered {
            sql.push(self.platform.drop_table_sql(table.identifier()));
        }
        Ok(sql)
    }

    /// Foreign keys whose referenced table is dropped before their own table
    fn foreign_keys_sql(&self, drop_order: &[&Table]) -> Vec<String> {
        if !self.platform.supports_foreign_key_alter() {
            return Vec::new();
        }

        let positions: HashMap<String, usize> = drop_order
            .iter()
            .enumerate()
            .map(|(position, table)| (table.full_name().to_lowercase(), position))
            .collect();

        let mut sql = Vec::new();
        for (position, table) in drop_order.iter().enumerate() {
            if !self.platform.table_supports_foreign_keys(table) {
                continue;
            }
            for foreign_key in table.foreign_keys() {
                let target = foreign_key.foreign_table().full_name().to_lowercase();
                if let Some(target_position) = positions.get(&target) {
                    if *target_position < position {
                        sql.push(self.platform.drop_foreign_key_sql(foreign_key, table.identifier()));
                    }
                }
            }
        }
        sql
    }
}
