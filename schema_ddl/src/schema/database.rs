//! The schema container

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{CreateSchemaObjectsSqlBuilder, DropSchemaObjectsSqlBuilder};
use crate::error::{Result, SchemaError};
use crate::platform::Platform;
use crate::schema::identifier::{normalize_name, Identifier};
use crate::schema::sequence::Sequence;
use crate::schema::table::{Table, DEFAULT_MAX_IDENTIFIER_LENGTH};

/// Settings shared by every table created through a [`Schema`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Default namespace
    pub name: Option<String>,
    pub max_identifier_length: usize,
    pub default_table_options: IndexMap<String, String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            name: None,
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            default_table_options: IndexMap::new(),
        }
    }
}

impl SchemaConfig {
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_max_identifier_length(mut self, max_identifier_length: usize) -> Self {
        self.max_identifier_length = max_identifier_length;
        self
    }

    pub fn with_default_table_option(mut self, key: &str, value: &str) -> Self {
        self.default_table_options
            .insert(key.to_string(), value.to_string());
        self
    }
}

/// A set of tables, sequences and namespaces.
///
/// Tables and sequences share one name space. Names are keyed fully
/// qualified, so `users` and `public.users` are the same table when
/// `public` is the default namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    config: SchemaConfig,
    tables: IndexMap<String, Table>,
    sequences: IndexMap<String, Sequence>,
    namespaces: IndexSet<String>,
}

impl Schema {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// The default namespace
    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    fn qualified_key(&self, identifier: &Identifier) -> String {
        let key = identifier.full_name().to_lowercase();
        match (identifier.namespace(), self.name()) {
            (None, Some(default)) => format!("{}.{}", default.to_lowercase(), key),
            _ => key,
        }
    }

    fn key_for(&self, name: &str) -> String {
        self.qualified_key(&Identifier::new(name))
    }

    fn ensure_name_free(&self, identifier: &Identifier) -> std::result::Result<(), SchemaError> {
        let key = self.qualified_key(identifier);
        if self.tables.contains_key(&key) || self.sequences.contains_key(&key) {
            return Err(SchemaError::NameAlreadyInUse(identifier.full_name()));
        }
        Ok(())
    }

    fn register_namespace_of(&mut self, identifier: &Identifier) {
        if let Some(namespace) = identifier.namespace() {
            if !identifier.is_in_default_namespace(self.name()) {
                self.namespaces.insert(namespace.to_lowercase());
            }
        }
    }

    // ----------------------------------------------------------------- tables

    /// Create an empty table carrying the schema's default options
    pub fn create_table(&mut self, name: &str) -> std::result::Result<&mut Table, SchemaError> {
        let mut table =
            Table::new(name)?.with_max_identifier_length(self.config.max_identifier_length);
        for (key, value) in &self.config.default_table_options {
            table.add_option(key, value);
        }
        self.add_table(table)
    }

    /// Add a fully built table
    pub fn add_table(&mut self, table: Table) -> std::result::Result<&mut Table, SchemaError> {
        let key = self.qualified_key(table.identifier());
        if self.tables.contains_key(&key) {
            return Err(SchemaError::TableAlreadyExists(table.full_name()));
        }
        if self.sequences.contains_key(&key) {
            return Err(SchemaError::NameAlreadyInUse(table.full_name()));
        }

        self.register_namespace_of(table.identifier());
        debug!("Adding table {}", table.full_name());
        let (index, _) = self.tables.insert_full(key, table);
        Ok(&mut self.tables[index])
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&self.key_for(name))
    }

    pub fn table(&self, name: &str) -> std::result::Result<&Table, SchemaError> {
        self.tables
            .get(&self.key_for(name))
            .ok_or_else(|| SchemaError::TableDoesNotExist(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> std::result::Result<&mut Table, SchemaError> {
        let key = self.key_for(name);
        self.tables
            .get_mut(&key)
            .ok_or_else(|| SchemaError::TableDoesNotExist(name.to_string()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn drop_table(&mut self, name: &str) -> std::result::Result<Table, SchemaError> {
        let key = self.key_for(name);
        self.tables
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::TableDoesNotExist(name.to_string()))
    }

    /// Rename a table, keeping its position
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> std::result::Result<(), SchemaError> {
        let old_key = self.key_for(old_name);
        if !self.tables.contains_key(&old_key) {
            return Err(SchemaError::TableDoesNotExist(old_name.to_string()));
        }
        let new = Identifier::parse(new_name)?;
        let new_key = self.qualified_key(&new);
        if new_key != old_key {
            self.ensure_name_free(&new)?;
        }

        self.register_namespace_of(&new);
        self.tables = std::mem::take(&mut self.tables)
            .into_iter()
            .map(|(key, mut table)| {
                if key == old_key {
                    table.set_name(new.clone());
                    (new_key.clone(), table)
                } else {
                    (key, table)
                }
            })
            .collect();
        Ok(())
    }

    // -------------------------------------------------------------- sequences

    pub fn create_sequence(
        &mut self,
        name: &str,
        allocation_size: i64,
        initial_value: i64,
    ) -> std::result::Result<&mut Sequence, SchemaError> {
        let sequence = Sequence::new(name)?
            .allocation_size(allocation_size)
            .initial_value(initial_value);
        self.add_sequence(sequence)
    }

    pub fn add_sequence(&mut self, sequence: Sequence) -> std::result::Result<&mut Sequence, SchemaError> {
        let key = self.qualified_key(sequence.identifier());
        if self.sequences.contains_key(&key) {
            return Err(SchemaError::SequenceAlreadyExists(
                sequence.identifier().full_name(),
            ));
        }
        if self.tables.contains_key(&key) {
            return Err(SchemaError::NameAlreadyInUse(sequence.identifier().full_name()));
        }

        self.register_namespace_of(sequence.identifier());
        let (index, _) = self.sequences.insert_full(key, sequence);
        Ok(&mut self.sequences[index])
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequences.contains_key(&self.key_for(name))
    }

    pub fn sequence(&self, name: &str) -> std::result::Result<&Sequence, SchemaError> {
        self.sequences
            .get(&self.key_for(name))
            .ok_or_else(|| SchemaError::SequenceDoesNotExist(name.to_string()))
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.values()
    }

    pub fn drop_sequence(&mut self, name: &str) -> std::result::Result<Sequence, SchemaError> {
        let key = self.key_for(name);
        self.sequences
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::SequenceDoesNotExist(name.to_string()))
    }

    // ------------------------------------------------------------- namespaces

    pub fn create_namespace(&mut self, name: &str) -> std::result::Result<(), SchemaError> {
        let namespace = Identifier::parse(name)?;
        if !self.namespaces.insert(namespace.full_name().to_lowercase()) {
            return Err(SchemaError::NamespaceAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(&normalize_name(name))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    /// Whether a name lives in a namespace this schema owns
    fn owns_namespace_of(&self, identifier: &Identifier) -> bool {
        match identifier.namespace() {
            None => true,
            Some(namespace) => {
                identifier.is_in_default_namespace(self.name())
                    || self.namespaces.contains(&namespace.to_lowercase())
            }
        }
    }

    /// Check that foreign keys into this schema's namespaces point at
    /// existing tables and columns
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        for table in self.tables.values() {
            for foreign_key in table.foreign_keys() {
                let target = foreign_key.foreign_table();
                if !self.owns_namespace_of(target) {
                    continue;
                }
                let referenced = self
                    .tables
                    .get(&self.qualified_key(target))
                    .ok_or_else(|| SchemaError::TableDoesNotExist(target.full_name()))?;
                for column in foreign_key.foreign_columns() {
                    if !referenced.has_column(column) {
                        return Err(SchemaError::ColumnDoesNotExist {
                            table: referenced.full_name(),
                            column: column.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Statements creating every object of this schema
    pub fn to_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        CreateSchemaObjectsSqlBuilder::new(platform).build_sql(self)
    }

    /// Statements dropping every object of this schema
    pub fn to_drop_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        DropSchemaObjectsSqlBuilder::new(platform).build_sql(self)
    }
}
