//! Declarative schema definitions
//!
//! A [`SchemaDefinition`] is the serde form of a [`Schema`]. Column types are
//! given by name and resolved through a [`TypeRegistry`], column options use
//! the same keys as [`Column::set_options`].

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::column::Column;
use crate::schema::database::{Schema, SchemaConfig};
use crate::schema::foreign_key::{ForeignKeyConstraint, ReferentialAction};
use crate::schema::index::Index;
use crate::schema::sequence::Sequence;
use crate::schema::table::Table;
use crate::schema::types::TypeRegistry;
use crate::schema::unique_constraint::UniqueConstraint;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    pub namespaces: Vec<String>,
    pub sequences: Vec<SequenceDefinition>,
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub name: String,
    #[serde(default = "one")]
    pub allocation_size: i64,
    #[serde(default = "one")]
    pub initial_value: i64,
    #[serde(default)]
    pub cache: Option<u32>,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraintDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Everything else, e.g. `length`, `nullable` or `default`
    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub options: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraintDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub references: String,
    pub foreign_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
    #[serde(default)]
    pub options: IndexMap<String, Value>,
}

impl SchemaDefinition {
    /// Build and validate the schema this definition describes
    pub fn into_schema(&self, registry: &TypeRegistry, config: SchemaConfig) -> Result<Schema> {
        let mut schema = Schema::new(config);

        for namespace in &self.namespaces {
            if !schema.has_namespace(namespace) {
                schema.create_namespace(namespace)?;
            }
        }

        for definition in &self.sequences {
            let mut sequence = Sequence::new(&definition.name)?
                .allocation_size(definition.allocation_size)
                .initial_value(definition.initial_value);
            if let Some(cache) = definition.cache {
                sequence = sequence.cache(cache);
            }
            schema.add_sequence(sequence)?;
        }

        for definition in &self.tables {
            let table = schema.create_table(&definition.name)?;
            definition.apply(table, registry)?;
        }

        schema.validate()?;
        debug!("Built schema with {} tables from definition", self.tables.len());
        Ok(schema)
    }
}

impl TableDefinition {
    fn apply(&self, table: &mut Table, registry: &TypeRegistry) -> Result<()> {
        for definition in &self.columns {
            let mut column = Column::new(&definition.name, registry.get(&definition.type_name)?);
            column.set_options(&definition.options)?;
            table.add_column(column)?;
        }

        if !self.primary_key.is_empty() {
            table.set_primary_key(&self.primary_key, None)?;
        }

        for definition in &self.indexes {
            if definition.flags.is_empty() && definition.options.is_empty() {
                if definition.unique {
                    table.add_unique_index(&definition.columns, definition.name.as_deref())?;
                } else {
                    table.add_index(&definition.columns, definition.name.as_deref())?;
                }
                continue;
            }

            let name = match &definition.name {
                Some(name) => name.clone(),
                None => {
                    let prefix = if definition.unique { "uniq" } else { "idx" };
                    let columns: Vec<&str> = definition.columns.iter().map(String::as_str).collect();
                    table.generate_name(prefix, &columns)
                }
            };
            let flags: Vec<&str> = definition.flags.iter().map(String::as_str).collect();
            table.add_index_definition(Index::with_flags(
                &name,
                &definition.columns,
                definition.unique,
                false,
                &flags,
                definition.options.clone(),
            )?)?;
        }

        for definition in &self.unique_constraints {
            let mut constraint =
                UniqueConstraint::new(definition.name.as_deref(), &definition.columns)?;
            for flag in &definition.flags {
                constraint = constraint.flag(flag);
            }
            table.add_unique_constraint(constraint)?;
        }

        for definition in &self.foreign_keys {
            let mut foreign_key = ForeignKeyConstraint::new(
                &definition.columns,
                &definition.references,
                &definition.foreign_columns,
                definition.name.as_deref(),
            )?;
            foreign_key.on_delete = definition.on_delete;
            foreign_key.on_update = definition.on_update;
            foreign_key.options = definition.options.clone();
            table.add_foreign_key_constraint(foreign_key)?;
        }

        for (key, value) in &self.options {
            table.add_option(key, value);
        }
        Ok(())
    }
}

/// Load a definition from a TOML, YAML or JSON file, chosen by extension
pub fn load_definition_file(path: impl AsRef<Path>) -> Result<SchemaDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("toml") => Ok(toml::from_str(&content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Err(Error::ConfigError(format!(
            "Unsupported definition file: {}",
            path.display()
        ))),
    }
}
