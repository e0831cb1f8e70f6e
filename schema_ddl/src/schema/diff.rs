//! Schema and table differences
//!
//! These are produced by the [`Comparator`](crate::comparator::Comparator)
//! and rendered into DDL by a [`Platform`].

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::Platform;
use crate::schema::column::Column;
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::index::Index;
use crate::schema::sequence::Sequence;
use crate::schema::table::Table;
use crate::schema::unique_constraint::UniqueConstraint;

/// A column attribute that differs between two column versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnProperty {
    Type,
    Length,
    Precision,
    Scale,
    Unsigned,
    Fixed,
    Nullable,
    Default,
    Autoincrement,
    Comment,
    Values,
    PlatformOption(String),
}

impl fmt::Display for ColumnProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnProperty::Type => f.write_str("type"),
            ColumnProperty::Length => f.write_str("length"),
            ColumnProperty::Precision => f.write_str("precision"),
            ColumnProperty::Scale => f.write_str("scale"),
            ColumnProperty::Unsigned => f.write_str("unsigned"),
            ColumnProperty::Fixed => f.write_str("fixed"),
            ColumnProperty::Nullable => f.write_str("nullable"),
            ColumnProperty::Default => f.write_str("default"),
            ColumnProperty::Autoincrement => f.write_str("autoincrement"),
            ColumnProperty::Comment => f.write_str("comment"),
            ColumnProperty::Values => f.write_str("values"),
            ColumnProperty::PlatformOption(key) => write!(f, "platform option {}", key),
        }
    }
}

/// Old and new version of a column that exists on both sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub old_column: Column,
    pub new_column: Column,
    pub changed_properties: Vec<ColumnProperty>,
}

impl ColumnDiff {
    pub fn has_changed(&self, property: &ColumnProperty) -> bool {
        self.changed_properties.contains(property)
    }

    /// Whether the column was renamed as well
    pub fn has_name_changed(&self) -> bool {
        self.old_column.identifier() != self.new_column.identifier()
    }

    /// Whether nothing but the default changed
    pub fn only_default_changed(&self) -> bool {
        self.changed_properties == [ColumnProperty::Default]
    }
}

/// A table option whose value differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChange {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Changes to a single table.
///
/// `old_table` and `new_table` are full snapshots of both sides so platforms
/// that rebuild tables can work from the complete definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDiff {
    pub old_table: Table,
    pub new_table: Table,
    pub added_columns: Vec<Column>,
    pub changed_columns: Vec<ColumnDiff>,
    pub dropped_columns: Vec<Column>,
    /// Old column name to the column under its new name
    pub renamed_columns: IndexMap<String, Column>,
    pub added_indexes: Vec<Index>,
    pub changed_indexes: Vec<Index>,
    pub dropped_indexes: Vec<Index>,
    /// Old index name to the index under its new name
    pub renamed_indexes: IndexMap<String, Index>,
    pub added_foreign_keys: Vec<ForeignKeyConstraint>,
    pub changed_foreign_keys: Vec<ForeignKeyConstraint>,
    pub dropped_foreign_keys: Vec<ForeignKeyConstraint>,
    pub added_unique_constraints: Vec<UniqueConstraint>,
    pub dropped_unique_constraints: Vec<UniqueConstraint>,
    pub changed_options: Vec<OptionChange>,
}

impl TableDiff {
    pub fn new(old_table: Table, new_table: Table) -> Self {
        Self {
            old_table,
            new_table,
            added_columns: Vec::new(),
            changed_columns: Vec::new(),
            dropped_columns: Vec::new(),
            renamed_columns: IndexMap::new(),
            added_indexes: Vec::new(),
            changed_indexes: Vec::new(),
            dropped_indexes: Vec::new(),
            renamed_indexes: IndexMap::new(),
            added_foreign_keys: Vec::new(),
            changed_foreign_keys: Vec::new(),
            dropped_foreign_keys: Vec::new(),
            added_unique_constraints: Vec::new(),
            dropped_unique_constraints: Vec::new(),
            changed_options: Vec::new(),
        }
    }

    /// Name of the table being altered
    pub fn name(&self) -> String {
        self.old_table.full_name()
    }

    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.changed_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.renamed_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.changed_foreign_keys.is_empty()
            && self.dropped_foreign_keys.is_empty()
            && self.added_unique_constraints.is_empty()
            && self.dropped_unique_constraints.is_empty()
            && self.changed_options.is_empty()
    }

    pub fn changed_column(&self, name: &str) -> Option<&ColumnDiff> {
        self.changed_columns
            .iter()
            .find(|diff| diff.old_column.name().eq_ignore_ascii_case(name))
    }
}

/// Changes between two schemas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub new_namespaces: Vec<String>,
    pub removed_namespaces: Vec<String>,
    pub new_tables: Vec<Table>,
    pub changed_tables: Vec<TableDiff>,
    pub removed_tables: Vec<Table>,
    pub new_sequences: Vec<Sequence>,
    pub changed_sequences: Vec<Sequence>,
    pub removed_sequences: Vec<Sequence>,
    /// Foreign keys of surviving tables that point at removed tables
    pub orphaned_foreign_keys: Vec<ForeignKeyConstraint>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.new_namespaces.is_empty()
            && self.removed_namespaces.is_empty()
            && self.new_tables.is_empty()
            && self.changed_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.new_sequences.is_empty()
            && self.changed_sequences.is_empty()
            && self.removed_sequences.is_empty()
            && self.orphaned_foreign_keys.is_empty()
    }

    /// All statements needed to migrate, drops included
    pub fn to_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        self.build_sql(platform, false)
    }

    /// Statements that never drop tables, sequences or orphaned keys
    pub fn to_save_sql(&self, platform: &dyn Platform) -> Result<Vec<String>> {
        self.build_sql(platform, true)
    }

    fn build_sql(&self, platform: &dyn Platform, save_mode: bool) -> Result<Vec<String>> {
        let mut sql = Vec::new();

        if platform.supports_schemas() {
            for namespace in &self.new_namespaces {
                sql.push(platform.create_namespace_sql(namespace)?);
            }
        }

        if !save_mode && platform.supports_foreign_key_alter() {
            for foreign_key in &self.orphaned_foreign_keys {
                if let Some(table) = foreign_key.local_table() {
                    sql.push(platform.drop_foreign_key_sql(foreign_key, table));
                }
            }
        }

        if platform.supports_sequences() {
            for sequence in &self.changed_sequences {
                sql.push(platform.alter_sequence_sql(sequence)?);
            }
            if !save_mode {
                for sequence in &self.removed_sequences {
                    sql.push(platform.drop_sequence_sql(sequence)?);
                }
            }
            for sequence in &self.new_sequences {
                sql.push(platform.create_sequence_sql(sequence)?);
            }
        }

        let new_tables: Vec<&Table> = self.new_tables.iter().collect();
        sql.extend(platform.create_tables_sql(&new_tables)?);

        if !save_mode {
            let removed_tables: Vec<&Table> = self.removed_tables.iter().collect();
            sql.extend(platform.drop_tables_sql(&removed_tables)?);
        }

        for table_diff in &self.changed_tables {
            sql.extend(platform.alter_table_sql(table_diff)?);
        }

        if !save_mode && platform.supports_schemas() {
            for namespace in &self.removed_namespaces {
                sql.push(platform.drop_namespace_sql(namespace)?);
            }
        }

        Ok(sql)
    }
}
