//! Table definitions

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::column::Column;
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::identifier::{normalize_name, Identifier};
use crate::schema::index::{Index, PRIMARY_KEY_NAME};
use crate::schema::unique_constraint::UniqueConstraint;
use crate::utils::naming::generate_identifier_name;

/// Default limit for generated index and constraint names
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

/// Represents a database table.
///
/// Columns keep their insertion order. Every mutating method validates its
/// input before touching the table, so a failed call leaves it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    name: Identifier,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    implicit_indexes: BTreeSet<String>,
    primary_key: Option<String>,
    foreign_keys: IndexMap<String, ForeignKeyConstraint>,
    unique_constraints: IndexMap<String, UniqueConstraint>,
    options: IndexMap<String, String>,
    max_identifier_length: usize,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            name: Identifier::parse(name)?,
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            implicit_indexes: BTreeSet::new(),
            primary_key: None,
            foreign_keys: IndexMap::new(),
            unique_constraints: IndexMap::new(),
            options: IndexMap::new(),
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
        })
    }

    pub fn with_max_identifier_length(mut self, max_identifier_length: usize) -> Self {
        self.max_identifier_length = max_identifier_length;
        self
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    /// `namespace.name` when namespaced, otherwise just the name
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    pub fn identifier(&self) -> &Identifier {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    pub fn quoted_name(&self, platform: &dyn Platform) -> String {
        self.name.quoted_name(platform)
    }

    pub fn shortest_name(&self, default_namespace: Option<&str>) -> String {
        self.name.shortest_name(default_namespace)
    }

    pub(crate) fn set_name(&mut self, name: Identifier) {
        self.name = name.clone();
        for foreign_key in self.foreign_keys.values_mut() {
            foreign_key.set_local_table(name.clone());
        }
    }

    pub(crate) fn generate_name(&self, prefix: &str, columns: &[&str]) -> String {
        let mut parts = vec![self.full_name()];
        parts.extend(columns.iter().map(|column| column.to_string()));
        generate_identifier_name(&parts, prefix, self.max_identifier_length)
    }

    fn column_missing(&self, column: &str) -> SchemaError {
        SchemaError::ColumnDoesNotExist {
            table: self.full_name(),
            column: column.to_string(),
        }
    }

    fn ensure_columns_exist(&self, columns: &[&str]) -> Result<(), SchemaError> {
        match columns.iter().find(|column| !self.has_column(column)) {
            Some(missing) => Err(self.column_missing(missing)),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------- columns

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) -> Result<&mut Column, SchemaError> {
        column.identifier().validate()?;
        let key = normalize_name(column.name());
        if self.columns.contains_key(&key) {
            return Err(SchemaError::ColumnAlreadyExists {
                table: self.full_name(),
                column: column.name().to_string(),
            });
        }
        let (index, _) = self.columns.insert_full(key, column);
        Ok(&mut self.columns[index])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&normalize_name(name))
    }

    pub fn column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.columns
            .get(&normalize_name(name))
            .ok_or_else(|| self.column_missing(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, SchemaError> {
        let missing = self.column_missing(name);
        self.columns
            .get_mut(&normalize_name(name))
            .ok_or(missing)
    }

    /// Columns in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Drop a column.
    ///
    /// Fails with [`SchemaError::ColumnInUse`] while an index, foreign key or
    /// unique constraint still spans it. Implicit indexes left behind by a
    /// removed foreign key are dropped along with the column.
    pub fn drop_column(&mut self, name: &str) -> Result<Column, SchemaError> {
        let key = normalize_name(name);
        if !self.columns.contains_key(&key) {
            return Err(self.column_missing(name));
        }
        if let Some(user) = self.column_user(&key) {
            return Err(SchemaError::ColumnInUse {
                table: self.full_name(),
                column: name.to_string(),
                user,
            });
        }

        let orphaned: Vec<String> = self
            .implicit_indexes
            .iter()
            .filter(|index_key| {
                self.indexes
                    .get(*index_key)
                    .map(|index| index.columns().iter().any(|column| normalize_name(column) == key))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        for index_key in &orphaned {
            self.indexes.shift_remove(index_key);
            self.implicit_indexes.remove(index_key);
        }
        self.columns.shift_remove(&key).ok_or_else(|| self.column_missing(name))
    }

    /// Name of the first index or constraint spanning the column `key`
    fn column_user(&self, key: &str) -> Option<String> {
        let spans = |columns: Vec<&str>| columns.iter().any(|column| normalize_name(column) == key);

        if let Some(foreign_key) = self
            .foreign_keys
            .values()
            .find(|foreign_key| spans(foreign_key.local_columns()))
        {
            return Some(foreign_key.name().to_string());
        }
        if let Some(index) = self
            .indexes
            .iter()
            .filter(|(index_key, _)| !self.implicit_indexes.contains(*index_key))
            .map(|(_, index)| index)
            .find(|index| spans(index.columns()))
        {
            return Some(index.name().to_string());
        }
        self.unique_constraints
            .values()
            .find(|constraint| spans(constraint.columns()))
            .map(|constraint| constraint.name().to_string())
    }

    /// Rename a column in place, keeping its position and updating every
    /// index and constraint that spans it
    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<(), SchemaError> {
        let old = Identifier::new(old_name);
        let new = Identifier::parse(new_name)?;
        let old_key = normalize_name(old_name);
        let new_key = normalize_name(&new.full_name());
        if !self.columns.contains_key(&old_key) {
            return Err(self.column_missing(old_name));
        }
        if old_key != new_key && self.columns.contains_key(&new_key) {
            return Err(SchemaError::ColumnAlreadyExists {
                table: self.full_name(),
                column: new_name.to_string(),
            });
        }

        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .map(|(key, mut column)| {
                if key == old_key {
                    column.set_name(new.clone());
                    (new_key.clone(), column)
                } else {
                    (key, column)
                }
            })
            .collect();

        for index in self.indexes.values_mut() {
            index.rename_column(&old, &new);
        }
        for foreign_key in self.foreign_keys.values_mut() {
            foreign_key.rename_local_column(&old, &new);
        }
        for constraint in self.unique_constraints.values_mut() {
            constraint.rename_column(&old, &new);
        }
        Ok(())
    }

    // ---------------------------------------------------------------- indexes

    /// Set the primary key; its columns become NOT NULL
    pub fn set_primary_key<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
    ) -> Result<(), SchemaError> {
        let index = Index::new(name.unwrap_or(PRIMARY_KEY_NAME), columns, true, true)?;
        self.add_index_internal(index, false)?;
        for column in columns {
            if let Some(column) = self.columns.get_mut(&normalize_name(column.as_ref())) {
                column.nullable = false;
            }
        }
        Ok(())
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.primary_key
            .as_ref()
            .and_then(|key| self.indexes.get(key))
    }

    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key()
            .map(Index::columns)
            .unwrap_or_default()
    }

    pub fn drop_primary_key(&mut self) -> Result<Index, SchemaError> {
        let key = self
            .primary_key
            .take()
            .ok_or_else(|| SchemaError::PrimaryKeyDoesNotExist(self.full_name()))?;
        self.indexes
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::PrimaryKeyDoesNotExist(self.full_name()))
    }

    /// Add a plain index; unnamed indexes get a generated `IDX_` name
    pub fn add_index<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
    ) -> Result<(), SchemaError> {
        let column_names: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name("idx", &column_names),
        };
        self.add_index_internal(Index::new(&name, columns, false, false)?, false)
    }

    /// Add a unique index; unnamed indexes get a generated `UNIQ_` name
    pub fn add_unique_index<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
    ) -> Result<(), SchemaError> {
        let column_names: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name("uniq", &column_names),
        };
        self.add_index_internal(Index::new(&name, columns, true, false)?, false)
    }

    /// Add a fully built index
    pub fn add_index_definition(&mut self, index: Index) -> Result<(), SchemaError> {
        self.add_index_internal(index, false)
    }

    fn add_index_internal(&mut self, index: Index, implicit: bool) -> Result<(), SchemaError> {
        self.ensure_columns_exist(&index.columns())?;

        let key = normalize_name(index.name());
        let replaced: Vec<String> = self
            .implicit_indexes
            .iter()
            .filter(|implicit_key| {
                self.indexes
                    .get(*implicit_key)
                    .map(|existing| existing.is_fulfilled_by(&index) || index.overrules(existing))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        if index.is_primary() && self.primary_key.is_some() {
            return Err(SchemaError::PrimaryKeyAlreadyExists(self.full_name()));
        }
        if self.indexes.contains_key(&key) && !replaced.contains(&key) {
            return Err(SchemaError::IndexAlreadyExists {
                table: self.full_name(),
                index: index.name().to_string(),
            });
        }

        for implicit_key in &replaced {
            self.indexes.shift_remove(implicit_key);
            self.implicit_indexes.remove(implicit_key);
        }
        if index.is_primary() {
            self.primary_key = Some(key.clone());
        }
        if implicit {
            self.implicit_indexes.insert(key.clone());
        }
        self.indexes.insert(key, index);
        Ok(())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(&normalize_name(name))
    }

    pub fn index(&self, name: &str) -> Result<&Index, SchemaError> {
        self.indexes
            .get(&normalize_name(name))
            .ok_or_else(|| SchemaError::IndexDoesNotExist {
                table: self.full_name(),
                index: name.to_string(),
            })
    }

    /// All indexes including the primary key
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    pub fn is_implicit_index(&self, name: &str) -> bool {
        self.implicit_indexes.contains(&normalize_name(name))
    }

    pub fn drop_index(&mut self, name: &str) -> Result<Index, SchemaError> {
        let key = normalize_name(name);
        let index = self
            .indexes
            .shift_remove(&key)
            .ok_or_else(|| SchemaError::IndexDoesNotExist {
                table: self.full_name(),
                index: name.to_string(),
            })?;
        if self.primary_key.as_deref() == Some(key.as_str()) {
            self.primary_key = None;
        }
        self.implicit_indexes.remove(&key);
        Ok(index)
    }

    /// Rename an index; `None` regenerates the default name
    pub fn rename_index(&mut self, old_name: &str, new_name: Option<&str>) -> Result<(), SchemaError> {
        let old_key = normalize_name(old_name);
        let existing = self.index(old_name)?;
        let new_name = match new_name {
            Some(name) => name.to_string(),
            None => {
                let prefix = if existing.is_unique() { "uniq" } else { "idx" };
                self.generate_name(prefix, &existing.columns())
            }
        };
        let new = Identifier::parse(&new_name)?;
        let new_key = normalize_name(&new.full_name());
        if new_key == old_key {
            return Ok(());
        }
        if self.indexes.contains_key(&new_key) {
            return Err(SchemaError::IndexAlreadyExists {
                table: self.full_name(),
                index: new_name,
            });
        }

        self.indexes = std::mem::take(&mut self.indexes)
            .into_iter()
            .map(|(key, mut index)| {
                if key == old_key {
                    index.set_name(new.clone());
                    (new_key.clone(), index)
                } else {
                    (key, index)
                }
            })
            .collect();
        if self.primary_key.as_deref() == Some(old_key.as_str()) {
            self.primary_key = Some(new_key.clone());
        }
        if self.implicit_indexes.remove(&old_key) {
            self.implicit_indexes.insert(new_key);
        }
        Ok(())
    }

    // ------------------------------------------------------------ constraints

    /// Add a unique constraint; unnamed constraints get a generated name
    pub fn add_unique_constraint(
        &mut self,
        mut constraint: UniqueConstraint,
    ) -> Result<(), SchemaError> {
        self.ensure_columns_exist(&constraint.columns())?;
        if !constraint.has_name() {
            let name = self.generate_name("uniq", &constraint.columns());
            constraint.set_name(Identifier::new(&name));
        }
        let key = normalize_name(constraint.name());
        if self.unique_constraints.contains_key(&key) {
            return Err(SchemaError::UniqueConstraintAlreadyExists {
                table: self.full_name(),
                constraint: constraint.name().to_string(),
            });
        }
        self.unique_constraints.insert(key, constraint);
        Ok(())
    }

    pub fn has_unique_constraint(&self, name: &str) -> bool {
        self.unique_constraints.contains_key(&normalize_name(name))
    }

    pub fn unique_constraint(&self, name: &str) -> Result<&UniqueConstraint, SchemaError> {
        self.unique_constraints
            .get(&normalize_name(name))
            .ok_or_else(|| SchemaError::UniqueConstraintDoesNotExist {
                table: self.full_name(),
                constraint: name.to_string(),
            })
    }

    pub fn unique_constraints(&self) -> impl Iterator<Item = &UniqueConstraint> {
        self.unique_constraints.values()
    }

    pub fn drop_unique_constraint(&mut self, name: &str) -> Result<UniqueConstraint, SchemaError> {
        self.unique_constraints
            .shift_remove(&normalize_name(name))
            .ok_or_else(|| SchemaError::UniqueConstraintDoesNotExist {
                table: self.full_name(),
                constraint: name.to_string(),
            })
    }

    /// Add a foreign key constraint.
    ///
    /// Unnamed constraints get a generated `FK_` name. An implicit index over
    /// the local columns is added unless an existing index already covers
    /// them.
    pub fn add_foreign_key_constraint(
        &mut self,
        mut foreign_key: ForeignKeyConstraint,
    ) -> Result<(), SchemaError> {
        self.ensure_columns_exist(&foreign_key.local_columns())?;
        if !foreign_key.has_name() {
            let name = self.generate_name("fk", &foreign_key.local_columns());
            foreign_key.set_name(Identifier::new(&name));
        }
        let key = normalize_name(foreign_key.name());
        if self.foreign_keys.contains_key(&key) {
            return Err(SchemaError::ForeignKeyAlreadyExists {
                table: self.full_name(),
                constraint: foreign_key.name().to_string(),
            });
        }

        let local_columns = foreign_key.local_columns();
        let index_name = self.generate_name("idx", &local_columns);
        let candidate = Index::new(&index_name, &local_columns, false, false)?;
        let covered = self
            .indexes
            .values()
            .any(|existing| candidate.is_fulfilled_by(existing));

        if !covered && !self.has_index(&index_name) {
            self.add_index_internal(candidate, true)?;
        }
        foreign_key.set_local_table(self.name.clone());
        self.foreign_keys.insert(key, foreign_key);
        Ok(())
    }

    pub fn has_foreign_key(&self, name: &str) -> bool {
        self.foreign_keys.contains_key(&normalize_name(name))
    }

    pub fn foreign_key(&self, name: &str) -> Result<&ForeignKeyConstraint, SchemaError> {
        self.foreign_keys
            .get(&normalize_name(name))
            .ok_or_else(|| SchemaError::ForeignKeyDoesNotExist {
                table: self.full_name(),
                constraint: name.to_string(),
            })
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyConstraint> {
        self.foreign_keys.values()
    }

    pub fn remove_foreign_key(&mut self, name: &str) -> Result<ForeignKeyConstraint, SchemaError> {
        self.foreign_keys
            .shift_remove(&normalize_name(name))
            .ok_or_else(|| SchemaError::ForeignKeyDoesNotExist {
                table: self.full_name(),
                constraint: name.to_string(),
            })
    }

    // ---------------------------------------------------------------- options

    pub fn add_option(&mut self, key: &str, value: &str) -> &mut Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }

    pub fn remove_option(&mut self, key: &str) -> Option<String> {
        self.options.shift_remove(key)
    }

    pub(crate) fn options_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.options
    }

    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.values_mut()
    }
}
