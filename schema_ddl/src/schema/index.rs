//! Index definitions

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::identifier::Identifier;

/// Conventional name of the primary key index
pub const PRIMARY_KEY_NAME: &str = "primary";

/// Represents an index, including the primary key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    name: Identifier,
    columns: Vec<Identifier>,
    is_unique: bool,
    is_primary: bool,
    flags: BTreeSet<String>,
    options: IndexMap<String, Value>,
}

impl Index {
    /// Create an index after checking its structural invariants
    pub fn new<S: AsRef<str>>(
        name: &str,
        columns: &[S],
        is_unique: bool,
        is_primary: bool,
    ) -> Result<Self, SchemaError> {
        Self::with_flags(name, columns, is_unique, is_primary, &[], IndexMap::new())
    }

    pub fn with_flags<S: AsRef<str>>(
        name: &str,
        columns: &[S],
        is_unique: bool,
        is_primary: bool,
        flags: &[&str],
        options: IndexMap<String, Value>,
    ) -> Result<Self, SchemaError> {
        let name = Identifier::parse(name)?;
        if columns.is_empty() {
            return Err(SchemaError::EmptyIndexColumns(name.full_name()));
        }

        let columns = columns
            .iter()
            .map(|column| Identifier::parse(column.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let flags: BTreeSet<String> = flags.iter().map(|flag| flag.to_lowercase()).collect();

        let contradiction = if flags.contains("fulltext") && flags.contains("spatial") {
            Some("an index cannot be both fulltext and spatial")
        } else if is_primary && options.contains_key("where") {
            Some("a primary key cannot be partial")
        } else if is_primary && (flags.contains("fulltext") || flags.contains("spatial")) {
            Some("a primary key cannot be fulltext or spatial")
        } else {
            None
        };
        if let Some(reason) = contradiction {
            return Err(SchemaError::ContradictingOptions {
                name: name.full_name(),
                reason: reason.to_string(),
            });
        }

        Ok(Self {
            name,
            columns,
            is_unique: is_unique || is_primary,
            is_primary,
            flags,
            options,
        })
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn identifier(&self) -> &Identifier {
        &self.name
    }

    pub fn quoted_name(&self, platform: &dyn Platform) -> String {
        self.name.quoted_name(platform)
    }

    pub(crate) fn set_name(&mut self, name: Identifier) {
        self.name = name;
    }

    /// Column names in key order
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(Identifier::name).collect()
    }

    pub fn quoted_columns(&self, platform: &dyn Platform) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.quoted_name(platform))
            .collect()
    }

    pub(crate) fn rename_column(&mut self, old: &Identifier, new: &Identifier) {
        for column in &mut self.columns {
            if column == old {
                *column = new.clone();
            }
        }
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// A plain index: neither unique nor primary
    pub fn is_simple(&self) -> bool {
        !self.is_unique && !self.is_primary
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag.to_lowercase())
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn add_flag(&mut self, flag: &str) {
        self.flags.insert(flag.to_lowercase());
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Partial index predicate
    pub fn where_clause(&self) -> Option<&str> {
        self.options.get("where").and_then(Value::as_str)
    }

    /// Check whether this index covers exactly `columns` in the same order
    pub fn spans_columns<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns)
                .all(|(own, other)| *own == Identifier::new(other.as_ref()))
    }

    fn spans_same_columns(&self, other: &Index) -> bool {
        self.columns == other.columns
    }

    /// Check whether `other` provides everything this index is needed for
    pub fn is_fulfilled_by(&self, other: &Index) -> bool {
        if !self.spans_same_columns(other) {
            return false;
        }
        if self.where_clause() != other.where_clause() {
            return false;
        }
        if self.option("lengths") != other.option("lengths") {
            return false;
        }
        if self.is_simple() {
            // any unique or primary index serves a plain index as well
            return true;
        }
        self.is_primary == other.is_primary && self.is_unique == other.is_unique
    }

    /// Check whether this index makes `other` redundant
    pub fn overrules(&self, other: &Index) -> bool {
        if other.is_primary {
            return false;
        }
        if self.is_simple() && other.is_unique {
            return false;
        }
        self.spans_same_columns(other)
            && (self.is_primary || self.is_unique)
            && self.where_clause() == other.where_clause()
    }

    /// Same columns, same flags, same options; names are ignored
    pub fn same_definition(&self, other: &Index) -> bool {
        self.spans_same_columns(other)
            && self.is_unique == other.is_unique
            && self.is_primary == other.is_primary
            && self.flags == other.flags
            && self.options == other.options
    }
}
