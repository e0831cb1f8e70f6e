//! Unique constraints

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::identifier::Identifier;

/// A uniqueness constraint over an ordered list of columns.
///
/// Unlike a unique [`Index`](crate::schema::Index) it carries no lookup
/// semantics of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueConstraint {
    name: Option<Identifier>,
    columns: Vec<Identifier>,
    flags: BTreeSet<String>,
}

impl UniqueConstraint {
    pub fn new<S: AsRef<str>>(name: Option<&str>, columns: &[S]) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyIndexColumns(
                name.unwrap_or_default().to_string(),
            ));
        }
        Ok(Self {
            name: name.map(Identifier::parse).transpose()?,
            columns: columns
                .iter()
                .map(|column| Identifier::parse(column.as_ref()))
                .collect::<Result<_, _>>()?,
            flags: BTreeSet::new(),
        })
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.flags.insert(flag.to_lowercase());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag.to_lowercase())
    }

    pub fn name(&self) -> &str {
        self.name.as_ref().map(Identifier::name).unwrap_or("")
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub(crate) fn set_name(&mut self, name: Identifier) {
        self.name = Some(name);
    }

    pub fn quoted_name(&self, platform: &dyn Platform) -> String {
        self.name
            .as_ref()
            .map(|name| name.quoted_name(platform))
            .unwrap_or_default()
    }

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

    pub fn same_definition(&self, other: &UniqueConstraint) -> bool {
        self.columns == other.columns && self.flags == other.flags
    }
}
