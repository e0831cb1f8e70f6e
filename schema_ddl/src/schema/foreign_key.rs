//! Foreign key constraints

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::identifier::Identifier;

/// Referential action for ON DELETE / ON UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('_', " ").as_str() {
            "CASCADE" => Ok(ReferentialAction::Cascade),
            "SET NULL" => Ok(ReferentialAction::SetNull),
            "SET DEFAULT" => Ok(ReferentialAction::SetDefault),
            "RESTRICT" => Ok(ReferentialAction::Restrict),
            "NO ACTION" => Ok(ReferentialAction::NoAction),
            _ => Err(SchemaError::InvalidColumnOption {
                option: "referential action".to_string(),
                reason: format!("unknown action \"{}\"", s),
            }),
        }
    }
}

/// Represents a foreign key constraint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    name: Option<Identifier>,
    local_table: Option<Identifier>,
    local_columns: Vec<Identifier>,
    foreign_table: Identifier,
    foreign_columns: Vec<Identifier>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub options: IndexMap<String, Value>,
}

impl ForeignKeyConstraint {
    pub fn new<L: AsRef<str>, F: AsRef<str>>(
        local_columns: &[L],
        foreign_table: &str,
        foreign_columns: &[F],
        name: Option<&str>,
    ) -> Result<Self, SchemaError> {
        if local_columns.len() != foreign_columns.len() || local_columns.is_empty() {
            return Err(SchemaError::ForeignKeyColumnCountMismatch {
                table: foreign_table.to_string(),
                local: local_columns.len(),
                foreign: foreign_columns.len(),
            });
        }
        let parse_all = |names: &[&str]| {
            names
                .iter()
                .map(|name| Identifier::parse(name))
                .collect::<Result<Vec<_>, _>>()
        };
        let local: Vec<&str> = local_columns.iter().map(AsRef::as_ref).collect();
        let foreign: Vec<&str> = foreign_columns.iter().map(AsRef::as_ref).collect();

        Ok(Self {
            name: name.map(Identifier::parse).transpose()?,
            local_table: None,
            local_columns: parse_all(&local)?,
            foreign_table: Identifier::parse(foreign_table)?,
            foreign_columns: parse_all(&foreign)?,
            on_delete: None,
            on_update: None,
            options: IndexMap::new(),
        })
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    /// Constraint name; empty until the owning table assigns one
    pub fn name(&self) -> &str {
        self.name.as_ref().map(Identifier::name).unwrap_or("")
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn quoted_name(&self, platform: &dyn Platform) -> String {
        self.name
            .as_ref()
            .map(|name| name.quoted_name(platform))
            .unwrap_or_default()
    }

    pub(crate) fn set_name(&mut self, name: Identifier) {
        self.name = Some(name);
    }

    pub fn local_table(&self) -> Option<&Identifier> {
        self.local_table.as_ref()
    }

    pub(crate) fn set_local_table(&mut self, table: Identifier) {
        self.local_table = Some(table);
    }

    pub fn local_columns(&self) -> Vec<&str> {
        self.local_columns.iter().map(Identifier::name).collect()
    }

    pub fn quoted_local_columns(&self, platform: &dyn Platform) -> Vec<String> {
        self.local_columns
            .iter()
            .map(|column| column.quoted_name(platform))
            .collect()
    }

    pub(crate) fn rename_local_column(&mut self, old: &Identifier, new: &Identifier) {
        for column in &mut self.local_columns {
            if column == old {
                *column = new.clone();
            }
        }
    }

    pub fn foreign_table(&self) -> &Identifier {
        &self.foreign_table
    }

    /// Foreign table name without namespace, lower-cased
    pub fn unqualified_foreign_table_name(&self) -> String {
        self.foreign_table.name().to_lowercase()
    }

    pub fn quoted_foreign_table_name(&self, platform: &dyn Platform) -> String {
        self.foreign_table.quoted_name(platform)
    }

    pub fn foreign_columns(&self) -> Vec<&str> {
        self.foreign_columns.iter().map(Identifier::name).collect()
    }

    pub fn quoted_foreign_columns(&self, platform: &dyn Platform) -> Vec<String> {
        self.foreign_columns
            .iter()
            .map(|column| column.quoted_name(platform))
            .collect()
    }

    pub fn option_flag(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Same columns, target and actions; names are ignored
    pub fn same_definition(&self, other: &ForeignKeyConstraint) -> bool {
        self.local_columns == other.local_columns
            && self.foreign_columns == other.foreign_columns
            && self.unqualified_foreign_table_name() == other.unqualified_foreign_table_name()
            && normalize_action(self.on_update) == normalize_action(other.on_update)
            && normalize_action(self.on_delete) == normalize_action(other.on_delete)
    }
}

/// `NO ACTION` is what an absent action means
fn normalize_action(action: Option<ReferentialAction>) -> ReferentialAction {
    action.unwrap_or(ReferentialAction::NoAction)
}
