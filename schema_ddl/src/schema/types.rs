//! Dialect-independent logical column types and the type registry

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Logical column type, mapped by each platform to a native type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    #[serde(rename = "smallint")]
    SmallInt,
    Integer,
    #[serde(rename = "bigint")]
    BigInt,
    Decimal,
    Float,
    #[serde(rename = "smallfloat")]
    SmallFloat,
    String,
    AsciiString,
    Text,
    Guid,
    Binary,
    Blob,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "datetimetz")]
    DateTimeTz,
    Time,
    Json,
    Enum,
}

impl Type {
    pub const ALL: [Type; 19] = [
        Type::SmallInt,
        Type::Integer,
        Type::BigInt,
        Type::Decimal,
        Type::Float,
        Type::SmallFloat,
        Type::String,
        Type::AsciiString,
        Type::Text,
        Type::Guid,
        Type::Binary,
        Type::Blob,
        Type::Boolean,
        Type::Date,
        Type::DateTime,
        Type::DateTimeTz,
        Type::Time,
        Type::Json,
        Type::Enum,
    ];

    /// Canonical registry name
    pub fn name(&self) -> &'static str {
        match self {
            Type::SmallInt => "smallint",
            Type::Integer => "integer",
            Type::BigInt => "bigint",
            Type::Decimal => "decimal",
            Type::Float => "float",
            Type::SmallFloat => "smallfloat",
            Type::String => "string",
            Type::AsciiString => "ascii_string",
            Type::Text => "text",
            Type::Guid => "guid",
            Type::Binary => "binary",
            Type::Blob => "blob",
            Type::Boolean => "boolean",
            Type::Date => "date",
            Type::DateTime => "datetime",
            Type::DateTimeTz => "datetimetz",
            Type::Time => "time",
            Type::Json => "json",
            Type::Enum => "enum",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::SmallInt | Type::Integer | Type::BigInt)
    }

    /// Types whose declared length is part of the native type
    pub fn is_length_bound(&self) -> bool {
        matches!(self, Type::String | Type::AsciiString | Type::Binary)
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self, Type::DateTime | Type::DateTimeTz)
    }

    /// Large object types (TEXT/BLOB families)
    pub fn is_lob(&self) -> bool {
        matches!(self, Type::Text | Type::Blob)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit lookup table from type names to logical types.
///
/// Starts with every built-in name and accepts application-defined aliases.
/// It is passed to whatever needs name lookups instead of living in global
/// state.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Type>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in types
    pub fn new() -> Self {
        let types = Type::ALL
            .iter()
            .map(|ty| (ty.name().to_string(), *ty))
            .collect();
        Self { types }
    }

    /// Register an alias resolving to a built-in type
    pub fn register_alias(&mut self, name: &str, ty: Type) -> Result<(), SchemaError> {
        let key = name.to_lowercase();
        if self.types.contains_key(&key) {
            return Err(SchemaError::TypeAlreadyRegistered(name.to_string()));
        }
        self.types.insert(key, ty);
        Ok(())
    }

    /// Resolve a type name
    pub fn get(&self, name: &str) -> Result<Type, SchemaError> {
        self.types
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(&name.to_lowercase())
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_resolve() {
        let registry = TypeRegistry::new();
        for ty in Type::ALL {
            assert_eq!(registry.get(ty.name()).unwrap(), ty);
        }
        assert_eq!(registry.get("JSON").unwrap(), Type::Json);
    }

    #[test]
    fn aliases_register_once() {
        let mut registry = TypeRegistry::new();
        registry.register_alias("email", Type::String).unwrap();

        assert_eq!(registry.get("email").unwrap(), Type::String);
        assert_eq!(
            registry.register_alias("Email", Type::Text),
            Err(SchemaError::TypeAlreadyRegistered("Email".to_string()))
        );
        assert_eq!(
            registry.get("money"),
            Err(SchemaError::UnknownType("money".to_string()))
        );
    }
}
