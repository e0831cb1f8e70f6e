//! Sequences

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::identifier::Identifier;

/// Represents a database sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    name: Identifier,
    pub allocation_size: i64,
    pub initial_value: i64,
    pub cache: Option<u32>,
}

impl Sequence {
    pub fn new(name: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            name: Identifier::parse(name)?,
            allocation_size: 1,
            initial_value: 1,
            cache: None,
        })
    }

    pub fn allocation_size(mut self, allocation_size: i64) -> Self {
        self.allocation_size = allocation_size;
        self
    }

    pub fn initial_value(mut self, initial_value: i64) -> Self {
        self.initial_value = initial_value;
        self
    }

    pub fn cache(mut self, cache: u32) -> Self {
        self.cache = Some(cache);
        self
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

    /// Whether `other` differs in any attribute the database stores
    pub fn differs_from(&self, other: &Sequence) -> bool {
        self.allocation_size != other.allocation_size
            || self.initial_value != other.initial_value
            || self.cache != other.cache
    }
}
