//! Column definitions

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::platform::Platform;
use crate::schema::identifier::Identifier;
use crate::schema::types::Type;

/// Platform option holding a column or table character set
pub const CHARSET: &str = "charset";
/// Platform option holding a column or table collation
pub const COLLATION: &str = "collation";

/// Default value of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Bool(bool),
    Integer(i64),
    /// Non-integer numeric literal, kept verbatim
    Number(String),
    String(String),
    CurrentTimestamp,
    CurrentDate,
    CurrentTime,
    /// Raw SQL expression emitted as-is
    Expression(String),
}

impl DefaultValue {
    /// Build a default from a loosely typed option value
    pub fn from_json(value: &Value) -> Result<Option<Self>, SchemaError> {
        let default = match value {
            Value::Null => return Ok(None),
            Value::Bool(flag) => DefaultValue::Bool(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(int) => DefaultValue::Integer(int),
                None => DefaultValue::Number(number.to_string()),
            },
            Value::String(text) => match text.to_uppercase().as_str() {
                "CURRENT_TIMESTAMP" => DefaultValue::CurrentTimestamp,
                "CURRENT_DATE" => DefaultValue::CurrentDate,
                "CURRENT_TIME" => DefaultValue::CurrentTime,
                _ => DefaultValue::String(text.clone()),
            },
            Value::Object(map) => match map.get("expression").and_then(Value::as_str) {
                Some(expression) => DefaultValue::Expression(expression.to_string()),
                None => {
                    return Err(SchemaError::InvalidColumnOption {
                        option: "default".to_string(),
                        reason: "objects must carry an \"expression\" string".to_string(),
                    })
                }
            },
            Value::Array(_) => {
                return Err(SchemaError::InvalidColumnOption {
                    option: "default".to_string(),
                    reason: "arrays are not valid defaults".to_string(),
                })
            }
        };
        Ok(Some(default))
    }

    /// Normalized textual form used for loose comparison
    fn loose_form(&self) -> String {
        match self {
            DefaultValue::Bool(true) => "1".to_string(),
            DefaultValue::Bool(false) => "0".to_string(),
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Number(value) => value.clone(),
            DefaultValue::String(value) => match value.as_str() {
                "true" => "1".to_string(),
                "false" => "0".to_string(),
                _ => value.clone(),
            },
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
            DefaultValue::CurrentDate => "CURRENT_DATE".to_string(),
            DefaultValue::CurrentTime => "CURRENT_TIME".to_string(),
            DefaultValue::Expression(value) => value.clone(),
        }
    }

    /// Equality that treats `1`, `"1"` and `true` alike
    pub fn loosely_equals(&self, other: &DefaultValue) -> bool {
        self.loose_form() == other.loose_form()
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.loose_form())
    }
}

/// Represents a table column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    name: Identifier,
    pub column_type: Type,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub fixed: bool,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub autoincrement: bool,
    pub comment: Option<String>,
    pub values: Vec<String>,
    pub platform_options: IndexMap<String, Value>,
}

impl Column {
    /// Create a new column with the given name and type
    pub fn new(name: &str, column_type: Type) -> Self {
        Self {
            name: Identifier::new(name),
            column_type,
            length: None,
            precision: None,
            scale: None,
            unsigned: false,
            fixed: false,
            nullable: false,
            default: None,
            autoincrement: false,
            comment: None,
            values: Vec::new(),
            platform_options: IndexMap::new(),
        }
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

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set a default value for the column
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn values<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.values = values.iter().map(|v| v.as_ref().to_string()).collect();
        self
    }

    pub fn charset(self, charset: &str) -> Self {
        self.platform_option(CHARSET, Value::String(charset.to_string()))
    }

    pub fn collation(self, collation: &str) -> Self {
        self.platform_option(COLLATION, Value::String(collation.to_string()))
    }

    pub fn platform_option(mut self, key: &str, value: Value) -> Self {
        self.platform_options.insert(key.to_string(), value);
        self
    }

    pub fn get_platform_option(&self, key: &str) -> Option<&Value> {
        self.platform_options.get(key)
    }

    /// String-valued platform option
    pub fn platform_option_str(&self, key: &str) -> Option<&str> {
        self.platform_options.get(key).and_then(Value::as_str)
    }

    /// Boolean platform option, absent counts as false
    pub fn platform_flag(&self, key: &str) -> bool {
        self.platform_options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Apply a bag of options.
    ///
    /// Either every option is applied or, on the first unknown or
    /// malformed option, none is.
    pub fn set_options(&mut self, options: &IndexMap<String, Value>) -> Result<(), SchemaError> {
        let mut updated = self.clone();
        for (key, value) in options {
            updated.apply_option(key, value)?;
        }
        *self = updated;
        Ok(())
    }

    fn apply_option(&mut self, key: &str, value: &Value) -> Result<(), SchemaError> {
        match key {
            "length" => self.length = option_u32(key, value)?,
            "precision" => self.precision = option_u32(key, value)?,
            "scale" => self.scale = option_u32(key, value)?,
            "unsigned" => self.unsigned = option_bool(key, value)?,
            "fixed" => self.fixed = option_bool(key, value)?,
            "nullable" => self.nullable = option_bool(key, value)?,
            "notnull" => self.nullable = !option_bool(key, value)?,
            "autoincrement" => self.autoincrement = option_bool(key, value)?,
            "default" => self.default = DefaultValue::from_json(value)?,
            "comment" => {
                self.comment = match value {
                    Value::Null => None,
                    Value::String(comment) => Some(comment.clone()),
                    _ => return Err(invalid_option(key, "expected a string")),
                }
            }
            "values" => {
                self.values = value
                    .as_array()
                    .ok_or_else(|| invalid_option(key, "expected an array of strings"))?
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid_option(key, "expected an array of strings"))
                    })
                    .collect::<Result<_, _>>()?;
            }
            CHARSET | COLLATION => {
                self.platform_options.insert(key.to_string(), value.clone());
            }
            "platform_options" => {
                let map = value
                    .as_object()
                    .ok_or_else(|| invalid_option(key, "expected a table of options"))?;
                for (option, option_value) in map {
                    self.platform_options
                        .insert(option.clone(), option_value.clone());
                }
            }
            _ => return Err(SchemaError::UnknownColumnOption(key.to_string())),
        }
        Ok(())
    }
}

fn invalid_option(option: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidColumnOption {
        option: option.to_string(),
        reason: reason.to_string(),
    }
}

fn option_bool(option: &str, value: &Value) -> Result<bool, SchemaError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_option(option, "expected a boolean"))
}

fn option_u32(option: &str, value: &Value) -> Result<Option<u32>, SchemaError> {
    match value {
        Value::Null => Ok(None),
        _ => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| invalid_option(option, "expected a non-negative integer")),
    }
}
