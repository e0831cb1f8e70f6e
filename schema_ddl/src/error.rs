//! Error types for schema_ddl

use thiserror::Error;

/// Result type for schema_ddl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_ddl
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid column type: {0}")]
    InvalidColumnType(#[from] InvalidColumnType),

    #[error("Not supported by {platform}: {operation}")]
    NotSupported {
        platform: &'static str,
        operation: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub(crate) fn not_supported(platform: &'static str, operation: impl Into<String>) -> Self {
        Error::NotSupported {
            platform,
            operation: operation.into(),
        }
    }
}

/// Structural errors raised by the schema object model.
///
/// These are raised immediately by the mutating method that detected them and
/// the object being mutated is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table \"{0}\" already exists")]
    TableAlreadyExists(String),

    #[error("table \"{0}\" does not exist")]
    TableDoesNotExist(String),

    #[error("column \"{column}\" already exists on table \"{table}\"")]
    ColumnAlreadyExists { table: String, column: String },

    #[error("column \"{column}\" does not exist on table \"{table}\"")]
    ColumnDoesNotExist { table: String, column: String },

    #[error("column \"{column}\" on table \"{table}\" is still used by \"{user}\"")]
    ColumnInUse {
        table: String,
        column: String,
        user: String,
    },

    #[error("index \"{index}\" already exists on table \"{table}\"")]
    IndexAlreadyExists { table: String, index: String },

    #[error("index \"{index}\" does not exist on table \"{table}\"")]
    IndexDoesNotExist { table: String, index: String },

    #[error("table \"{0}\" already has a primary key")]
    PrimaryKeyAlreadyExists(String),

    #[error("table \"{0}\" has no primary key")]
    PrimaryKeyDoesNotExist(String),

    #[error("foreign key \"{constraint}\" does not exist on table \"{table}\"")]
    ForeignKeyDoesNotExist { table: String, constraint: String },

    #[error("foreign key \"{constraint}\" already exists on table \"{table}\"")]
    ForeignKeyAlreadyExists { table: String, constraint: String },

    #[error(
        "foreign key on table \"{table}\" has {local} local column(s) but {foreign} referenced column(s)"
    )]
    ForeignKeyColumnCountMismatch {
        table: String,
        local: usize,
        foreign: usize,
    },

    #[error("unique constraint \"{constraint}\" already exists on table \"{table}\"")]
    UniqueConstraintAlreadyExists { table: String, constraint: String },

    #[error("unique constraint \"{constraint}\" does not exist on table \"{table}\"")]
    UniqueConstraintDoesNotExist { table: String, constraint: String },

    #[error("sequence \"{0}\" already exists")]
    SequenceAlreadyExists(String),

    #[error("sequence \"{0}\" does not exist")]
    SequenceDoesNotExist(String),

    #[error("namespace \"{0}\" already exists")]
    NamespaceAlreadyExists(String),

    #[error("name \"{0}\" is already used by another table or sequence")]
    NameAlreadyInUse(String),

    #[error("invalid identifier \"{0}\"")]
    InvalidIdentifier(String),

    #[error("index \"{0}\" must span at least one column")]
    EmptyIndexColumns(String),

    #[error("contradicting options on \"{name}\": {reason}")]
    ContradictingOptions { name: String, reason: String },

    #[error("unknown column option \"{0}\"")]
    UnknownColumnOption(String),

    #[error("invalid value for column option \"{option}\": {reason}")]
    InvalidColumnOption { option: String, reason: String },

    #[error("dependency node \"{0}\" was never registered")]
    UnknownDependencyNode(String),

    #[error("unknown type \"{0}\"")]
    UnknownType(String),

    #[error("type \"{0}\" is already registered")]
    TypeAlreadyRegistered(String),
}

/// Raised by a platform when a column cannot be declared without an
/// attribute the dialect requires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidColumnType {
    #[error("{platform} requires a length for column \"{column}\"")]
    LengthRequired {
        platform: &'static str,
        column: String,
    },

    #[error("{platform} requires a precision for column \"{column}\"")]
    PrecisionRequired {
        platform: &'static str,
        column: String,
    },

    #[error("{platform} requires a scale for column \"{column}\"")]
    ScaleRequired {
        platform: &'static str,
        column: String,
    },

    #[error("{platform} requires enumerated values for column \"{column}\"")]
    ValuesRequired {
        platform: &'static str,
        column: String,
    },
}

/// Convert Serde JSON errors to schema_ddl errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_ddl errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}
