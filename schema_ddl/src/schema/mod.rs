//! Schema module for schema_ddl
//!
//! The in-memory object model: identifiers, types, columns, indexes,
//! constraints, sequences, tables, whole schemas and their diffs.

pub mod column;
pub mod database;
pub mod definition;
pub mod diff;
pub mod foreign_key;
pub mod identifier;
pub mod index;
pub mod sequence;
pub mod table;
pub mod types;
pub mod unique_constraint;

// Re-export key types
pub use column::{Column, DefaultValue};
pub use database::{Schema, SchemaConfig};
pub use definition::{load_definition_file, SchemaDefinition};
pub use diff::{ColumnDiff, ColumnProperty, OptionChange, SchemaDiff, TableDiff};
pub use foreign_key::{ForeignKeyConstraint, ReferentialAction};
pub use identifier::Identifier;
pub use index::Index;
pub use sequence::Sequence;
pub use table::Table;
pub use types::{Type, TypeRegistry};
pub use unique_constraint::UniqueConstraint;
