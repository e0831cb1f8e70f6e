//! SQL dialects
//!
//! [`Platform`] carries the shared rendering logic as default methods;
//! each dialect overrides only what differs.

pub mod keywords;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::builder::dependency::order_tables;
use crate::error::{Error, InvalidColumnType, Result};
use crate::schema::column::{Column, DefaultValue};
use crate::schema::diff::TableDiff;
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::identifier::Identifier;
use crate::schema::index::Index;
use crate::schema::sequence::Sequence;
use crate::schema::table::Table;
use crate::schema::types::Type;
use crate::schema::unique_constraint::UniqueConstraint;

pub use keywords::KeywordList;
pub use mysql::{MySqlFeatures, MySqlPlatform};
pub use postgres::PostgresPlatform;
pub use sqlite::SqlitePlatform;

/// Length used for variable-length strings declared without one
pub const DEFAULT_STRING_LENGTH: u32 = 255;
/// Precision used for decimals declared without one
pub const DEFAULT_DECIMAL_PRECISION: u32 = 10;

/// Identifier quoting characters of a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteStyle {
    pub open: char,
    pub close: char,
}

impl QuoteStyle {
    pub const DOUBLE_QUOTE: QuoteStyle = QuoteStyle {
        open: '"',
        close: '"',
    };
    pub const BACKTICK: QuoteStyle = QuoteStyle {
        open: '`',
        close: '`',
    };

    /// Wrap a single part, doubling the closing character inside it
    pub fn quote(&self, part: &str) -> String {
        let escaped = part.replace(self.close, &format!("{}{}", self.close, self.close));
        format!("{}{}{}", self.open, escaped, self.close)
    }
}

/// Renders schema objects as dialect-specific DDL
pub trait Platform: Send + Sync {
    /// Dialect name used in error messages and logs
    fn name(&self) -> &'static str;

    fn quote_style(&self) -> QuoteStyle;

    fn keywords(&self) -> &KeywordList;

    fn quote_single_identifier(&self, part: &str) -> String {
        self.quote_style().quote(part)
    }

    /// Quote every dot-separated part of `name`
    fn quote_identifier(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_single_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn max_identifier_length(&self) -> usize {
        63
    }

    // ------------------------------------------------------------ capabilities

    fn supports_schemas(&self) -> bool {
        false
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn supports_identity_columns(&self) -> bool {
        false
    }

    fn supports_inline_column_comments(&self) -> bool {
        false
    }

    fn supports_comment_on_statement(&self) -> bool {
        false
    }

    /// Whether foreign keys can be added and dropped with ALTER TABLE
    fn supports_foreign_key_alter(&self) -> bool {
        true
    }

    fn supports_rename_index(&self) -> bool {
        true
    }

    fn supports_partial_indexes(&self) -> bool {
        false
    }

    /// Whether foreign keys of this particular table are enforced
    fn table_supports_foreign_keys(&self, _table: &Table) -> bool {
        true
    }

    // ------------------------------------------------------------------ types

    fn convert_boolean(&self, value: bool) -> String {
        let literal = if value { "1" } else { "0" };
        literal.to_string()
    }

    /// Native type for a column, dispatched on its logical type
    fn type_declaration_sql(&self, column: &Column) -> Result<String> {
        match column.column_type {
            Type::SmallInt => self.smallint_type_declaration_sql(column),
            Type::Integer => self.integer_type_declaration_sql(column),
            Type::BigInt => self.bigint_type_declaration_sql(column),
            Type::Decimal => self.decimal_type_declaration_sql(column),
            Type::Float => self.float_type_declaration_sql(column),
            Type::SmallFloat => self.small_float_type_declaration_sql(column),
            Type::String => self.string_type_declaration_sql(column),
            Type::AsciiString => self.ascii_string_type_declaration_sql(column),
            Type::Text => self.text_type_declaration_sql(column),
            Type::Guid => self.guid_type_declaration_sql(column),
            Type::Binary => self.binary_type_declaration_sql(column),
            Type::Blob => self.blob_type_declaration_sql(column),
            Type::Boolean => self.boolean_type_declaration_sql(column),
            Type::Date => self.date_type_declaration_sql(column),
            Type::DateTime => self.datetime_type_declaration_sql(column),
            Type::DateTimeTz => self.datetimetz_type_declaration_sql(column),
            Type::Time => self.time_type_declaration_sql(column),
            Type::Json => self.json_type_declaration_sql(column),
            Type::Enum => self.enum_type_declaration_sql(column),
        }
    }

    fn integer_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("INT".to_string())
    }

    fn bigint_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BIGINT".to_string())
    }

    fn smallint_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("SMALLINT".to_string())
    }

    fn boolean_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BOOLEAN".to_string())
    }

    fn decimal_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "NUMERIC({}, {})",
            column.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
            column.scale.unwrap_or(0)
        ))
    }

    fn float_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("DOUBLE PRECISION".to_string())
    }

    fn small_float_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("REAL".to_string())
    }

    fn string_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(DEFAULT_STRING_LENGTH);
        Ok(if column.fixed {
            format!("CHAR({})", length)
        } else {
            format!("VARCHAR({})", length)
        })
    }

    fn ascii_string_type_declaration_sql(&self, column: &Column) -> Result<String> {
        self.string_type_declaration_sql(column)
    }

    fn text_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TEXT".to_string())
    }

    fn guid_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("CHAR(36)".to_string())
    }

    fn binary_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let length = column.length.unwrap_or(DEFAULT_STRING_LENGTH);
        Ok(if column.fixed {
            format!("BINARY({})", length)
        } else {
            format!("VARBINARY({})", length)
        })
    }

    fn blob_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BLOB".to_string())
    }

    fn date_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("DATE".to_string())
    }

    fn datetime_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("DATETIME".to_string())
    }

    fn datetimetz_type_declaration_sql(&self, column: &Column) -> Result<String> {
        self.datetime_type_declaration_sql(column)
    }

    fn time_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TIME".to_string())
    }

    fn json_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("JSON".to_string())
    }

    /// Enumerations fall back to a string wide enough for the longest value
    fn enum_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let longest = column
            .values
            .iter()
            .map(|value| value.chars().count())
            .max()
            .ok_or_else(|| values_required(self.name(), column))?;
        Ok(format!("VARCHAR({})", longest))
    }

    // ---------------------------------------------------------------- columns

    fn current_timestamp_sql(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn current_date_sql(&self) -> &'static str {
        "CURRENT_DATE"
    }

    fn current_time_sql(&self) -> &'static str {
        "CURRENT_TIME"
    }

    /// ` DEFAULT ...` clause, empty for NOT NULL columns without a default.
    /// Nullable columns without a default get `DEFAULT NULL`.
    fn default_value_declaration_sql(&self, column: &Column) -> String {
        default_value_sql(self.as_dyn(), column)
    }

    /// Inline character set clause
    fn column_charset_declaration_sql(&self, _charset: &str) -> String {
        String::new()
    }

    /// Inline collation clause
    fn column_collation_declaration_sql(&self, collation: &str) -> String {
        format!(" COLLATE {}", self.quote_single_identifier(collation))
    }

    fn inline_column_comment_sql(&self, comment: &str) -> String {
        format!(" COMMENT {}", self.quote_string_literal(comment))
    }

    /// Full column declaration as used in CREATE TABLE and ALTER TABLE
    fn column_declaration_sql(&self, column: &Column) -> Result<String> {
        let mut declaration = self.type_declaration_sql(column)?;

        if let Some(charset) = column.platform_option_str(crate::schema::column::CHARSET) {
            declaration.push_str(&self.column_charset_declaration_sql(charset));
        }
        declaration.push_str(&self.default_value_declaration_sql(column));
        if !column.nullable {
            declaration.push_str(" NOT NULL");
        }
        if let Some(collation) = column.platform_option_str(crate::schema::column::COLLATION) {
            declaration.push_str(&self.column_collation_declaration_sql(collation));
        }
        if self.supports_inline_column_comments() {
            if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
                declaration.push_str(&self.inline_column_comment_sql(comment));
            }
        }

        Ok(format!("{} {}", column.quoted_name(self.as_dyn()), declaration))
    }

    fn column_declaration_list_sql(&self, columns: &[&Column]) -> Result<String> {
        Ok(columns
            .iter()
            .map(|column| self.column_declaration_sql(column))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    /// Upcast used by default methods that need a `&dyn Platform`
    fn as_dyn(&self) -> &dyn Platform;

    // ----------------------------------------------------------------- tables

    fn create_table_sql(&self, table: &Table) -> Result<Vec<String>> {
        self.build_create_table_sql(table, true)
    }

    fn create_table_without_foreign_keys_sql(&self, table: &Table) -> Result<Vec<String>> {
        self.build_create_table_sql(table, false)
    }

    /// CREATE TABLE with constraints inline, followed by index, comment and
    /// optionally foreign key statements
    fn build_create_table_sql(&self, table: &Table, with_foreign_keys: bool) -> Result<Vec<String>> {
        let platform = self.as_dyn();
        let columns: Vec<&Column> = table.columns().collect();
        let mut body = vec![self.column_declaration_list_sql(&columns)?];

        for constraint in table.unique_constraints() {
            body.push(self.unique_constraint_declaration_sql(constraint));
        }
        if let Some(primary) = table.primary_key() {
            body.push(format!(
                "PRIMARY KEY ({})",
                primary.quoted_columns(platform).join(", ")
            ));
        }

        let mut sql = vec![format!(
            "CREATE TABLE {} ({})",
            table.quoted_name(platform),
            body.join(", ")
        )];

        for index in table.indexes().filter(|index| !index.is_primary()) {
            sql.push(self.create_index_sql(index, table.identifier())?);
        }

        if self.supports_comment_on_statement() {
            if let Some(comment) = table.option("comment") {
                sql.push(self.comment_on_table_sql(table.identifier(), Some(comment)));
            }
            for column in table.columns() {
                if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
                    sql.push(self.comment_on_column_sql(table.identifier(), column, Some(comment)));
                }
            }
        }

        if with_foreign_keys && self.table_supports_foreign_keys(table) {
            for foreign_key in table.foreign_keys() {
                sql.push(self.create_foreign_key_sql(foreign_key, table.identifier()));
            }
        }

        Ok(sql)
    }

    /// Create several tables: referenced tables first, foreign keys last
    fn create_tables_sql(&self, tables: &[&Table]) -> Result<Vec<String>> {
        let ordered = order_tables(tables)?;
        let mut sql = Vec::new();

        if !self.supports_foreign_key_alter() {
            for table in &ordered {
                sql.extend(self.create_table_sql(table)?);
            }
            return Ok(sql);
        }

        for table in &ordered {
            sql.extend(self.create_table_without_foreign_keys_sql(table)?);
        }
        for table in &ordered {
            if !self.table_supports_foreign_keys(table) {
                continue;
            }
            for foreign_key in table.foreign_keys() {
                sql.push(self.create_foreign_key_sql(foreign_key, table.identifier()));
            }
        }
        Ok(sql)
    }

    fn drop_table_sql(&self, table: &Identifier) -> String {
        format!("DROP TABLE {}", table.quoted_name(self.as_dyn()))
    }

    /// Drop several tables: their foreign keys first, then dependents before
    /// the tables they reference
    fn drop_tables_sql(&self, tables: &[&Table]) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        if self.supports_foreign_key_alter() {
            for table in tables {
                if !self.table_supports_foreign_keys(table) {
                    continue;
                }
                for foreign_key in table.foreign_keys() {
                    sql.push(self.drop_foreign_key_sql(foreign_key, table.identifier()));
                }
            }
        }

        let mut ordered = order_tables(tables)?;
        ordered.reverse();
        for table in ordered {
            sql.push(self.drop_table_sql(table.identifier()));
        }
        Ok(sql)
    }

    /// Clauses changing columns and options; indexes and keys are handled by
    /// [`Platform::alter_table_sql`] around these
    fn alter_table_columns_sql(&self, diff: &TableDiff) -> Result<Vec<String>>;

    /// Statements that must run before the column changes
    fn pre_alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        Ok(pre_alter_sql(self.as_dyn(), diff))
    }

    /// Statements that must run after the column changes
    fn post_alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let table = diff.new_table.identifier();
        let mut sql = Vec::new();

        for (old_name, index) in &diff.renamed_indexes {
            sql.extend(self.rename_index_sql(old_name, index, table)?);
        }

        for index in diff.added_indexes.iter().chain(diff.changed_indexes.iter()) {
            sql.push(self.create_index_sql(index, table)?);
        }

        for constraint in &diff.added_unique_constraints {
            sql.push(self.create_unique_constraint_sql(constraint, table));
        }

        if self.supports_foreign_key_alter() && self.table_supports_foreign_keys(&diff.new_table) {
            for foreign_key in diff
                .added_foreign_keys
                .iter()
                .chain(diff.changed_foreign_keys.iter())
            {
                sql.push(self.create_foreign_key_sql(foreign_key, table));
            }
        }

        Ok(sql)
    }

    fn alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let mut sql = self.pre_alter_table_sql(diff)?;
        sql.extend(self.alter_table_columns_sql(diff)?);
        sql.extend(self.post_alter_table_sql(diff)?);
        Ok(sql)
    }

    // ---------------------------------------------------------------- indexes

    /// Extra keyword between CREATE and INDEX, such as `UNIQUE`
    fn index_kind_sql(&self, index: &Index) -> &'static str {
        if index.is_unique() {
            "UNIQUE "
        } else {
            ""
        }
    }

    fn create_index_sql(&self, index: &Index, table: &Identifier) -> Result<String> {
        let platform = self.as_dyn();
        if index.is_primary() {
            return Ok(self.create_primary_key_sql(index, table));
        }

        let mut sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            self.index_kind_sql(index),
            index.quoted_name(platform),
            table.quoted_name(platform),
            index.quoted_columns(platform).join(", ")
        );
        if let Some(predicate) = index.where_clause() {
            if !self.supports_partial_indexes() {
                return Err(Error::not_supported(self.name(), "partial indexes"));
            }
            sql.push_str(&format!(" WHERE {}", predicate));
        }
        Ok(sql)
    }

    fn drop_index_sql(&self, index: &Index, _table: &Identifier) -> String {
        format!("DROP INDEX {}", index.quoted_name(self.as_dyn()))
    }

    fn rename_index_sql(
        &self,
        old_name: &str,
        index: &Index,
        table: &Identifier,
    ) -> Result<Vec<String>> {
        let platform = self.as_dyn();
        if !self.supports_rename_index() {
            let old = Index::new(old_name, &index.columns(), index.is_unique(), false)?;
            return Ok(vec![
                self.drop_index_sql(&old, table),
                self.create_index_sql(index, table)?,
            ]);
        }
        Ok(vec![format!(
            "ALTER INDEX {} RENAME TO {}",
            Identifier::new(old_name).quoted_name(platform),
            index.quoted_name(platform)
        )])
    }

    fn create_primary_key_sql(&self, index: &Index, table: &Identifier) -> String {
        let platform = self.as_dyn();
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({})",
            table.quoted_name(platform),
            index.quoted_columns(platform).join(", ")
        )
    }

    fn drop_primary_key_sql(&self, index: &Index, table: &Identifier) -> String {
        let platform = self.as_dyn();
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            table.quoted_name(platform),
            index.quoted_name(platform)
        )
    }

    // ------------------------------------------------------------ constraints

    /// Trailing ON UPDATE / ON DELETE and dialect options
    fn advanced_foreign_key_options_sql(&self, foreign_key: &ForeignKeyConstraint) -> String {
        let mut sql = String::new();
        if let Some(action) = foreign_key.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        sql
    }

    fn foreign_key_declaration_sql(&self, foreign_key: &ForeignKeyConstraint) -> String {
        let platform = self.as_dyn();
        let mut sql = String::new();
        if foreign_key.has_name() {
            sql.push_str(&format!("CONSTRAINT {} ", foreign_key.quoted_name(platform)));
        }
        sql.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            foreign_key.quoted_local_columns(platform).join(", "),
            foreign_key.quoted_foreign_table_name(platform),
            foreign_key.quoted_foreign_columns(platform).join(", ")
        ));
        sql.push_str(&self.advanced_foreign_key_options_sql(foreign_key));
        sql
    }

    fn create_foreign_key_sql(&self, foreign_key: &ForeignKeyConstraint, table: &Identifier) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            table.quoted_name(self.as_dyn()),
            self.foreign_key_declaration_sql(foreign_key)
        )
    }

    fn drop_foreign_key_sql(&self, foreign_key: &ForeignKeyConstraint, table: &Identifier) -> String {
        let platform = self.as_dyn();
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            table.quoted_name(platform),
            foreign_key.quoted_name(platform)
        )
    }

    fn unique_constraint_declaration_sql(&self, constraint: &UniqueConstraint) -> String {
        let platform = self.as_dyn();
        let columns = constraint.quoted_columns(platform).join(", ");
        if constraint.has_name() {
            format!(
                "CONSTRAINT {} UNIQUE ({})",
                constraint.quoted_name(platform),
                columns
            )
        } else {
            format!("UNIQUE ({})", columns)
        }
    }

    fn create_unique_constraint_sql(&self, constraint: &UniqueConstraint, table: &Identifier) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            table.quoted_name(self.as_dyn()),
            self.unique_constraint_declaration_sql(constraint)
        )
    }

    fn drop_unique_constraint_sql(&self, constraint: &UniqueConstraint, table: &Identifier) -> String {
        let platform = self.as_dyn();
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            table.quoted_name(platform),
            constraint.quoted_name(platform)
        )
    }

    // -------------------------------------------------- sequences, namespaces

    fn create_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        if !self.supports_sequences() {
            return Err(Error::not_supported(self.name(), "sequences"));
        }
        Ok(format!(
            "CREATE SEQUENCE {} INCREMENT BY {} MINVALUE {} START {}{}",
            sequence.quoted_name(self.as_dyn()),
            sequence.allocation_size,
            sequence.initial_value,
            sequence.initial_value,
            sequence_cache_sql(sequence)
        ))
    }

    fn alter_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        if !self.supports_sequences() {
            return Err(Error::not_supported(self.name(), "sequences"));
        }
        Ok(format!(
            "ALTER SEQUENCE {} INCREMENT BY {}{}",
            sequence.quoted_name(self.as_dyn()),
            sequence.allocation_size,
            sequence_cache_sql(sequence)
        ))
    }

    fn drop_sequence_sql(&self, sequence: &Sequence) -> Result<String> {
        if !self.supports_sequences() {
            return Err(Error::not_supported(self.name(), "sequences"));
        }
        Ok(format!("DROP SEQUENCE {}", sequence.quoted_name(self.as_dyn())))
    }

    fn create_namespace_sql(&self, name: &str) -> Result<String> {
        if !self.supports_schemas() {
            return Err(Error::not_supported(self.name(), "schemas"));
        }
        Ok(format!(
            "CREATE SCHEMA {}",
            Identifier::new(name).quoted_name(self.as_dyn())
        ))
    }

    fn drop_namespace_sql(&self, name: &str) -> Result<String> {
        if !self.supports_schemas() {
            return Err(Error::not_supported(self.name(), "schemas"));
        }
        Ok(format!(
            "DROP SCHEMA {}",
            Identifier::new(name).quoted_name(self.as_dyn())
        ))
    }

    // --------------------------------------------------------------- comments

    fn comment_literal(&self, comment: Option<&str>) -> String {
        match comment.filter(|c| !c.is_empty()) {
            Some(comment) => self.quote_string_literal(comment),
            None => "NULL".to_string(),
        }
    }

    fn comment_on_table_sql(&self, table: &Identifier, comment: Option<&str>) -> String {
        format!(
            "COMMENT ON TABLE {} IS {}",
            table.quoted_name(self.as_dyn()),
            self.comment_literal(comment)
        )
    }

    fn comment_on_column_sql(&self, table: &Identifier, column: &Column, comment: Option<&str>) -> String {
        let platform = self.as_dyn();
        format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            table.quoted_name(platform),
            column.quoted_name(platform),
            self.comment_literal(comment)
        )
    }
}

pub(crate) fn default_value_sql(platform: &dyn Platform, column: &Column) -> String {
    let default = match &column.default {
        None if column.nullable => return " DEFAULT NULL".to_string(),
        None => return String::new(),
        Some(default) => default,
    };

    let literal = match default {
        DefaultValue::CurrentTimestamp => platform.current_timestamp_sql().to_string(),
        DefaultValue::CurrentDate => platform.current_date_sql().to_string(),
        DefaultValue::CurrentTime => platform.current_time_sql().to_string(),
        DefaultValue::Expression(expression) => expression.clone(),
        DefaultValue::Bool(value) if column.column_type == Type::Boolean => {
            platform.convert_boolean(*value)
        }
        DefaultValue::Integer(value) if is_numeric(column.column_type) => value.to_string(),
        DefaultValue::Number(value) if is_numeric(column.column_type) => value.clone(),
        DefaultValue::String(value) if column.column_type == Type::Boolean => {
            platform.convert_boolean(value == "1" || value.eq_ignore_ascii_case("true"))
        }
        other => platform.quote_string_literal(&other.to_string()),
    };
    format!(" DEFAULT {}", literal)
}

/// Foreign key, unique constraint and index drops preceding an ALTER TABLE
pub(crate) fn pre_alter_sql(platform: &dyn Platform, diff: &TableDiff) -> Vec<String> {
    let table = diff.old_table.identifier();
    let mut sql = Vec::new();

    if platform.supports_foreign_key_alter() && platform.table_supports_foreign_keys(&diff.old_table) {
        for foreign_key in diff
            .dropped_foreign_keys
            .iter()
            .chain(diff.changed_foreign_keys.iter())
        {
            sql.push(platform.drop_foreign_key_sql(foreign_key, table));
        }
    }

    for constraint in &diff.dropped_unique_constraints {
        sql.push(platform.drop_unique_constraint_sql(constraint, table));
    }

    for index in diff.dropped_indexes.iter().chain(diff.changed_indexes.iter()) {
        if index.is_primary() {
            let old = diff.old_table.primary_key().unwrap_or(index);
            sql.push(platform.drop_primary_key_sql(old, table));
        } else {
            sql.push(platform.drop_index_sql(index, table));
        }
    }

    sql
}

fn sequence_cache_sql(sequence: &Sequence) -> String {
    match sequence.cache {
        Some(cache) if cache > 1 => format!(" CACHE {}", cache),
        Some(_) => " NOCACHE".to_string(),
        None => String::new(),
    }
}

fn is_numeric(column_type: Type) -> bool {
    column_type.is_integer()
        || matches!(
            column_type,
            Type::Decimal | Type::Float | Type::SmallFloat | Type::Boolean
        )
}

pub(crate) fn length_required(platform: &'static str, column: &Column) -> Error {
    InvalidColumnType::LengthRequired {
        platform,
        column: column.name().to_string(),
    }
    .into()
}

pub(crate) fn precision_required(platform: &'static str, column: &Column) -> Error {
    InvalidColumnType::PrecisionRequired {
        platform,
        column: column.name().to_string(),
    }
    .into()
}

pub(crate) fn scale_required(platform: &'static str, column: &Column) -> Error {
    InvalidColumnType::ScaleRequired {
        platform,
        column: column.name().to_string(),
    }
    .into()
}

pub(crate) fn values_required(platform: &'static str, column: &Column) -> Error {
    InvalidColumnType::ValuesRequired {
        platform,
        column: column.name().to_string(),
    }
    .into()
}

/// Build a platform from its configured dialect name
pub fn platform_for(dialect: &str) -> Result<Box<dyn Platform>> {
    match dialect.to_lowercase().as_str() {
        "mysql" | "mysql80" => Ok(Box::new(MySqlPlatform::mysql80())),
        "mysql57" => Ok(Box::new(MySqlPlatform::mysql57())),
        "mariadb" => Ok(Box::new(MySqlPlatform::mariadb())),
        "postgres" | "postgresql" => Ok(Box::new(PostgresPlatform::new())),
        "sqlite" => Ok(Box::new(SqlitePlatform::new())),
        other => Err(Error::ConfigError(format!("Unknown platform dialect: {}", other))),
    }
}
