//! MySQL and MariaDB

use crate::error::Result;
use crate::platform::{
    default_value_sql, length_required, pre_alter_sql, values_required, KeywordList, Platform,
    QuoteStyle,
};
use crate::schema::column::Column;
use crate::schema::diff::TableDiff;
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::identifier::Identifier;
use crate::schema::index::Index;
use crate::schema::table::Table;
use crate::schema::types::Type;
use crate::schema::unique_constraint::UniqueConstraint;

/// Character set used for tables that do not name one
pub const DEFAULT_CHARSET: &str = "utf8mb4";
/// Collation used for tables that name neither charset nor collation
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_ci";
/// Storage engine used for tables that do not name one
pub const DEFAULT_ENGINE: &str = "InnoDB";

const TINYTEXT_LENGTH: u32 = 255;
const TEXT_LENGTH: u32 = 65_535;
const MEDIUMTEXT_LENGTH: u32 = 16_777_215;

/// Capabilities that vary between MySQL-family servers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MySqlFeatures {
    /// `ALTER TABLE ... RENAME INDEX`
    pub rename_index: bool,
    /// `ALTER TABLE ... RENAME COLUMN`
    pub rename_column: bool,
    /// Defaults on TEXT and BLOB columns
    pub text_defaults: bool,
    pub sequences: bool,
}

/// MySQL-family dialect
#[derive(Debug, Clone)]
pub struct MySqlPlatform {
    name: &'static str,
    features: MySqlFeatures,
    keywords: KeywordList,
}

impl MySqlPlatform {
    pub fn new(name: &'static str, features: MySqlFeatures) -> Self {
        Self {
            name,
            features,
            keywords: KeywordList::mysql(),
        }
    }

    pub fn mysql57() -> Self {
        Self::new(
            "mysql57",
            MySqlFeatures {
                rename_index: true,
                rename_column: false,
                text_defaults: false,
                sequences: false,
            },
        )
    }

    pub fn mysql80() -> Self {
        Self::new(
            "mysql80",
            MySqlFeatures {
                rename_index: true,
                rename_column: true,
                text_defaults: false,
                sequences: false,
            },
        )
    }

    pub fn mariadb() -> Self {
        Self::new(
            "mariadb",
            MySqlFeatures {
                rename_index: true,
                rename_column: true,
                text_defaults: true,
                sequences: true,
            },
        )
    }

    pub fn features(&self) -> MySqlFeatures {
        self.features
    }

    fn integer_modifiers(column: &Column) -> String {
        let mut sql = String::new();
        if column.unsigned {
            sql.push_str(" UNSIGNED");
        }
        if column.autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    fn is_lob(column: &Column) -> bool {
        matches!(column.column_type, Type::Text | Type::Blob)
    }

    /// Inline index declaration for CREATE TABLE
    fn index_declaration_sql(&self, index: &Index) -> String {
        format!(
            "{}INDEX {} ({})",
            self.index_kind_sql(index),
            index.quoted_name(self),
            index.quoted_columns(self).join(", ")
        )
    }

    /// Trailing CREATE TABLE options.
    ///
    /// A table naming neither charset nor collation gets the defaults. When
    /// only one of them is named the server derives the other.
    fn table_options_sql(&self, table: &Table) -> String {
        if let Some(raw) = table.option("table_options") {
            return format!(" {}", raw);
        }

        let (charset, collation) = match (table.option("charset"), table.option("collation")) {
            (None, None) => (Some(DEFAULT_CHARSET), Some(DEFAULT_COLLATION)),
            named => named,
        };
        let engine = table.option("engine").unwrap_or(DEFAULT_ENGINE);

        let mut options = Vec::new();
        if let Some(charset) = charset {
            options.push(format!("DEFAULT CHARACTER SET {}", charset));
        }
        if let Some(collation) = collation {
            options.push(format!("COLLATE {}", self.quote_single_identifier(collation)));
        }
        options.push(format!("ENGINE = {}", engine));
        if let Some(increment) = table.option("auto_increment") {
            options.push(format!("AUTO_INCREMENT = {}", increment));
        }
        if let Some(comment) = table.option("comment") {
            options.push(format!("COMMENT {}", self.quote_string_literal(comment)));
        }
        if let Some(row_format) = table.option("row_format") {
            options.push(format!("ROW_FORMAT = {}", row_format));
        }
        format!(" {}", options.join(" "))
    }

    /// Table option changes as ALTER TABLE clauses
    fn option_change_clauses(&self, diff: &TableDiff) -> Vec<String> {
        diff.changed_options
            .iter()
            .filter_map(|change| {
                let value = change.new_value.as_deref();
                match change.key.as_str() {
                    "comment" => Some(format!(
                        "COMMENT = {}",
                        self.quote_string_literal(value.unwrap_or(""))
                    )),
                    "engine" => value.map(|engine| format!("ENGINE = {}", engine)),
                    "charset" => value.map(|charset| format!("DEFAULT CHARACTER SET {}", charset)),
                    "collation" => value.map(|collation| {
                        format!("COLLATE {}", self.quote_single_identifier(collation))
                    }),
                    "row_format" => value.map(|format| format!("ROW_FORMAT = {}", format)),
                    "auto_increment" => value.map(|increment| format!("AUTO_INCREMENT = {}", increment)),
                    _ => None,
                }
            })
            .collect()
    }

    /// MODIFY statements removing AUTO_INCREMENT from primary key columns
    /// whose primary key is about to be dropped
    fn strip_autoincrement_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let primary_dropped = diff
            .dropped_indexes
            .iter()
            .chain(diff.changed_indexes.iter())
            .any(Index::is_primary);
        let Some(primary) = diff.old_table.primary_key().filter(|_| primary_dropped) else {
            return Ok(Vec::new());
        };

        let mut sql = Vec::new();
        for name in primary.columns() {
            let Ok(column) = diff.old_table.column(name) else {
                continue;
            };
            if !column.autoincrement || !diff.new_table.has_column(name) {
                continue;
            }
            let mut stripped = column.clone();
            stripped.autoincrement = false;
            sql.push(format!(
                "ALTER TABLE {} MODIFY {}",
                diff.old_table.quoted_name(self),
                self.column_declaration_sql(&stripped)?
            ));
        }
        Ok(sql)
    }
}

impl Platform for MySqlPlatform {
    fn name(&self) -> &'static str {
        self.name
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::BACKTICK
    }

    fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    fn as_dyn(&self) -> &dyn Platform {
        self
    }

    fn max_identifier_length(&self) -> usize {
        64
    }

    fn supports_sequences(&self) -> bool {
        self.features.sequences
    }

    fn supports_inline_column_comments(&self) -> bool {
        true
    }

    fn supports_rename_index(&self) -> bool {
        self.features.rename_index
    }

    fn table_supports_foreign_keys(&self, table: &Table) -> bool {
        table
            .option("engine")
            .map(|engine| engine.eq_ignore_ascii_case(DEFAULT_ENGINE))
            .unwrap_or(true)
    }

    fn integer_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("INT{}", Self::integer_modifiers(column)))
    }

    fn bigint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("BIGINT{}", Self::integer_modifiers(column)))
    }

    fn smallint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("SMALLINT{}", Self::integer_modifiers(column)))
    }

    fn boolean_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TINYINT(1)".to_string())
    }

    fn small_float_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let unsigned = if column.unsigned { " UNSIGNED" } else { "" };
        Ok(format!("FLOAT{}", unsigned))
    }

    fn text_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(match column.length {
            Some(length) if length <= TINYTEXT_LENGTH => "TINYTEXT",
            Some(length) if length <= TEXT_LENGTH => "TEXT",
            Some(length) if length <= MEDIUMTEXT_LENGTH => "MEDIUMTEXT",
            _ => "LONGTEXT",
        }
        .to_string())
    }

    fn blob_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(match column.length {
            Some(length) if length <= TINYTEXT_LENGTH => "TINYBLOB",
            Some(length) if length <= TEXT_LENGTH => "BLOB",
            Some(length) if length <= MEDIUMTEXT_LENGTH => "MEDIUMBLOB",
            _ => "LONGBLOB",
        }
        .to_string())
    }

    fn binary_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let length = column
            .length
            .ok_or_else(|| length_required(self.name, column))?;
        Ok(if column.fixed {
            format!("BINARY({})", length)
        } else {
            format!("VARBINARY({})", length)
        })
    }

    fn datetime_type_declaration_sql(&self, column: &Column) -> Result<String> {
        if column.platform_flag("version") {
            Ok("TIMESTAMP".to_string())
        } else {
            Ok("DATETIME".to_string())
        }
    }

    fn enum_type_declaration_sql(&self, column: &Column) -> Result<String> {
        if column.values.is_empty() {
            return Err(values_required(self.name, column));
        }
        let values: Vec<String> = column
            .values
            .iter()
            .map(|value| self.quote_string_literal(value))
            .collect();
        Ok(format!("ENUM({})", values.join(", ")))
    }

    fn default_value_declaration_sql(&self, column: &Column) -> String {
        if Self::is_lob(column) && !self.features.text_defaults && column.default.is_some() {
            let mut without_default = column.clone();
            without_default.default = None;
            return default_value_sql(self, &without_default);
        }
        default_value_sql(self, column)
    }

    fn column_charset_declaration_sql(&self, charset: &str) -> String {
        format!(" CHARACTER SET {}", charset)
    }

    fn build_create_table_sql(&self, table: &Table, with_foreign_keys: bool) -> Result<Vec<String>> {
        let columns: Vec<&Column> = table.columns().collect();
        let mut body = vec![self.column_declaration_list_sql(&columns)?];

        for constraint in table.unique_constraints() {
            body.push(self.unique_constraint_declaration_sql(constraint));
        }
        for index in table.indexes().filter(|index| !index.is_primary()) {
            body.push(self.index_declaration_sql(index));
        }
        if let Some(primary) = table.primary_key() {
            body.push(format!(
                "PRIMARY KEY ({})",
                primary.quoted_columns(self).join(", ")
            ));
        }

        let temporary = if table.has_option("temporary") {
            "TEMPORARY "
        } else {
            ""
        };
        let mut sql = vec![format!(
            "CREATE {}TABLE {} ({}){}",
            temporary,
            table.quoted_name(self),
            body.join(", "),
            self.table_options_sql(table)
        )];

        if with_foreign_keys && self.table_supports_foreign_keys(table) {
            for foreign_key in table.foreign_keys() {
                sql.push(self.create_foreign_key_sql(foreign_key, table.identifier()));
            }
        }
        Ok(sql)
    }

    fn pre_alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let mut sql = self.strip_autoincrement_sql(diff)?;
        sql.extend(pre_alter_sql(self, diff));
        Ok(sql)
    }

    fn alter_table_columns_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let mut clauses = Vec::new();

        for column in &diff.added_columns {
            clauses.push(format!("ADD {}", self.column_declaration_sql(column)?));
        }

        for column in &diff.dropped_columns {
            clauses.push(format!("DROP {}", column.quoted_name(self)));
        }

        for (old_name, column) in &diff.renamed_columns {
            let old = Identifier::new(old_name);
            if self.features.rename_column {
                clauses.push(format!(
                    "RENAME COLUMN {} TO {}",
                    old.quoted_name(self),
                    column.quoted_name(self)
                ));
            } else {
                clauses.push(format!(
                    "CHANGE {} {}",
                    old.quoted_name(self),
                    self.column_declaration_sql(column)?
                ));
            }
        }

        for column_diff in &diff.changed_columns {
            if column_diff.only_default_changed()
                && Self::is_lob(&column_diff.new_column)
                && !self.features.text_defaults
            {
                continue;
            }
            clauses.push(format!(
                "CHANGE {} {}",
                column_diff.old_column.quoted_name(self),
                self.column_declaration_sql(&column_diff.new_column)?
            ));
        }

        clauses.extend(self.option_change_clauses(diff));

        if clauses.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "ALTER TABLE {} {}",
            diff.old_table.quoted_name(self),
            clauses.join(", ")
        )])
    }

    fn index_kind_sql(&self, index: &Index) -> &'static str {
        if index.has_flag("fulltext") {
            "FULLTEXT "
        } else if index.has_flag("spatial") {
            "SPATIAL "
        } else if index.is_unique() {
            "UNIQUE "
        } else {
            ""
        }
    }

    fn drop_index_sql(&self, index: &Index, table: &Identifier) -> String {
        format!(
            "DROP INDEX {} ON {}",
            index.quoted_name(self),
            table.quoted_name(self)
        )
    }

    fn rename_index_sql(&self, old_name: &str, index: &Index, table: &Identifier) -> Result<Vec<String>> {
        if !self.features.rename_index {
            let old = Index::new(old_name, &index.columns(), index.is_unique(), false)?;
            return Ok(vec![
                self.drop_index_sql(&old, table),
                self.create_index_sql(index, table)?,
            ]);
        }
        Ok(vec![format!(
            "ALTER TABLE {} RENAME INDEX {} TO {}",
            table.quoted_name(self),
            Identifier::new(old_name).quoted_name(self),
            index.quoted_name(self)
        )])
    }

    fn drop_primary_key_sql(&self, _index: &Index, table: &Identifier) -> String {
        format!("ALTER TABLE {} DROP PRIMARY KEY", table.quoted_name(self))
    }

    fn advanced_foreign_key_options_sql(&self, foreign_key: &ForeignKeyConstraint) -> String {
        let mut sql = String::new();
        if let Some(match_type) = foreign_key.option_str("match") {
            sql.push_str(&format!(" MATCH {}", match_type.to_uppercase()));
        }
        if let Some(action) = foreign_key.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        sql
    }

    fn drop_foreign_key_sql(&self, foreign_key: &ForeignKeyConstraint, table: &Identifier) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            table.quoted_name(self),
            foreign_key.quoted_name(self)
        )
    }

    fn drop_unique_constraint_sql(&self, constraint: &UniqueConstraint, table: &Identifier) -> String {
        format!(
            "ALTER TABLE {} DROP INDEX {}",
            table.quoted_name(self),
            constraint.quoted_name(self)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, InvalidColumnType};
    use crate::schema::column::DefaultValue;

    #[test]
    fn integer_modifiers_follow_type() {
        let platform = MySqlPlatform::mysql80();
        let column = Column::new("id", Type::Integer)
            .unsigned(true)
            .autoincrement(true);
        assert_eq!(
            platform.column_declaration_sql(&column).unwrap(),
            "id INT UNSIGNED AUTO_INCREMENT NOT NULL"
        );
    }

    #[test]
    fn text_size_depends_on_length() {
        let platform = MySqlPlatform::mysql80();
        let sizes = [
            (Some(100), "TINYTEXT"),
            (Some(1000), "TEXT"),
            (Some(100_000), "MEDIUMTEXT"),
            (None, "LONGTEXT"),
        ];
        for (length, expected) in sizes {
            let mut column = Column::new("body", Type::Text);
            column.length = length;
            assert_eq!(platform.type_declaration_sql(&column).unwrap(), expected);
        }
    }

    #[test]
    fn binary_requires_length() {
        let platform = MySqlPlatform::mysql57();
        let err = platform
            .type_declaration_sql(&Column::new("hash", Type::Binary))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidColumnType(InvalidColumnType::LengthRequired { .. })
        ));
    }

    #[test]
    fn text_defaults_depend_on_server() {
        let column = Column::new("body", Type::Text)
            .default(DefaultValue::String("x".to_string()));
        assert_eq!(
            MySqlPlatform::mysql80().column_declaration_sql(&column).unwrap(),
            "body LONGTEXT NOT NULL"
        );
        assert_eq!(
            MySqlPlatform::mariadb().column_declaration_sql(&column).unwrap(),
            "body LONGTEXT DEFAULT 'x' NOT NULL"
        );
    }

    #[test]
    fn keywords_are_quoted() {
        let platform = MySqlPlatform::mysql80();
        assert_eq!(Identifier::new("key").quoted_name(&platform), "`key`");
        assert_eq!(Identifier::new("users").quoted_name(&platform), "users");
    }
}
