//! PostgreSQL

use crate::error::Result;
use crate::platform::{
    default_value_sql, precision_required, scale_required, KeywordList, Platform, QuoteStyle,
};
use crate::schema::column::{Column, COLLATION};
use crate::schema::diff::{ColumnDiff, ColumnProperty, TableDiff};
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::identifier::Identifier;
use crate::schema::index::{Index, PRIMARY_KEY_NAME};

/// PostgreSQL dialect
#[derive(Debug, Clone)]
pub struct PostgresPlatform {
    keywords: KeywordList,
}

impl Default for PostgresPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresPlatform {
    pub fn new() -> Self {
        Self {
            keywords: KeywordList::postgres(),
        }
    }

    fn identity_sql(column: &Column) -> &'static str {
        if column.autoincrement {
            " GENERATED BY DEFAULT AS IDENTITY"
        } else {
            ""
        }
    }

    /// Index names live in the namespace of their table
    fn qualified_index_name(&self, name: &str, table: &Identifier) -> String {
        let index = Identifier::new(name);
        match (index.namespace(), table.namespace()) {
            (None, Some(namespace)) => format!(
                "{}.{}",
                Identifier::new(namespace).quoted_name(self),
                index.quoted_name(self)
            ),
            _ => index.quoted_name(self),
        }
    }

    fn changes_type(property: &ColumnProperty) -> bool {
        match property {
            ColumnProperty::Type
            | ColumnProperty::Length
            | ColumnProperty::Precision
            | ColumnProperty::Scale
            | ColumnProperty::Fixed
            | ColumnProperty::Values => true,
            ColumnProperty::PlatformOption(key) => key == "jsonb" || key == COLLATION,
            _ => false,
        }
    }

    fn alter_column_sql(&self, table: &Identifier, column_diff: &ColumnDiff) -> Result<Vec<String>> {
        let column = &column_diff.new_column;
        let prefix = format!(
            "ALTER TABLE {} ALTER {}",
            table.quoted_name(self),
            column.quoted_name(self)
        );
        let mut sql = Vec::new();

        if column_diff.changed_properties.iter().any(Self::changes_type) {
            let mut plain = column.clone();
            plain.autoincrement = false;
            let target = self.type_declaration_sql(&plain)?;
            let mut declaration = target.clone();
            if let Some(collation) = column.platform_option_str(COLLATION) {
                declaration.push_str(&self.column_collation_declaration_sql(collation));
            }
            // a different logical type may need an explicit cast
            if column_diff.has_changed(&ColumnProperty::Type) {
                declaration.push_str(&format!(" USING {}::{}", column.quoted_name(self), target));
            }
            sql.push(format!("{} TYPE {}", prefix, declaration));
        }

        if column_diff.has_changed(&ColumnProperty::Default) {
            if column.default.is_some() {
                let clause = default_value_sql(self, column);
                sql.push(format!("{} SET{}", prefix, clause));
            } else {
                sql.push(format!("{} DROP DEFAULT", prefix));
            }
        }

        if column_diff.has_changed(&ColumnProperty::Nullable) {
            let action = if column.nullable { "DROP" } else { "SET" };
            sql.push(format!("{} {} NOT NULL", prefix, action));
        }

        if column_diff.has_changed(&ColumnProperty::Autoincrement) {
            if column.autoincrement {
                sql.push(format!("{} ADD GENERATED BY DEFAULT AS IDENTITY", prefix));
            } else {
                sql.push(format!("{} DROP IDENTITY", prefix));
            }
        }

        if column_diff.has_changed(&ColumnProperty::Comment) {
            sql.push(self.comment_on_column_sql(table, column, column.comment.as_deref()));
        }

        Ok(sql)
    }
}

impl Platform for PostgresPlatform {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::DOUBLE_QUOTE
    }

    fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    fn as_dyn(&self) -> &dyn Platform {
        self
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn supports_identity_columns(&self) -> bool {
        true
    }

    fn supports_comment_on_statement(&self) -> bool {
        true
    }

    fn supports_partial_indexes(&self) -> bool {
        true
    }

    fn convert_boolean(&self, value: bool) -> String {
        value.to_string()
    }

    fn integer_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("INT{}", Self::identity_sql(column)))
    }

    fn bigint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("BIGINT{}", Self::identity_sql(column)))
    }

    fn smallint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(format!("SMALLINT{}", Self::identity_sql(column)))
    }

    fn decimal_type_declaration_sql(&self, column: &Column) -> Result<String> {
        let precision = column
            .precision
            .ok_or_else(|| precision_required(self.name(), column))?;
        let scale = column
            .scale
            .ok_or_else(|| scale_required(self.name(), column))?;
        Ok(format!("NUMERIC({}, {})", precision, scale))
    }

    fn guid_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("UUID".to_string())
    }

    fn binary_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BYTEA".to_string())
    }

    fn blob_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BYTEA".to_string())
    }

    fn datetime_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TIMESTAMP(0) WITHOUT TIME ZONE".to_string())
    }

    fn datetimetz_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TIMESTAMP(0) WITH TIME ZONE".to_string())
    }

    fn time_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("TIME(0) WITHOUT TIME ZONE".to_string())
    }

    fn json_type_declaration_sql(&self, column: &Column) -> Result<String> {
        if column.platform_flag("jsonb") {
            Ok("JSONB".to_string())
        } else {
            Ok("JSON".to_string())
        }
    }

    fn alter_table_columns_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let table = diff.old_table.identifier();
        let quoted_table = table.quoted_name(self);
        let mut sql = Vec::new();

        for column in &diff.added_columns {
            sql.push(format!(
                "ALTER TABLE {} ADD {}",
                quoted_table,
                self.column_declaration_sql(column)?
            ));
            if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
                sql.push(self.comment_on_column_sql(table, column, Some(comment)));
            }
        }

        for column in &diff.dropped_columns {
            sql.push(format!(
                "ALTER TABLE {} DROP {}",
                quoted_table,
                column.quoted_name(self)
            ));
        }

        for (old_name, column) in &diff.renamed_columns {
            sql.push(format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                quoted_table,
                Identifier::new(old_name).quoted_name(self),
                column.quoted_name(self)
            ));
        }

        for column_diff in &diff.changed_columns {
            sql.extend(self.alter_column_sql(table, column_diff)?);
        }

        for change in &diff.changed_options {
            if change.key == "comment" {
                sql.push(self.comment_on_table_sql(table, change.new_value.as_deref()));
            }
        }

        Ok(sql)
    }

    fn drop_index_sql(&self, index: &Index, table: &Identifier) -> String {
        format!("DROP INDEX {}", self.qualified_index_name(index.name(), table))
    }

    fn rename_index_sql(&self, old_name: &str, index: &Index, table: &Identifier) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER INDEX {} RENAME TO {}",
            self.qualified_index_name(old_name, table),
            index.quoted_name(self)
        )])
    }

    /// The primary key constraint is named `<table>_pkey` unless given a name
    fn drop_primary_key_sql(&self, index: &Index, table: &Identifier) -> String {
        let constraint = if index.name().eq_ignore_ascii_case(PRIMARY_KEY_NAME) {
            Identifier::new(&format!("{}_pkey", table.name()))
        } else {
            index.identifier().clone()
        };
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            table.quoted_name(self),
            constraint.quoted_name(self)
        )
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
        if foreign_key.option_flag("deferrable") {
            sql.push_str(" DEFERRABLE");
        } else {
            sql.push_str(" NOT DEFERRABLE");
        }
        if foreign_key.option_flag("deferred") {
            sql.push_str(" INITIALLY DEFERRED");
        } else {
            sql.push_str(" INITIALLY IMMEDIATE");
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, InvalidColumnType};
    use crate::schema::column::DefaultValue;
    use crate::schema::types::Type;

    #[test]
    fn identity_columns() {
        let platform = PostgresPlatform::new();
        let column = Column::new("id", Type::Integer).autoincrement(true);
        assert_eq!(
            platform.column_declaration_sql(&column).unwrap(),
            "id INT GENERATED BY DEFAULT AS IDENTITY NOT NULL"
        );
    }

    #[test]
    fn booleans_render_as_words() {
        let platform = PostgresPlatform::new();
        let column = Column::new("active", Type::Boolean).default(DefaultValue::Bool(true));
        assert_eq!(
            platform.column_declaration_sql(&column).unwrap(),
            "active BOOLEAN DEFAULT true NOT NULL"
        );
    }

    #[test]
    fn decimal_requires_precision_and_scale() {
        let platform = PostgresPlatform::new();
        let err = platform
            .type_declaration_sql(&Column::new("price", Type::Decimal))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidColumnType(InvalidColumnType::PrecisionRequired { .. })
        ));

        let err = platform
            .type_declaration_sql(&Column::new("price", Type::Decimal).precision(10))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidColumnType(InvalidColumnType::ScaleRequired { .. })
        ));

        let column = Column::new("price", Type::Decimal).precision(10).scale(2);
        assert_eq!(platform.type_declaration_sql(&column).unwrap(), "NUMERIC(10, 2)");
    }

    #[test]
    fn reserved_words_use_double_quotes() {
        let platform = PostgresPlatform::new();
        assert_eq!(Identifier::new("user").quoted_name(&platform), "\"user\"");
    }

    #[test]
    fn primary_key_constraint_name() {
        let platform = PostgresPlatform::new();
        let index = Index::new("primary", &["id"], true, true).unwrap();
        assert_eq!(
            platform.drop_primary_key_sql(&index, &Identifier::new("users")),
            "ALTER TABLE users DROP CONSTRAINT users_pkey"
        );
    }
}
