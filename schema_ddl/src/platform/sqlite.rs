//! SQLite

use tracing::debug;

use crate::error::Result;
use crate::platform::{KeywordList, Platform, QuoteStyle};
use crate::schema::column::Column;
use crate::schema::diff::TableDiff;
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::identifier::Identifier;
use crate::schema::table::Table;

const TEMPORARY_TABLE_PREFIX: &str = "__temp__";

/// SQLite dialect
#[derive(Debug, Clone)]
pub struct SqlitePlatform {
    keywords: KeywordList,
}

impl Default for SqlitePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlitePlatform {
    pub fn new() -> Self {
        Self {
            keywords: KeywordList::sqlite(),
        }
    }

    fn integer_sql(column: &Column, name: &str) -> String {
        if column.autoincrement {
            "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
        } else {
            name.to_string()
        }
    }

    /// Whether the diff can be applied with plain ALTER TABLE statements
    fn is_simple_alter(diff: &TableDiff) -> bool {
        let addable = diff.added_columns.iter().all(|column| {
            !column.autoincrement && (column.nullable || column.default.is_some())
        });
        let primary_untouched = !diff
            .added_indexes
            .iter()
            .chain(diff.changed_indexes.iter())
            .chain(diff.dropped_indexes.iter())
            .any(|index| index.is_primary());

        addable
            && primary_untouched
            && diff.changed_columns.is_empty()
            && diff.dropped_columns.is_empty()
            && diff.added_foreign_keys.is_empty()
            && diff.changed_foreign_keys.is_empty()
            && diff.dropped_foreign_keys.is_empty()
            && diff.added_unique_constraints.is_empty()
            && diff.dropped_unique_constraints.is_empty()
            && diff.changed_options.is_empty()
    }

    fn simple_alter_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let table = diff.new_table.identifier();
        let quoted_table = table.quoted_name(self);
        let mut sql = Vec::new();

        for index in diff.dropped_indexes.iter().chain(diff.changed_indexes.iter()) {
            sql.push(self.drop_index_sql(index, table));
        }
        for column in &diff.added_columns {
            sql.push(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quoted_table,
                self.column_declaration_sql(column)?
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
        for (old_name, index) in &diff.renamed_indexes {
            sql.extend(self.rename_index_sql(old_name, index, table)?);
        }
        for index in diff.added_indexes.iter().chain(diff.changed_indexes.iter()) {
            sql.push(self.create_index_sql(index, table)?);
        }
        Ok(sql)
    }

    /// Copy the data aside, recreate the table from its new definition and
    /// copy the surviving columns back
    fn rebuild_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let old_table = &diff.old_table;
        let new_table = &diff.new_table;
        debug!("Rebuilding SQLite table {}", new_table.full_name());

        let temporary = Identifier::new(&format!("{}{}", TEMPORARY_TABLE_PREFIX, old_table.name()));
        let quoted_temporary = temporary.quoted_name(self);

        let mut old_columns = Vec::new();
        let mut new_columns = Vec::new();
        for column in old_table.columns() {
            if diff
                .dropped_columns
                .iter()
                .any(|dropped| dropped.identifier() == column.identifier())
            {
                continue;
            }
            let new_name = diff
                .renamed_columns
                .iter()
                .find(|(old_name, _)| Identifier::new(old_name) == *column.identifier())
                .map(|(_, renamed)| renamed.identifier().clone())
                .unwrap_or_else(|| column.identifier().clone());
            if new_table.has_column(&new_name.full_name()) {
                old_columns.push(column.quoted_name(self));
                new_columns.push(new_name.quoted_name(self));
            }
        }

        let mut create = self.create_table_sql(new_table)?;
        let indexes = create.split_off(1);

        let mut sql = vec![
            format!(
                "CREATE TEMPORARY TABLE {} AS SELECT {} FROM {}",
                quoted_temporary,
                old_columns.join(", "),
                old_table.quoted_name(self)
            ),
            self.drop_table_sql(old_table.identifier()),
        ];
        sql.extend(create);
        if !new_columns.is_empty() {
            sql.push(format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                new_table.quoted_name(self),
                new_columns.join(", "),
                old_columns.join(", "),
                quoted_temporary
            ));
        }
        sql.push(self.drop_table_sql(&temporary));
        sql.extend(indexes);
        Ok(sql)
    }

    /// The autoincrement column declared as `INTEGER PRIMARY KEY
    /// AUTOINCREMENT`, when it is the whole primary key
    fn inline_primary_key(table: &Table) -> Option<&Column> {
        let columns = table.primary_key_columns();
        let [name] = columns.as_slice() else {
            return None;
        };
        table.column(name).ok().filter(|column| column.autoincrement)
    }
}

impl Platform for SqlitePlatform {
    fn name(&self) -> &'static str {
        "sqlite"
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

    fn max_identifier_length(&self) -> usize {
        128
    }

    fn supports_foreign_key_alter(&self) -> bool {
        false
    }

    fn supports_rename_index(&self) -> bool {
        false
    }

    fn supports_partial_indexes(&self) -> bool {
        true
    }

    fn integer_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(Self::integer_sql(column, "INTEGER"))
    }

    fn bigint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(Self::integer_sql(column, "BIGINT"))
    }

    fn smallint_type_declaration_sql(&self, column: &Column) -> Result<String> {
        Ok(Self::integer_sql(column, "SMALLINT"))
    }

    fn text_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("CLOB".to_string())
    }

    fn json_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("CLOB".to_string())
    }

    fn binary_type_declaration_sql(&self, _column: &Column) -> Result<String> {
        Ok("BLOB".to_string())
    }

    fn build_create_table_sql(&self, table: &Table, with_foreign_keys: bool) -> Result<Vec<String>> {
        // AUTOINCREMENT is only valid on a single column INTEGER PRIMARY KEY
        let inline_key = Self::inline_primary_key(table).map(|column| column.identifier().clone());
        let columns: Vec<Column> = table
            .columns()
            .map(|column| {
                let mut column = column.clone();
                if inline_key.as_ref() != Some(column.identifier()) {
                    column.autoincrement = false;
                }
                column
            })
            .collect();
        let columns: Vec<&Column> = columns.iter().collect();
        let mut body = vec![self.column_declaration_list_sql(&columns)?];

        for constraint in table.unique_constraints() {
            body.push(self.unique_constraint_declaration_sql(constraint));
        }
        if let Some(primary) = table.primary_key() {
            if inline_key.is_none() {
                body.push(format!(
                    "PRIMARY KEY ({})",
                    primary.quoted_columns(self).join(", ")
                ));
            }
        }
        if with_foreign_keys {
            for foreign_key in table.foreign_keys() {
                body.push(self.foreign_key_declaration_sql(foreign_key));
            }
        }

        let temporary = if table.has_option("temporary") {
            "TEMPORARY "
        } else {
            ""
        };
        let mut sql = vec![format!(
            "CREATE {}TABLE {} ({})",
            temporary,
            table.quoted_name(self),
            body.join(", ")
        )];
        for index in table.indexes().filter(|index| !index.is_primary()) {
            sql.push(self.create_index_sql(index, table.identifier())?);
        }
        Ok(sql)
    }

    fn alter_table_columns_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        if Self::is_simple_alter(diff) {
            self.simple_alter_sql(diff)
        } else {
            self.rebuild_table_sql(diff)
        }
    }

    /// Everything happens in [`Platform::alter_table_columns_sql`] since
    /// SQLite cannot alter constraints in place
    fn alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        self.alter_table_columns_sql(diff)
    }

    fn advanced_foreign_key_options_sql(&self, foreign_key: &ForeignKeyConstraint) -> String {
        let mut sql = String::new();
        if let Some(action) = foreign_key.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        if foreign_key.option_flag("deferrable") {
            sql.push_str(" DEFERRABLE");
        }
        if foreign_key.option_flag("deferred") {
            sql.push_str(" INITIALLY DEFERRED");
        }
        sql
    }
}
