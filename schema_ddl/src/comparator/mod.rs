//! Schema comparison
//!
//! The comparator is a pure function of two schema snapshots: it never
//! fails and never touches a database.

pub mod mysql;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::DEFAULT_DECIMAL_PRECISION;
use crate::platform::DEFAULT_STRING_LENGTH;
use crate::schema::column::Column;
use crate::schema::database::Schema;
use crate::schema::diff::{ColumnDiff, ColumnProperty, OptionChange, SchemaDiff, TableDiff};
use crate::schema::foreign_key::ForeignKeyConstraint;
use crate::schema::index::Index;
use crate::schema::sequence::Sequence;
use crate::schema::table::Table;
use crate::schema::types::Type;

pub use mysql::{
    CharsetMetadataProvider, CollationMetadataProvider, DefaultTableOptions, MySqlNormalizer,
    StaticCharsetMetadata,
};

/// Comparator behaviour switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Turn an identical dropped/added column pair into a rename
    pub detect_column_renames: bool,
    /// Turn an identical dropped/added index pair into a rename instead of
    /// ignoring it
    pub detect_index_renames: bool,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            detect_column_renames: true,
            detect_index_renames: false,
        }
    }
}

/// Rewrites a table into a canonical form before it is compared
pub trait TableNormalizer: Send + Sync {
    fn normalize(&self, table: &Table) -> Table;
}

/// Computes differences between schemas and tables
pub struct Comparator {
    config: ComparatorConfig,
    normalizer: Option<Box<dyn TableNormalizer>>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(ComparatorConfig::default())
    }
}

impl Comparator {
    pub fn new(config: ComparatorConfig) -> Self {
        Self {
            config,
            normalizer: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn TableNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Differences turning `from` into `to`
    pub fn compare_schemas(&self, from: &Schema, to: &Schema) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for namespace in to.namespaces() {
            if !from.has_namespace(namespace) {
                diff.new_namespaces.push(namespace.to_string());
            }
        }
        for namespace in from.namespaces() {
            if !to.has_namespace(namespace) {
                diff.removed_namespaces.push(namespace.to_string());
            }
        }

        for to_table in to.tables() {
            match find_table(from, to_table, to.name()) {
                Some(from_table) => {
                    if let Some(table_diff) = self.compare_tables(from_table, to_table) {
                        diff.changed_tables.push(table_diff);
                    }
                }
                None => diff.new_tables.push(to_table.clone()),
            }
        }

        for from_table in from.tables() {
            if find_table(to, from_table, from.name()).is_none() {
                diff.removed_tables.push(from_table.clone());
            }
        }

        self.collect_orphaned_foreign_keys(from, &mut diff);

        for to_sequence in to.sequences() {
            let name = to_sequence.identifier().full_name();
            match from.sequence(&name) {
                Ok(from_sequence) if self.diff_sequence(from_sequence, to_sequence) => {
                    diff.changed_sequences.push(to_sequence.clone());
                }
                Ok(_) => {}
                Err(_) => diff.new_sequences.push(to_sequence.clone()),
            }
        }
        for from_sequence in from.sequences() {
            if !to.has_sequence(&from_sequence.identifier().full_name()) {
                diff.removed_sequences.push(from_sequence.clone());
            }
        }

        debug!(
            "Schema diff: {} new, {} changed, {} removed tables",
            diff.new_tables.len(),
            diff.changed_tables.len(),
            diff.removed_tables.len()
        );
        diff
    }

    /// Foreign keys of surviving tables that reference removed tables are
    /// dropped on their own, before the tables go
    fn collect_orphaned_foreign_keys(&self, from: &Schema, diff: &mut SchemaDiff) {
        let removed: BTreeSet<String> = diff
            .removed_tables
            .iter()
            .map(|table| table.shortest_name(from.name()))
            .collect();
        if removed.is_empty() {
            return;
        }

        for table in from.tables() {
            if removed.contains(&table.shortest_name(from.name())) {
                continue;
            }
            for foreign_key in table.foreign_keys() {
                let target = foreign_key.foreign_table().shortest_name(from.name());
                if !removed.contains(&target) {
                    continue;
                }
                diff.orphaned_foreign_keys.push(foreign_key.clone());

                if let Some(table_diff) = diff
                    .changed_tables
                    .iter_mut()
                    .find(|table_diff| table_diff.old_table.identifier() == table.identifier())
                {
                    table_diff
                        .dropped_foreign_keys
                        .retain(|dropped| !dropped.name().eq_ignore_ascii_case(foreign_key.name()));
                }
            }
        }
        diff.changed_tables.retain(|table_diff| !table_diff.is_empty());
    }

    pub fn diff_sequence(&self, from: &Sequence, to: &Sequence) -> bool {
        from.differs_from(to)
    }

    fn normalize(&self, table: &Table) -> Table {
        match &self.normalizer {
            Some(normalizer) => normalizer.normalize(table),
            None => table.clone(),
        }
    }

    /// Differences turning table `from` into `to`; `None` when equal
    pub fn compare_tables(&self, from: &Table, to: &Table) -> Option<TableDiff> {
        let from = self.normalize(from);
        let to = self.normalize(to);
        let mut diff = TableDiff::new(from.clone(), to.clone());

        self.diff_columns(&from, &to, &mut diff);
        if self.config.detect_column_renames {
            self.detect_column_renames(&mut diff);
        }
        self.diff_indexes(&from, &to, &mut diff);
        self.diff_foreign_keys(&from, &to, &mut diff);
        self.diff_unique_constraints(&from, &to, &mut diff);
        diff.changed_options = diff_options(&from, &to);

        if diff.is_empty() {
            None
        } else {
            debug!("Table {} changed", diff.name());
            Some(diff)
        }
    }

    fn diff_columns(&self, from: &Table, to: &Table, diff: &mut TableDiff) {
        for new_column in to.columns() {
            match from.column(new_column.name()) {
                Ok(old_column) => {
                    let changed_properties = self.diff_column(old_column, new_column);
                    if !changed_properties.is_empty() {
                        diff.changed_columns.push(ColumnDiff {
                            old_column: old_column.clone(),
                            new_column: new_column.clone(),
                            changed_properties,
                        });
                    }
                }
                Err(_) => diff.added_columns.push(new_column.clone()),
            }
        }

        for old_column in from.columns() {
            if !to.has_column(old_column.name()) {
                diff.dropped_columns.push(old_column.clone());
            }
        }
    }

    /// Attribute-level differences between two columns, ignoring names
    pub fn diff_column(&self, old: &Column, new: &Column) -> Vec<ColumnProperty> {
        let mut changed = Vec::new();

        if old.column_type != new.column_type {
            changed.push(ColumnProperty::Type);
        }
        if old.nullable != new.nullable {
            changed.push(ColumnProperty::Nullable);
        }
        if old.unsigned != new.unsigned {
            changed.push(ColumnProperty::Unsigned);
        }
        if old.autoincrement != new.autoincrement {
            changed.push(ColumnProperty::Autoincrement);
        }

        let defaults_equal = match (&old.default, &new.default) {
            (None, None) => true,
            (Some(old_default), Some(new_default)) => old_default.loosely_equals(new_default),
            _ => false,
        };
        if !defaults_equal {
            changed.push(ColumnProperty::Default);
        }

        let column_type = new.column_type;
        if column_type.is_length_bound() {
            if old.length.unwrap_or(DEFAULT_STRING_LENGTH) != new.length.unwrap_or(DEFAULT_STRING_LENGTH) {
                changed.push(ColumnProperty::Length);
            }
            if old.fixed != new.fixed {
                changed.push(ColumnProperty::Fixed);
            }
        }

        if column_type == Type::Decimal {
            if old.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION)
                != new.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION)
            {
                changed.push(ColumnProperty::Precision);
            }
            if old.scale.unwrap_or(0) != new.scale.unwrap_or(0) {
                changed.push(ColumnProperty::Scale);
            }
        }

        if old.comment.as_deref().unwrap_or("") != new.comment.as_deref().unwrap_or("") {
            changed.push(ColumnProperty::Comment);
        }

        if column_type == Type::Enum && old.values != new.values {
            changed.push(ColumnProperty::Values);
        }

        let keys: BTreeSet<&String> = old
            .platform_options
            .keys()
            .chain(new.platform_options.keys())
            .collect();
        for key in keys {
            if old.platform_options.get(key) != new.platform_options.get(key) {
                changed.push(ColumnProperty::PlatformOption(key.clone()));
            }
        }

        changed
    }

    /// A dropped and an added column become a rename only when each is the
    /// other's single identical candidate
    fn detect_column_renames(&self, diff: &mut TableDiff) {
        let mut pairs = Vec::new();

        for (added_index, added) in diff.added_columns.iter().enumerate() {
            let candidates: Vec<usize> = diff
                .dropped_columns
                .iter()
                .enumerate()
                .filter(|(_, dropped)| self.diff_column(dropped, added).is_empty())
                .map(|(dropped_index, _)| dropped_index)
                .collect();
            let &[dropped_index] = candidates.as_slice() else {
                if candidates.len() > 1 {
                    debug!(
                        "Column {} matches {} dropped columns, keeping drop and add",
                        added.name(),
                        candidates.len()
                    );
                }
                continue;
            };

            let dropped = &diff.dropped_columns[dropped_index];
            let reverse_matches = diff
                .added_columns
                .iter()
                .filter(|other| self.diff_column(dropped, other).is_empty())
                .count();
            if reverse_matches == 1 {
                pairs.push((added_index, dropped_index));
            }
        }

        if pairs.is_empty() {
            return;
        }

        let renamed_added: BTreeSet<usize> = pairs.iter().map(|(added, _)| *added).collect();
        let renamed_dropped: BTreeSet<usize> = pairs.iter().map(|(_, dropped)| *dropped).collect();
        for (added_index, dropped_index) in &pairs {
            let old_name = diff.dropped_columns[*dropped_index].name().to_string();
            let column = diff.added_columns[*added_index].clone();
            debug!("Detected rename of column {} to {}", old_name, column.name());
            diff.renamed_columns.insert(old_name, column);
        }

        diff.added_columns = std::mem::take(&mut diff.added_columns)
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !renamed_added.contains(index))
            .map(|(_, column)| column)
            .collect();
        diff.dropped_columns = std::mem::take(&mut diff.dropped_columns)
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !renamed_dropped.contains(index))
            .map(|(_, column)| column)
            .collect();
    }

    fn diff_indexes(&self, from: &Table, to: &Table, diff: &mut TableDiff) {
        let mut added: Vec<Index> = Vec::new();
        let mut dropped: Vec<Index> = Vec::new();

        for new_index in to.indexes() {
            let old_index = if new_index.is_primary() {
                from.primary_key()
            } else {
                from.index(new_index.name())
                    .ok()
                    .filter(|old| !old.is_primary())
            };
            match old_index {
                Some(old_index) if !old_index.same_definition(new_index) => {
                    diff.changed_indexes.push(new_index.clone());
                }
                Some(_) => {}
                None => added.push(new_index.clone()),
            }
        }

        for old_index in from.indexes() {
            let matched = if old_index.is_primary() {
                to.has_primary_key()
            } else {
                to.index(old_index.name())
                    .map(|new| !new.is_primary())
                    .unwrap_or(false)
            };
            if !matched {
                dropped.push(old_index.clone());
            }
        }

        // same definition under another name
        let mut unmatched_added = Vec::new();
        for new_index in added {
            let candidates: Vec<usize> = dropped
                .iter()
                .enumerate()
                .filter(|(_, old)| !old.is_primary() && old.same_definition(&new_index))
                .map(|(position, _)| position)
                .collect();

            match candidates.first() {
                None => unmatched_added.push(new_index),
                Some(&position) => {
                    let old = dropped.remove(position);
                    if self.config.detect_index_renames && candidates.len() == 1 {
                        debug!("Detected rename of index {} to {}", old.name(), new_index.name());
                        diff.renamed_indexes.insert(old.name().to_string(), new_index);
                    }
                }
            }
        }

        diff.added_indexes = unmatched_added;
        diff.dropped_indexes = dropped;
    }

    fn diff_foreign_keys(&self, from: &Table, to: &Table, diff: &mut TableDiff) {
        let mut from_keys: Vec<&ForeignKeyConstraint> = from.foreign_keys().collect();
        let mut to_keys: Vec<&ForeignKeyConstraint> = Vec::new();

        for new_key in to.foreign_keys() {
            match from_keys.iter().position(|old| old.same_definition(new_key)) {
                Some(position) => {
                    from_keys.remove(position);
                }
                None => to_keys.push(new_key),
            }
        }

        for new_key in to_keys {
            match from_keys
                .iter()
                .position(|old| old.name().eq_ignore_ascii_case(new_key.name()))
            {
                Some(position) => {
                    from_keys.remove(position);
                    diff.changed_foreign_keys.push(new_key.clone());
                }
                None => diff.added_foreign_keys.push(new_key.clone()),
            }
        }

        diff.dropped_foreign_keys = from_keys.into_iter().cloned().collect();
    }

    fn diff_unique_constraints(&self, from: &Table, to: &Table, diff: &mut TableDiff) {
        for new_constraint in to.unique_constraints() {
            let unchanged = from
                .unique_constraint(new_constraint.name())
                .map(|old| old.same_definition(new_constraint))
                .unwrap_or(false);
            if !unchanged {
                diff.added_unique_constraints.push(new_constraint.clone());
            }
        }

        for old_constraint in from.unique_constraints() {
            let unchanged = to
                .unique_constraint(old_constraint.name())
                .map(|new| new.same_definition(old_constraint))
                .unwrap_or(false);
            if !unchanged {
                diff.dropped_unique_constraints.push(old_constraint.clone());
            }
        }
    }
}

/// Locate the counterpart of `table` in `schema`, treating names in the
/// owner's default namespace as unqualified
fn find_table<'a>(schema: &'a Schema, table: &Table, owner_default: Option<&str>) -> Option<&'a Table> {
    if let Ok(found) = schema.table(&table.full_name()) {
        return Some(found);
    }
    if table.namespace().is_some() && table.identifier().is_in_default_namespace(owner_default) {
        return schema.table(table.name()).ok();
    }
    None
}

fn diff_options(from: &Table, to: &Table) -> Vec<OptionChange> {
    let keys: BTreeSet<&String> = from.options().keys().chain(to.options().keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let old_value = from.option(key);
            let new_value = to.option(key);
            (old_value != new_value).then(|| OptionChange {
                key: key.clone(),
                old_value: old_value.map(str::to_string),
                new_value: new_value.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::DefaultValue;

    fn users() -> Table {
        let mut table = Table::new("users").unwrap();
        table.add_column(Column::new("id", Type::Integer)).unwrap();
        table
            .add_column(Column::new("name", Type::String).length(50))
            .unwrap();
        table.set_primary_key(&["id"], None).unwrap();
        table
    }

    #[test]
    fn identical_tables_have_no_diff() {
        assert!(Comparator::default().compare_tables(&users(), &users()).is_none());
    }

    #[test]
    fn unset_length_equals_default_length() {
        let comparator = Comparator::default();
        let old = Column::new("name", Type::String);
        let new = Column::new("name", Type::String).length(DEFAULT_STRING_LENGTH);
        assert!(comparator.diff_column(&old, &new).is_empty());
    }

    #[test]
    fn loose_defaults_are_equal() {
        let comparator = Comparator::default();
        let old = Column::new("flag", Type::Integer).default(DefaultValue::Integer(1));
        let new = Column::new("flag", Type::Integer).default(DefaultValue::String("1".to_string()));
        assert!(comparator.diff_column(&old, &new).is_empty());
    }

    #[test]
    fn ambiguous_renames_stay_drop_and_add() {
        let mut from = users();
        from.add_column(Column::new("a", Type::Text)).unwrap();
        from.add_column(Column::new("b", Type::Text)).unwrap();
        let mut to = users();
        to.add_column(Column::new("c", Type::Text)).unwrap();
        to.add_column(Column::new("d", Type::Text)).unwrap();

        let diff = Comparator::default().compare_tables(&from, &to).unwrap();
        assert!(diff.renamed_columns.is_empty());
        assert_eq!(diff.added_columns.len(), 2);
        assert_eq!(diff.dropped_columns.len(), 2);
    }

    #[test]
    fn renamed_index_is_ignored_unless_detected() {
        let mut from = users();
        from.add_index(&["name"], Some("idx_old")).unwrap();
        let mut to = users();
        to.add_index(&["name"], Some("idx_new")).unwrap();

        assert!(Comparator::default().compare_tables(&from, &to).is_none());

        let detecting = Comparator::new(ComparatorConfig {
            detect_index_renames: true,
            ..Default::default()
        });
        let diff = detecting.compare_tables(&from, &to).unwrap();
        assert_eq!(diff.renamed_indexes.len(), 1);
        assert_eq!(diff.renamed_indexes["idx_old"].name(), "idx_new");
    }

    #[test]
    fn option_changes_are_recorded() {
        let from = users();
        let mut to = users();
        to.add_option("engine", "MyISAM");

        let diff = Comparator::default().compare_tables(&from, &to).unwrap();
        assert_eq!(
            diff.changed_options,
            vec![OptionChange {
                key: "engine".to_string(),
                old_value: None,
                new_value: Some("MyISAM".to_string()),
            }]
        );
    }
}
