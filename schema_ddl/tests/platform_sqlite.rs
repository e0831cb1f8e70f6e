use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use schema_ddl::platform::{Platform, SqlitePlatform};
use schema_ddl::schema::{Column, Table};
use schema_ddl::{Comparator, Type};

#[fixture]
fn tags() -> Table {
    let mut table = Table::new("tags").unwrap();
    table.add_column(Column::new("id", Type::Integer)).unwrap();
    table
        .add_column(Column::new("label", Type::String).length(50))
        .unwrap();
    table.set_primary_key(&["id"], None).unwrap();
    table
}

#[rstest]
fn nullable_column_is_added_in_place(tags: Table) {
    let mut to = tags.clone();
    to.add_column(Column::new("note", Type::Text).nullable(true))
        .unwrap();

    let diff = Comparator::default().compare_tables(&tags, &to).unwrap();
    assert_eq!(
        SqlitePlatform::new().alter_table_sql(&diff).unwrap(),
        vec!["ALTER TABLE tags ADD COLUMN note CLOB DEFAULT NULL".to_string()]
    );
}

#[rstest]
fn rename_is_done_in_place(tags: Table) {
    let mut to = tags.clone();
    to.rename_column("label", "name").unwrap();

    let diff = Comparator::default().compare_tables(&tags, &to).unwrap();
    assert_eq!(
        SqlitePlatform::new().alter_table_sql(&diff).unwrap(),
        vec!["ALTER TABLE tags RENAME COLUMN label TO name".to_string()]
    );
}

#[rstest]
fn changed_column_rebuilds_the_table(tags: Table) {
    let mut to = tags.clone();
    to.column_mut("label").unwrap().length = Some(100);

    let diff = Comparator::default().compare_tables(&tags, &to).unwrap();
    assert_eq!(
        SqlitePlatform::new().alter_table_sql(&diff).unwrap(),
        vec![
            "CREATE TEMPORARY TABLE __temp__tags AS SELECT id, label FROM tags".to_string(),
            "DROP TABLE tags".to_string(),
            "CREATE TABLE tags (id INTEGER NOT NULL, label VARCHAR(100) NOT NULL, PRIMARY KEY (id))".to_string(),
            "INSERT INTO tags (id, label) SELECT id, label FROM __temp__tags".to_string(),
            "DROP TABLE __temp__tags".to_string(),
        ]
    );
}

#[rstest]
fn dropped_column_is_not_copied(tags: Table) {
    let mut to = tags.clone();
    to.drop_column("label").unwrap();

    let diff = Comparator::default().compare_tables(&tags, &to).unwrap();
    let sql = SqlitePlatform::new().alter_table_sql(&diff).unwrap();
    assert_eq!(sql[0], "CREATE TEMPORARY TABLE __temp__tags AS SELECT id FROM tags");
    assert!(sql.contains(&"INSERT INTO tags (id) SELECT id FROM __temp__tags".to_string()));
}

#[test]
fn foreign_keys_never_use_alter() {
    let platform = SqlitePlatform::new();
    assert!(!platform.supports_foreign_key_alter());
    assert!(!platform.supports_sequences());
    assert!(!platform.supports_schemas());
}
