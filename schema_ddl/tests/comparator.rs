use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use schema_ddl::comparator::{DefaultTableOptions, MySqlNormalizer, StaticCharsetMetadata};
use schema_ddl::schema::{
    Column, ColumnProperty, DefaultValue, ForeignKeyConstraint, Schema, SchemaConfig, Sequence, Table,
};
use schema_ddl::{Comparator, ComparatorConfig, Type};

#[fixture]
fn blog() -> Schema {
    let mut schema = Schema::default();

    let users = schema.create_table("users").unwrap();
    users
        .add_column(Column::new("id", Type::Integer).autoincrement(true))
        .unwrap();
    users
        .add_column(Column::new("email", Type::String).length(180))
        .unwrap();
    users.set_primary_key(&["id"], None).unwrap();
    users.add_unique_index(&["email"], None).unwrap();

    let posts = schema.create_table("posts").unwrap();
    posts.add_column(Column::new("id", Type::Integer)).unwrap();
    posts.add_column(Column::new("user_id", Type::Integer)).unwrap();
    posts
        .add_column(Column::new("title", Type::String).length(50))
        .unwrap();
    posts.set_primary_key(&["id"], None).unwrap();
    posts
        .add_foreign_key_constraint(
            ForeignKeyConstraint::new(&["user_id"], "users", &["id"], None).unwrap(),
        )
        .unwrap();

    schema
        .add_sequence(Sequence::new("posts_seq").unwrap().allocation_size(10))
        .unwrap();
    schema
}

#[rstest]
fn self_diff_is_empty(blog: Schema) {
    let diff = Comparator::default().compare_schemas(&blog, &blog.clone());
    assert!(diff.is_empty());
}

#[rstest]
fn default_change_is_one_changed_column(blog: Schema) {
    let mut to = blog.clone();
    to.table_mut("posts")
        .unwrap()
        .column_mut("title")
        .unwrap()
        .default = Some(DefaultValue::String("untitled".to_string()));

    let diff = Comparator::default().compare_schemas(&blog, &to);
    assert_eq!(diff.changed_tables.len(), 1);

    let table_diff = &diff.changed_tables[0];
    assert!(table_diff.added_columns.is_empty());
    assert!(table_diff.dropped_columns.is_empty());
    assert_eq!(table_diff.changed_columns.len(), 1);
    assert_eq!(
        table_diff.changed_columns[0].changed_properties,
        vec![ColumnProperty::Default]
    );
}

#[rstest]
fn identical_column_under_new_name_is_a_rename(blog: Schema) {
    let mut to = blog.clone();
    to.table_mut("posts").unwrap().rename_column("title", "headline").unwrap();

    let diff = Comparator::default().compare_schemas(&blog, &to);
    let table_diff = &diff.changed_tables[0];

    assert!(table_diff.added_columns.is_empty());
    assert!(table_diff.dropped_columns.is_empty());
    assert_eq!(table_diff.renamed_columns.len(), 1);
    assert_eq!(table_diff.renamed_columns["title"].name(), "headline");
}

#[rstest]
fn renames_can_be_disabled(blog: Schema) {
    let mut to = blog.clone();
    to.table_mut("posts").unwrap().rename_column("title", "headline").unwrap();

    let comparator = Comparator::new(ComparatorConfig {
        detect_column_renames: false,
        ..Default::default()
    });
    let diff = comparator.compare_schemas(&blog, &to);
    let table_diff = &diff.changed_tables[0];

    assert!(table_diff.renamed_columns.is_empty());
    assert_eq!(table_diff.added_columns.len(), 1);
    assert_eq!(table_diff.dropped_columns.len(), 1);
}

#[test]
fn primary_key_reorder_changes_the_primary_index() {
    let mut from = Table::new("test").unwrap();
    from.add_column(Column::new("foo_id", Type::Integer)).unwrap();
    from.add_column(Column::new("bar_id", Type::Integer)).unwrap();
    let mut to = from.clone();
    from.set_primary_key(&["foo_id", "bar_id"], None).unwrap();
    to.set_primary_key(&["bar_id", "foo_id"], None).unwrap();

    let diff = Comparator::default().compare_tables(&from, &to).unwrap();
    assert_eq!(diff.changed_indexes.len(), 1);
    assert!(diff.changed_indexes[0].is_primary());
    assert!(diff.added_indexes.is_empty());
    assert!(diff.dropped_indexes.is_empty());
}

#[rstest]
fn new_and_removed_tables(blog: Schema) {
    let mut to = blog.clone();
    to.drop_table("posts").unwrap();
    let tags = to.create_table("tags").unwrap();
    tags.add_column(Column::new("id", Type::Integer)).unwrap();

    let diff = Comparator::default().compare_schemas(&blog, &to);
    assert_eq!(diff.new_tables.len(), 1);
    assert_eq!(diff.new_tables[0].name(), "tags");
    assert_eq!(diff.removed_tables.len(), 1);
    assert_eq!(diff.removed_tables[0].name(), "posts");
}

#[rstest]
fn foreign_keys_into_removed_tables_are_orphaned(blog: Schema) {
    let mut from = blog.clone();
    let comments = from.create_table("comments").unwrap();
    comments.add_column(Column::new("id", Type::Integer)).unwrap();
    comments.add_column(Column::new("post_id", Type::Integer)).unwrap();
    comments
        .add_foreign_key_constraint(
            ForeignKeyConstraint::new(&["post_id"], "posts", &["id"], Some("fk_comment_post")).unwrap(),
        )
        .unwrap();

    let mut to = from.clone();
    to.drop_table("posts").unwrap();
    to.table_mut("comments")
        .unwrap()
        .remove_foreign_key("fk_comment_post")
        .unwrap();

    let diff = Comparator::default().compare_schemas(&from, &to);
    assert_eq!(diff.orphaned_foreign_keys.len(), 1);
    assert_eq!(diff.orphaned_foreign_keys[0].name(), "fk_comment_post");
    assert!(diff
        .changed_tables
        .iter()
        .all(|table_diff| table_diff.dropped_foreign_keys.is_empty()));
}

#[rstest]
fn sequence_changes(blog: Schema) {
    let mut to = blog.clone();
    to.drop_sequence("posts_seq").unwrap();
    to.add_sequence(Sequence::new("posts_seq").unwrap().allocation_size(20))
        .unwrap();
    to.create_sequence("users_seq", 1, 1).unwrap();

    let diff = Comparator::default().compare_schemas(&blog, &to);
    assert_eq!(diff.changed_sequences.len(), 1);
    assert_eq!(diff.new_sequences.len(), 1);
    assert!(diff.removed_sequences.is_empty());
}

#[test]
fn default_namespace_tables_match_unqualified_names() {
    let config = SchemaConfig::default().with_name("public");
    let mut from = Schema::new(config.clone());
    from.create_table("public.users")
        .unwrap()
        .add_column(Column::new("id", Type::Integer))
        .unwrap();
    let mut to = Schema::new(config);
    to.create_table("users")
        .unwrap()
        .add_column(Column::new("id", Type::Integer))
        .unwrap();

    assert!(Comparator::default().compare_schemas(&from, &to).is_empty());
}

#[test]
fn clones_are_independent() {
    let mut original = Table::new("users").unwrap();
    original.add_column(Column::new("id", Type::Integer)).unwrap();
    let mut copy = original.clone();
    copy.column_mut("id").unwrap().nullable = true;
    copy.add_column(Column::new("email", Type::String)).unwrap();

    assert!(!original.column("id").unwrap().nullable);
    assert!(!original.has_column("email"));
}

#[test]
fn mysql_inherited_charset_is_not_a_change() {
    let mut from = Table::new("posts").unwrap();
    from.add_column(Column::new("title", Type::String)).unwrap();
    from.add_option("charset", "utf8mb4");

    let mut to = Table::new("posts").unwrap();
    to.add_column(Column::new("title", Type::String).charset("utf8mb4"))
        .unwrap();
    to.add_option("charset", "utf8mb4");

    let plain = Comparator::default();
    assert!(plain.compare_tables(&from, &to).is_some());

    let normalizer =
        MySqlNormalizer::with_static(DefaultTableOptions::default(), StaticCharsetMetadata::builtin());
    let comparator = Comparator::default().with_normalizer(Box::new(normalizer));
    assert!(comparator.compare_tables(&from, &to).is_none());
}
