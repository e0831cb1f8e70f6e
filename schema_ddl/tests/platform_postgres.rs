use pretty_assertions::assert_eq;

use schema_ddl::platform::{Platform, PostgresPlatform};
use schema_ddl::schema::{Column, DefaultValue, ForeignKeyConstraint, Schema, Sequence, Table};
use schema_ddl::{Comparator, Type};

#[test]
fn foreign_keys_carry_deferrable_clauses() {
    let mut table = Table::new("test").unwrap();
    table.add_column(Column::new("foo_id", Type::Integer)).unwrap();
    table
        .add_foreign_key_constraint(
            ForeignKeyConstraint::new(&["foo_id"], "test_foreign", &["foo_id"], None).unwrap(),
        )
        .unwrap();

    assert_eq!(
        PostgresPlatform::new().create_table_sql(&table).unwrap(),
        vec![
            "CREATE TABLE test (foo_id INT NOT NULL)".to_string(),
            "CREATE INDEX IDX_D87F7E0C8E48560F ON test (foo_id)".to_string(),
            "ALTER TABLE test ADD CONSTRAINT FK_D87F7E0C8E48560F FOREIGN KEY (foo_id) REFERENCES test_foreign (foo_id) NOT DEFERRABLE INITIALLY IMMEDIATE".to_string(),
        ]
    );
}

#[test]
fn nullable_and_default_become_separate_statements() {
    let mut from = Table::new("posts").unwrap();
    from.add_column(Column::new("title", Type::String)).unwrap();
    let mut to = from.clone();
    {
        let title = to.column_mut("title").unwrap();
        title.nullable = true;
        title.default = Some(DefaultValue::String("draft".to_string()));
    }

    let diff = Comparator::default().compare_tables(&from, &to).unwrap();
    assert_eq!(
        PostgresPlatform::new().alter_table_sql(&diff).unwrap(),
        vec![
            "ALTER TABLE posts ALTER title SET DEFAULT 'draft'".to_string(),
            "ALTER TABLE posts ALTER title DROP NOT NULL".to_string(),
        ]
    );
}

#[test]
fn type_change_uses_alter_type() {
    let mut from = Table::new("posts").unwrap();
    from.add_column(Column::new("title", Type::String).length(50))
        .unwrap();
    let mut to = Table::new("posts").unwrap();
    to.add_column(Column::new("title", Type::String).length(120))
        .unwrap();

    let diff = Comparator::default().compare_tables(&from, &to).unwrap();
    assert_eq!(
        PostgresPlatform::new().alter_table_sql(&diff).unwrap(),
        vec!["ALTER TABLE posts ALTER title TYPE VARCHAR(120)".to_string()]
    );
}

#[test]
fn namespaces_and_sequences_come_before_tables() {
    let mut schema = Schema::default();
    schema.create_namespace("blog").unwrap();
    schema
        .add_sequence(Sequence::new("blog.posts_seq").unwrap())
        .unwrap();
    schema
        .create_table("blog.posts")
        .unwrap()
        .add_column(Column::new("id", Type::BigInt))
        .unwrap();

    assert_eq!(
        schema.to_sql(&PostgresPlatform::new()).unwrap(),
        vec![
            "CREATE SCHEMA blog".to_string(),
            "CREATE SEQUENCE blog.posts_seq INCREMENT BY 1 MINVALUE 1 START 1".to_string(),
            "CREATE TABLE blog.posts (id BIGINT NOT NULL)".to_string(),
        ]
    );
}

#[test]
fn partial_indexes_keep_their_predicate() {
    let mut table = Table::new("users").unwrap();
    table.add_column(Column::new("email", Type::String)).unwrap();
    table.add_column(Column::new("active", Type::Boolean)).unwrap();
    let mut options = indexmap::IndexMap::new();
    options.insert("where".to_string(), serde_json::json!("active = true"));
    let index = schema_ddl::Index::with_flags("idx_active_email", &["email"], false, false, &[], options)
        .unwrap();

    assert_eq!(
        PostgresPlatform::new()
            .create_index_sql(&index, table.identifier())
            .unwrap(),
        "CREATE INDEX idx_active_email ON users (email) WHERE active = true"
    );
}

#[test]
fn logical_type_change_casts_explicitly() {
    let mut from = Table::new("orders").unwrap();
    from.add_column(Column::new("code", Type::String).length(20))
        .unwrap();
    let mut to = Table::new("orders").unwrap();
    to.add_column(Column::new("code", Type::Integer)).unwrap();

    let diff = Comparator::default().compare_tables(&from, &to).unwrap();
    assert_eq!(
        PostgresPlatform::new().alter_table_sql(&diff).unwrap(),
        vec!["ALTER TABLE orders ALTER code TYPE INT USING code::INT".to_string()]
    );
}
