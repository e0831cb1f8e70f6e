use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use schema_ddl::platform::{MySqlPlatform, PostgresPlatform, SqlitePlatform};
use schema_ddl::schema::{Column, ForeignKeyConstraint, Schema};
use schema_ddl::{DependencyOrderCalculator, DropSchemaObjectsSqlBuilder, Type};

fn add_table(schema: &mut Schema, name: &str, references: Option<&str>) {
    let table = schema.create_table(name).unwrap();
    table.add_column(Column::new("id", Type::Integer)).unwrap();
    table.set_primary_key(&["id"], None).unwrap();
    if let Some(target) = references {
        table.add_column(Column::new("parent_id", Type::Integer)).unwrap();
        table
            .add_foreign_key_constraint(
                ForeignKeyConstraint::new(&["parent_id"], target, &["id"], None).unwrap(),
            )
            .unwrap();
    }
}

/// Registered in the worst possible order
#[fixture]
fn shop() -> Schema {
    let mut schema = Schema::default();
    add_table(&mut schema, "OrderItems", Some("Orders"));
    add_table(&mut schema, "Orders", Some("Customers"));
    add_table(&mut schema, "Customers", None);
    schema
}

fn create_table_order(sql: &[String]) -> Vec<String> {
    sql.iter()
        .filter_map(|statement| statement.strip_prefix("CREATE TABLE "))
        .map(|rest| rest.split_whitespace().next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn calculator_orders_dependencies_first() {
    let mut calculator = DependencyOrderCalculator::new();
    calculator.add_node("OrderItems", "OrderItems");
    calculator.add_node("Orders", "Orders");
    calculator.add_node("Customers", "Customers");
    calculator.add_dependency("OrderItems", "Orders").unwrap();
    calculator.add_dependency("Orders", "Customers").unwrap();

    assert_eq!(calculator.sort(), vec!["Customers", "Orders", "OrderItems"]);
}

#[rstest]
fn sqlite_creates_referenced_tables_first(shop: Schema) {
    let sql = shop.to_sql(&SqlitePlatform::new()).unwrap();
    assert_eq!(create_table_order(&sql), vec!["Customers", "Orders", "OrderItems"]);
}

#[rstest]
fn postgres_adds_foreign_keys_after_all_tables(shop: Schema) {
    let sql = shop.to_sql(&PostgresPlatform::new()).unwrap();
    let last_create = sql
        .iter()
        .rposition(|statement| statement.starts_with("CREATE "))
        .unwrap();
    let first_foreign_key = sql
        .iter()
        .position(|statement| statement.contains("FOREIGN KEY"))
        .unwrap();

    assert!(last_create < first_foreign_key);
    assert_eq!(sql.iter().filter(|s| s.contains("FOREIGN KEY")).count(), 2);
}

#[rstest]
fn drop_builder_reverses_dependency_order(shop: Schema) {
    let platform = MySqlPlatform::mysql80();
    let sql = DropSchemaObjectsSqlBuilder::new(&platform).build_sql(&shop).unwrap();

    assert_eq!(
        sql,
        vec![
            "DROP TABLE OrderItems".to_string(),
            "DROP TABLE Orders".to_string(),
            "DROP TABLE Customers".to_string(),
        ]
    );
}

#[test]
fn drop_builder_breaks_cycles_with_foreign_key_drops() {
    let mut schema = Schema::default();
    add_table(&mut schema, "a", Some("b"));
    add_table(&mut schema, "b", Some("a"));

    let platform = PostgresPlatform::new();
    let sql = DropSchemaObjectsSqlBuilder::new(&platform).build_sql(&schema).unwrap();

    assert_eq!(sql.len(), 3);
    assert!(sql[0].contains("DROP CONSTRAINT"));
    assert!(sql[1].starts_with("DROP TABLE"));
    assert!(sql[2].starts_with("DROP TABLE"));
}

#[test]
fn drop_builder_includes_sequences_and_namespaces() {
    let mut schema = Schema::default();
    schema.create_namespace("audit").unwrap();
    schema.create_sequence("audit.events_seq", 1, 1).unwrap();
    add_table(&mut schema, "audit.events", None);

    let platform = PostgresPlatform::new();
    let sql = DropSchemaObjectsSqlBuilder::new(&platform).build_sql(&schema).unwrap();

    assert_eq!(
        sql,
        vec![
            "DROP TABLE audit.events".to_string(),
            "DROP SEQUENCE audit.events_seq".to_string(),
            "DROP SCHEMA audit".to_string(),
        ]
    );
}
