use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

use schema_ddl::config::load_from_file;
use schema_ddl::schema::{load_definition_file, Column, SchemaConfig, Table};
use schema_ddl::{Error, Type};

const TOML_CONFIG: &str = r#"
[database]
driver = "mysql"
url = "mysql://root@localhost/app"
schema = "app"

[platform]
dialect = "mysql57"

[platform.default_table_options]
charset = "latin1"
collation = "latin1_swedish_ci"
engine = "InnoDB"

[comparator]
detect_index_renames = true

[synchronizer]
dry_run = true

[types.aliases]
money = "decimal"
uuid = "guid"

[logging]
level = "debug"
format = "json"
"#;

const YAML_CONFIG: &str = r#"
database:
  driver: postgres
  url: postgres://localhost/app
comparator:
  detect_column_renames: false
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn posts(charset: Option<&str>) -> Table {
    let mut table = Table::new("posts").unwrap();
    table.add_column(Column::new("id", Type::Integer)).unwrap();
    if let Some(charset) = charset {
        table.add_option("charset", charset);
    }
    table
}

#[test]
fn toml_config_is_loaded() {
    let dir = TempDir::new().unwrap();
    let config = load_from_file(write(&dir, "schema_ddl.toml", TOML_CONFIG)).unwrap();

    assert_eq!(config.platform().unwrap().name(), "mysql57");
    assert!(config.synchronizer.dry_run);
    assert!(config.comparator.detect_column_renames);
    assert!(config.comparator.detect_index_renames);
    assert_eq!(config.platform.default_table_options.charset, "latin1");
    assert_eq!(config.logging.as_ref().unwrap().format, "json");
    assert_eq!(config.schema_config().unwrap().name.as_deref(), Some("app"));

    let registry = config.type_registry().unwrap();
    assert_eq!(registry.get("money").unwrap(), Type::Decimal);
    assert_eq!(registry.get("UUID").unwrap(), Type::Guid);
}

#[test]
fn yaml_config_is_loaded() {
    let dir = TempDir::new().unwrap();
    let config = load_from_file(write(&dir, "schema_ddl.yaml", YAML_CONFIG)).unwrap();

    assert_eq!(config.platform().unwrap().name(), "postgresql");
    assert!(!config.comparator.detect_column_renames);
    assert!(!config.synchronizer.dry_run);
    assert!(config.logging.is_none());
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let result = load_from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn mysql_comparator_knows_the_server_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_from_file(write(&dir, "schema_ddl.toml", TOML_CONFIG)).unwrap();
    let comparator = config.comparator().unwrap();

    assert!(comparator
        .compare_tables(&posts(Some("latin1")), &posts(None))
        .is_none());
    assert!(comparator
        .compare_tables(&posts(Some("utf8mb4")), &posts(None))
        .is_some());
}

#[test]
fn other_platforms_compare_options_verbatim() {
    let dir = TempDir::new().unwrap();
    let config = load_from_file(write(&dir, "schema_ddl.yml", YAML_CONFIG)).unwrap();
    let comparator = config.comparator().unwrap();

    assert!(comparator
        .compare_tables(&posts(Some("latin1")), &posts(None))
        .is_some());
}

#[test]
fn aliases_cannot_shadow_builtin_types() {
    let dir = TempDir::new().unwrap();
    let content = TOML_CONFIG.replace("uuid = \"guid\"", "text = \"guid\"");
    let config = load_from_file(write(&dir, "schema_ddl.toml", &content)).unwrap();
    assert!(config.type_registry().is_err());
}

#[rstest]
#[case("blog.json", r#"{"tables": [{"name": "users", "columns": [{"name": "id", "type": "bigint"}], "primary_key": ["id"]}]}"#)]
#[case("blog.yaml", "tables:\n  - name: users\n    columns:\n      - { name: id, type: bigint }\n    primary_key: [id]\n")]
#[case("blog.toml", "[[tables]]\nname = \"users\"\nprimary_key = [\"id\"]\n\n[[tables.columns]]\nname = \"id\"\ntype = \"bigint\"\n")]
fn definition_files_build_the_same_schema(#[case] name: &str, #[case] content: &str) {
    let dir = TempDir::new().unwrap();
    let definition = load_definition_file(write(&dir, name, content)).unwrap();
    let schema = definition
        .into_schema(&schema_ddl::schema::TypeRegistry::new(), SchemaConfig::default())
        .unwrap();

    let users = schema.table("users").unwrap();
    assert_eq!(users.column("id").unwrap().column_type, Type::BigInt);
    assert!(users.primary_key().is_some());
}

#[test]
fn unknown_definition_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = load_definition_file(write(&dir, "blog.xml", "<tables/>"));
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
