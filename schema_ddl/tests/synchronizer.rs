use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePoolOptions;

use schema_ddl::comparator::{DefaultTableOptions, MySqlNormalizer, StaticCharsetMetadata};
use schema_ddl::db::{Connection, DatabaseConnection, SchemaSynchronizer, SnapshotProvider};
use schema_ddl::platform::{MySqlPlatform, PostgresPlatform, SqlitePlatform};
use schema_ddl::Comparator;
use schema_ddl::schema::{Column, ForeignKeyConstraint, Schema};
use schema_ddl::{Error, Result, Type};

/// Records statements and fails the ones containing `fail_on`
#[derive(Default)]
struct FakeConnection {
    executed: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl FakeConnection {
    fn failing_on(fragment: &'static str) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail_on: Some(fragment),
        }
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn exec(&self, sql: &str) -> Result<u64> {
        if let Some(fragment) = self.fail_on {
            if sql.contains(fragment) {
                return Err(Error::DatabaseError(format!("failed: {}", sql)));
            }
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(1)
    }

    async fn fetch_one(&self, _sql: &str, _params: &[&str]) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Answers charset lookups like a server that knows `koi8r`
#[derive(Default)]
struct CharsetServer {
    lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl Connection for CharsetServer {
    async fn exec(&self, _sql: &str) -> Result<u64> {
        Ok(0)
    }

    async fn fetch_one(&self, sql: &str, params: &[&str]) -> Result<Option<String>> {
        let name = params.first().copied().unwrap_or_default();
        self.lookups.lock().unwrap().push(name.to_string());
        let answer = if sql.contains("CHARACTER_SETS") && name == "koi8r" {
            Some("koi8r_general_ci")
        } else if sql.contains("COLLATIONS") && name == "koi8r_general_ci" {
            Some("koi8r")
        } else {
            None
        };
        Ok(answer.map(str::to_string))
    }
}

fn koi8r_posts(collation: Option<&str>) -> Schema {
    let mut schema = Schema::default();
    let posts = schema.create_table("posts").unwrap();
    posts.add_column(Column::new("id", Type::Integer)).unwrap();
    posts.add_option("charset", "koi8r");
    if let Some(collation) = collation {
        posts.add_option("collation", collation);
    }
    schema
}

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
    users.add_unique_index(&["email"], Some("uniq_email")).unwrap();

    let posts = schema.create_table("posts").unwrap();
    posts.add_column(Column::new("id", Type::Integer)).unwrap();
    posts.add_column(Column::new("user_id", Type::Integer)).unwrap();
    posts
        .add_column(Column::new("body", Type::Text).nullable(true))
        .unwrap();
    posts.set_primary_key(&["id"], None).unwrap();
    posts
        .add_foreign_key_constraint(
            ForeignKeyConstraint::new(&["user_id"], "users", &["id"], None).unwrap(),
        )
        .unwrap();

    schema
}

async fn sqlite_memory() -> DatabaseConnection {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    DatabaseConnection::Sqlite(pool)
}

async fn table_exists(connection: &DatabaseConnection, name: &str) -> bool {
    connection
        .fetch_one(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[name],
        )
        .await
        .unwrap()
        .is_some()
}

#[tokio::test]
async fn strict_mode_stops_at_the_first_failure() {
    let connection = Arc::new(FakeConnection::failing_on("posts"));
    let synchronizer = SchemaSynchronizer::new(connection.clone(), Box::new(PostgresPlatform::new()));

    let result = synchronizer.create_schema(&blog()).await;

    assert!(matches!(result, Err(Error::DatabaseError(_))));
    assert!(connection.executed().iter().all(|sql| !sql.contains("posts")));
}

#[tokio::test]
async fn safe_mode_keeps_going() {
    let connection = Arc::new(FakeConnection::failing_on("first"));
    let synchronizer = SchemaSynchronizer::new(connection.clone(), Box::new(PostgresPlatform::new()));

    let statements = vec![
        "DROP TABLE first".to_string(),
        "DROP TABLE second".to_string(),
    ];
    synchronizer.process_sql_safely(&statements).await;

    assert_eq!(connection.executed(), vec!["DROP TABLE second".to_string()]);
}

#[tokio::test]
async fn no_drops_keeps_removed_tables() {
    let connection = Arc::new(FakeConnection::default());
    let mut target = blog();
    target.drop_table("posts").unwrap();

    let synchronizer = SchemaSynchronizer::new(connection, Box::new(PostgresPlatform::new()))
        .with_provider(Box::new(SnapshotProvider::new(blog())));

    let safe = synchronizer.get_update_schema(&target, true).await.unwrap();
    assert!(safe.iter().all(|sql| !sql.starts_with("DROP TABLE")));

    let full = synchronizer.get_update_schema(&target, false).await.unwrap();
    assert!(full.contains(&"DROP TABLE posts".to_string()));
}

#[tokio::test]
async fn drop_schema_only_touches_deployed_tables() {
    let connection = Arc::new(FakeConnection::default());
    let mut deployed = blog();
    deployed.drop_table("posts").unwrap();

    let synchronizer = SchemaSynchronizer::new(connection, Box::new(PostgresPlatform::new()))
        .with_provider(Box::new(SnapshotProvider::new(deployed)));

    assert_eq!(
        synchronizer.get_drop_schema(&blog()).await.unwrap(),
        vec!["DROP TABLE users".to_string()]
    );
}

#[tokio::test]
async fn sqlite_create_then_update_is_a_no_op() {
    let connection = Arc::new(sqlite_memory().await);
    let schema = blog();

    let synchronizer = SchemaSynchronizer::new(connection.clone(), Box::new(SqlitePlatform::new()))
        .with_provider(Box::new(SnapshotProvider::new(schema.clone())));
    synchronizer.create_schema(&schema).await.unwrap();

    assert!(table_exists(&connection, "users").await);
    assert!(table_exists(&connection, "posts").await);
    assert!(synchronizer.get_update_schema(&schema, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_rebuild_keeps_rows() {
    let connection = Arc::new(sqlite_memory().await);
    let mut before = Schema::default();
    let tags = before.create_table("tags").unwrap();
    tags.add_column(Column::new("id", Type::Integer)).unwrap();
    tags.add_column(Column::new("label", Type::String).length(20))
        .unwrap();
    tags.set_primary_key(&["id"], None).unwrap();

    let mut after = before.clone();
    after
        .table_mut("tags")
        .unwrap()
        .column_mut("label")
        .unwrap()
        .length = Some(80);
    after
        .table_mut("tags")
        .unwrap()
        .add_column(Column::new("note", Type::Text).nullable(true))
        .unwrap();

    SchemaSynchronizer::new(connection.clone(), Box::new(SqlitePlatform::new()))
        .create_schema(&before)
        .await
        .unwrap();
    connection
        .exec("INSERT INTO tags (id, label) VALUES (1, 'rust')")
        .await
        .unwrap();

    SchemaSynchronizer::new(connection.clone(), Box::new(SqlitePlatform::new()))
        .with_provider(Box::new(SnapshotProvider::new(before)))
        .update_schema(&after, false)
        .await
        .unwrap();

    let label = connection
        .fetch_one("SELECT label FROM tags WHERE id = 1", &[])
        .await
        .unwrap();
    assert_eq!(label.as_deref(), Some("rust"));
    assert!(!table_exists(&connection, "__temp__tags").await);
}

#[tokio::test]
async fn sqlite_drop_all_removes_everything() {
    let connection = Arc::new(sqlite_memory().await);
    let schema = blog();
    let synchronizer = SchemaSynchronizer::new(connection.clone(), Box::new(SqlitePlatform::new()))
        .with_provider(Box::new(SnapshotProvider::new(schema.clone())));

    synchronizer.create_schema(&schema).await.unwrap();
    synchronizer.drop_all_schema().await.unwrap();

    assert!(!table_exists(&connection, "users").await);
    assert!(!table_exists(&connection, "posts").await);
}

#[tokio::test]
async fn live_charset_metadata_resolves_server_defaults() {
    let connection = Arc::new(CharsetServer::default());
    let deployed = koi8r_posts(Some("koi8r_general_ci"));
    let target = koi8r_posts(None);

    let builtin = SchemaSynchronizer::new(connection.clone(), Box::new(MySqlPlatform::mysql80()))
        .with_provider(Box::new(SnapshotProvider::new(deployed.clone())))
        .with_comparator(Comparator::default().with_normalizer(Box::new(
            MySqlNormalizer::with_static(DefaultTableOptions::default(), StaticCharsetMetadata::builtin()),
        )));
    assert!(!builtin.get_update_schema(&target, false).await.unwrap().is_empty());

    let live = SchemaSynchronizer::new(connection.clone(), Box::new(MySqlPlatform::mysql80()))
        .with_provider(Box::new(SnapshotProvider::new(deployed)))
        .with_live_charset_metadata(DefaultTableOptions::default());
    assert!(live.get_update_schema(&target, false).await.unwrap().is_empty());

    let lookups = connection.lookups.lock().unwrap().clone();
    assert_eq!(lookups, vec!["koi8r".to_string(), "koi8r_general_ci".to_string()]);
}
