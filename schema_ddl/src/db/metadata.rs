//! Charset and collation lookups against a live MySQL server

use std::collections::BTreeSet;

use tracing::debug;

use crate::comparator::StaticCharsetMetadata;
use crate::db::connection::Connection;
use crate::error::Result;
use crate::schema::column::{CHARSET, COLLATION};
use crate::schema::database::Schema;

const DEFAULT_COLLATION_SQL: &str =
    "SELECT DEFAULT_COLLATE_NAME FROM information_schema.CHARACTER_SETS WHERE CHARACTER_SET_NAME = ?";
const COLLATION_CHARSET_SQL: &str =
    "SELECT CHARACTER_SET_NAME FROM information_schema.COLLATIONS WHERE COLLATION_NAME = ?";

/// Resolve every charset and collation mentioned by `schemas` on the server.
///
/// The result starts from [`StaticCharsetMetadata::builtin`]; server answers
/// take precedence and names the server does not know keep their builtin
/// mapping, if any.
pub async fn load_mysql_metadata(
    connection: &dyn Connection,
    schemas: &[&Schema],
) -> Result<StaticCharsetMetadata> {
    let mut charsets = BTreeSet::new();
    let mut collations = BTreeSet::new();

    for schema in schemas {
        for table in schema.tables() {
            if let Some(charset) = table.option(CHARSET) {
                charsets.insert(charset.to_lowercase());
            }
            if let Some(collation) = table.option(COLLATION) {
                collations.insert(collation.to_lowercase());
            }
            for column in table.columns() {
                if let Some(charset) = column.platform_option_str(CHARSET) {
                    charsets.insert(charset.to_lowercase());
                }
                if let Some(collation) = column.platform_option_str(COLLATION) {
                    collations.insert(collation.to_lowercase());
                }
            }
        }
    }

    let mut metadata = StaticCharsetMetadata::builtin();
    for charset in &charsets {
        if let Some(collation) = connection.fetch_one(DEFAULT_COLLATION_SQL, &[charset.as_str()]).await? {
            metadata.add_charset(charset, &collation);
        }
    }
    for collation in &collations {
        if let Some(charset) = connection.fetch_one(COLLATION_CHARSET_SQL, &[collation.as_str()]).await? {
            metadata.add_collation(collation, &charset);
        }
    }

    debug!(
        "Loaded metadata for {} charsets and {} collations",
        charsets.len(),
        collations.len()
    );
    Ok(metadata)
}
