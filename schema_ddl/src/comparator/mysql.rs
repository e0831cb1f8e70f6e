//! MySQL aware table normalization
//!
//! MySQL reports charset and collation on every table and text column while
//! a hand written definition usually leaves them implicit. Both sides are
//! rewritten to the effective values so the comparator sees no spurious
//! changes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparator::TableNormalizer;
use crate::platform::mysql::{DEFAULT_CHARSET, DEFAULT_COLLATION, DEFAULT_ENGINE};
use crate::schema::column::{CHARSET, COLLATION};
use crate::schema::table::Table;

const ENGINE: &str = "engine";

/// Storage engines in the spelling `information_schema` reports them
const ENGINES: [&str; 11] = [
    "InnoDB",
    "MyISAM",
    "MEMORY",
    "CSV",
    "ARCHIVE",
    "BLACKHOLE",
    "MRG_MYISAM",
    "FEDERATED",
    "Aria",
    "ROCKSDB",
    "NDBCLUSTER",
];

/// Charset and collation names are case-insensitive and reported lowercase
fn canonical_name(name: &str) -> String {
    name.to_lowercase()
}

fn canonical_engine(engine: &str) -> String {
    ENGINES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(engine))
        .map_or_else(|| engine.to_string(), |known| known.to_string())
}

/// Server defaults applied to tables that do not set their own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTableOptions {
    pub charset: String,
    pub collation: String,
    pub engine: String,
}

impl Default for DefaultTableOptions {
    fn default() -> Self {
        Self {
            charset: DEFAULT_CHARSET.to_string(),
            collation: DEFAULT_COLLATION.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }
}

/// Looks up the default collation of a character set
pub trait CharsetMetadataProvider: Send + Sync {
    fn default_charset_collation(&self, charset: &str) -> Option<String>;
}

/// Looks up the character set a collation belongs to
pub trait CollationMetadataProvider: Send + Sync {
    fn collation_charset(&self, collation: &str) -> Option<String>;
}

/// In-memory charset and collation tables
#[derive(Debug, Clone, Default)]
pub struct StaticCharsetMetadata {
    charsets: HashMap<String, String>,
    collations: HashMap<String, String>,
}

impl StaticCharsetMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handful of character sets found on a stock server
    pub fn builtin() -> Self {
        let mut metadata = Self::new();
        for (charset, collation) in [
            ("utf8mb4", "utf8mb4_unicode_ci"),
            ("utf8mb3", "utf8mb3_general_ci"),
            ("utf8", "utf8_general_ci"),
            ("latin1", "latin1_swedish_ci"),
            ("ascii", "ascii_general_ci"),
            ("binary", "binary"),
        ] {
            metadata.add_charset(charset, collation);
        }
        for (collation, charset) in [
            ("utf8mb4_general_ci", "utf8mb4"),
            ("utf8mb4_bin", "utf8mb4"),
            ("utf8mb4_0900_ai_ci", "utf8mb4"),
            ("utf8_unicode_ci", "utf8"),
            ("utf8_bin", "utf8"),
            ("latin1_general_ci", "latin1"),
            ("latin1_bin", "latin1"),
        ] {
            metadata.add_collation(collation, charset);
        }
        metadata
    }

    /// Register a charset with its default collation; the collation is
    /// registered as well
    pub fn add_charset(&mut self, charset: &str, default_collation: &str) -> &mut Self {
        self.charsets
            .insert(charset.to_lowercase(), default_collation.to_string());
        self.collations
            .insert(default_collation.to_lowercase(), charset.to_string());
        self
    }

    pub fn add_collation(&mut self, collation: &str, charset: &str) -> &mut Self {
        self.collations
            .insert(collation.to_lowercase(), charset.to_string());
        self
    }

    pub fn charset_count(&self) -> usize {
        self.charsets.len()
    }
}

impl CharsetMetadataProvider for StaticCharsetMetadata {
    fn default_charset_collation(&self, charset: &str) -> Option<String> {
        self.charsets.get(&charset.to_lowercase()).cloned()
    }
}

impl CollationMetadataProvider for StaticCharsetMetadata {
    fn collation_charset(&self, collation: &str) -> Option<String> {
        self.collations.get(&collation.to_lowercase()).cloned()
    }
}

/// Rewrites tables to their effective MySQL charset, collation and engine
pub struct MySqlNormalizer {
    defaults: DefaultTableOptions,
    charsets: Arc<dyn CharsetMetadataProvider>,
    collations: Arc<dyn CollationMetadataProvider>,
}

impl MySqlNormalizer {
    pub fn new(
        defaults: DefaultTableOptions,
        charsets: Arc<dyn CharsetMetadataProvider>,
        collations: Arc<dyn CollationMetadataProvider>,
    ) -> Self {
        Self {
            defaults,
            charsets,
            collations,
        }
    }

    /// Normalizer backed by a single static metadata table
    pub fn with_static(defaults: DefaultTableOptions, metadata: StaticCharsetMetadata) -> Self {
        let metadata = Arc::new(metadata);
        Self::new(defaults, metadata.clone(), metadata)
    }

    fn charset_collation(&self, charset: &str) -> Option<String> {
        self.charsets.default_charset_collation(charset).or_else(|| {
            charset
                .eq_ignore_ascii_case(&self.defaults.charset)
                .then(|| self.defaults.collation.clone())
        })
    }

    fn collation_charset(&self, collation: &str) -> Option<String> {
        self.collations.collation_charset(collation).or_else(|| {
            collation
                .eq_ignore_ascii_case(&self.defaults.collation)
                .then(|| self.defaults.charset.clone())
        })
    }

    /// Effective table charset and collation
    fn table_charset_collation(&self, table: &Table) -> (String, String) {
        match (table.option(CHARSET), table.option(COLLATION)) {
            (Some(charset), Some(collation)) => (charset.to_string(), collation.to_string()),
            (Some(charset), None) => {
                let collation = self
                    .charset_collation(charset)
                    .unwrap_or_else(|| self.defaults.collation.clone());
                (charset.to_string(), collation)
            }
            (None, Some(collation)) => {
                let charset = self
                    .collation_charset(collation)
                    .unwrap_or_else(|| self.defaults.charset.clone());
                (charset, collation.to_string())
            }
            (None, None) => (self.defaults.charset.clone(), self.defaults.collation.clone()),
        }
    }
}

fn same(value: Option<&Value>, expected: &str) -> bool {
    value
        .and_then(Value::as_str)
        .map(|value| value.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

impl TableNormalizer for MySqlNormalizer {
    fn normalize(&self, table: &Table) -> Table {
        let mut table = table.clone();
        let (charset, collation) = self.table_charset_collation(&table);
        let (charset, collation) = (canonical_name(&charset), canonical_name(&collation));
        let engine = canonical_engine(table.option(ENGINE).unwrap_or(&self.defaults.engine));

        let options = table.options_mut();
        options.insert(CHARSET.to_string(), charset.clone());
        options.insert(COLLATION.to_string(), collation.clone());
        options.insert(ENGINE.to_string(), engine);

        for column in table.columns_mut() {
            let column_charset = column.platform_option_str(CHARSET).map(canonical_name);
            let column_collation = column.platform_option_str(COLLATION).map(canonical_name);
            for (key, value) in [(CHARSET, &column_charset), (COLLATION, &column_collation)] {
                if let Some(value) = value {
                    column
                        .platform_options
                        .insert(key.to_string(), Value::String(value.clone()));
                }
            }

            match (column_charset, column_collation) {
                (Some(column_charset), None) => {
                    if let Some(default) = self.charset_collation(&column_charset) {
                        column
                            .platform_options
                            .insert(COLLATION.to_string(), Value::String(canonical_name(&default)));
                    }
                }
                (None, Some(column_collation)) => {
                    if let Some(owner) = self.collation_charset(&column_collation) {
                        column
                            .platform_options
                            .insert(CHARSET.to_string(), Value::String(canonical_name(&owner)));
                    }
                }
                _ => {}
            }

            if same(column.platform_options.get(CHARSET), &charset) {
                column.platform_options.shift_remove(CHARSET);
            }
            if same(column.platform_options.get(COLLATION), &collation) {
                column.platform_options.shift_remove(COLLATION);
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparator;
    use crate::schema::column::Column;
    use crate::schema::types::Type;
    use pretty_assertions::assert_eq;

    fn normalizer() -> MySqlNormalizer {
        MySqlNormalizer::with_static(DefaultTableOptions::default(), StaticCharsetMetadata::builtin())
    }

    fn table_with(column: Column) -> Table {
        let mut table = Table::new("posts").unwrap();
        table.add_column(column).unwrap();
        table
    }

    #[test]
    fn defaults_fill_table_options() {
        let normalized = normalizer().normalize(&Table::new("posts").unwrap());
        assert_eq!(normalized.option(CHARSET), Some("utf8mb4"));
        assert_eq!(normalized.option(COLLATION), Some("utf8mb4_unicode_ci"));
        assert_eq!(normalized.option(ENGINE), Some("InnoDB"));
    }

    #[test]
    fn table_charset_implies_its_default_collation() {
        let mut table = Table::new("posts").unwrap();
        table.add_option(CHARSET, "latin1");
        let normalized = normalizer().normalize(&table);
        assert_eq!(normalized.option(COLLATION), Some("latin1_swedish_ci"));
    }

    #[test]
    fn inherited_column_charset_is_stripped() {
        let table = table_with(Column::new("title", Type::String).charset("utf8mb4"));
        let normalized = normalizer().normalize(&table);
        let column = normalized.column("title").unwrap();
        assert!(column.platform_options.is_empty());
    }

    #[test]
    fn differing_column_collation_is_kept() {
        let table = table_with(Column::new("title", Type::String).collation("utf8mb4_bin"));
        let normalized = normalizer().normalize(&table);
        let column = normalized.column("title").unwrap();
        assert_eq!(column.platform_option_str(COLLATION), Some("utf8mb4_bin"));
        assert_eq!(column.platform_option_str(CHARSET), None);
    }

    #[test]
    fn explicit_table_charset_equal_to_default_is_no_change() {
        let from = table_with(Column::new("title", Type::String));
        let mut to = table_with(Column::new("title", Type::String).charset("utf8mb4"));
        to.add_option(CHARSET, "utf8mb4");

        let comparator = Comparator::default().with_normalizer(Box::new(normalizer()));
        assert!(comparator.compare_tables(&from, &to).is_none());
    }

    #[test]
    fn option_spelling_is_canonical() {
        let mut from = table_with(Column::new("title", Type::String).collation("UTF8MB4_BIN"));
        from.add_option(ENGINE, "innodb");
        from.add_option(CHARSET, "UTF8MB4");
        let mut to = table_with(Column::new("title", Type::String).collation("utf8mb4_bin"));
        to.add_option(ENGINE, "InnoDB");
        to.add_option(CHARSET, "utf8mb4");

        let normalized = normalizer().normalize(&from);
        assert_eq!(normalized.option(ENGINE), Some("InnoDB"));
        assert_eq!(normalized.option(CHARSET), Some("utf8mb4"));
        assert_eq!(
            normalized.column("title").unwrap().platform_option_str(COLLATION),
            Some("utf8mb4_bin")
        );

        let comparator = Comparator::default().with_normalizer(Box::new(normalizer()));
        assert!(comparator.compare_tables(&from, &to).is_none());
    }

    #[test]
    fn unknown_engines_are_kept_verbatim() {
        let mut table = Table::new("posts").unwrap();
        table.add_option(ENGINE, "Custom_Engine");
        assert_eq!(normalizer().normalize(&table).option(ENGINE), Some("Custom_Engine"));
    }
}
