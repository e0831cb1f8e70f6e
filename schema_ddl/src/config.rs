//! Configuration handling for schema_ddl

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::comparator::{
    Comparator, ComparatorConfig, DefaultTableOptions, MySqlNormalizer, StaticCharsetMetadata,
};
use crate::error::{Error, Result};
use crate::platform::{platform_for, Platform};
use crate::schema::database::SchemaConfig;
use crate::schema::types::{Type, TypeRegistry};

/// Load configuration from a TOML or YAML file, chosen by extension
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    match extension(path).as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e))),
        _ => toml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase)
}

/// Represents the complete schema_ddl configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub comparator: ComparatorConfig,
    #[serde(default)]
    pub synchronizer: SynchronizerConfig,
    #[serde(default)]
    pub types: TypesConfig,
    pub logging: Option<LoggingConfig>,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    /// Default namespace of the target database
    pub schema: Option<String>,
}

/// SQL dialect selection
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PlatformConfig {
    /// One of `mysql57`, `mysql80`, `mariadb`, `postgres` or `sqlite`;
    /// falls back to the database driver
    pub dialect: Option<String>,
    /// Server defaults for MySQL family tables
    pub default_table_options: DefaultTableOptions,
}

/// Statement execution settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SynchronizerConfig {
    pub dry_run: bool,
}

/// Application-defined type names
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TypesConfig {
    pub aliases: IndexMap<String, Type>,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub stdout: bool,
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Dialect name in effect
    pub fn dialect(&self) -> &str {
        self.platform
            .dialect
            .as_deref()
            .unwrap_or(&self.database.driver)
    }

    pub fn platform(&self) -> Result<Box<dyn Platform>> {
        platform_for(self.dialect())
    }

    /// Built-in types plus the configured aliases
    pub fn type_registry(&self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        for (name, ty) in &self.types.aliases {
            registry.register_alias(name, *ty)?;
        }
        Ok(registry)
    }

    /// Comparator normalizing MySQL family tables with builtin charset data
    pub fn comparator(&self) -> Result<Comparator> {
        self.comparator_with_metadata(StaticCharsetMetadata::builtin())
    }

    /// Comparator normalizing MySQL family tables with the given charset data
    pub fn comparator_with_metadata(&self, metadata: StaticCharsetMetadata) -> Result<Comparator> {
        let comparator = Comparator::new(self.comparator.clone());
        if self.is_mysql_family()? {
            let normalizer = MySqlNormalizer::with_static(
                self.platform.default_table_options.clone(),
                metadata,
            );
            Ok(comparator.with_normalizer(Box::new(normalizer)))
        } else {
            Ok(comparator)
        }
    }

    /// Whether the configured dialect is MySQL, MySQL 8 or MariaDB
    pub fn is_mysql_family(&self) -> Result<bool> {
        Ok(is_mysql_family(self.platform()?.name()))
    }

    /// Settings for schemas built against the configured database
    pub fn schema_config(&self) -> Result<SchemaConfig> {
        let platform = self.platform()?;
        let config = SchemaConfig::default().with_max_identifier_length(platform.max_identifier_length());
        Ok(match &self.database.schema {
            Some(name) => config.with_name(name),
            None => config,
        })
    }
}

fn is_mysql_family(platform: &str) -> bool {
    matches!(platform, "mysql57" | "mysql80" | "mariadb")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            driver = "sqlite"
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect(), "sqlite");
        assert!(config.comparator.detect_column_renames);
        assert!(!config.comparator.detect_index_renames);
        assert!(!config.synchronizer.dry_run);
        assert_eq!(config.platform().unwrap().name(), "sqlite");
    }

    #[test]
    fn dialect_overrides_driver() {
        let config: Config = toml::from_str(
            r#"
            [database]
            driver = "mysql"
            url = "mysql://localhost/app"

            [platform]
            dialect = "mariadb"
            "#,
        )
        .unwrap();

        assert_eq!(config.platform().unwrap().name(), "mariadb");
    }
}
