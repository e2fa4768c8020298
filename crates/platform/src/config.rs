// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Platform configuration
//!
//! One document, JSON or YAML, describing logging, cache and edit defaults
//! and the data sources to register at startup.
//!
//! ## Example
//!
//! ```yaml
//! log_filter: "sqlmeta_cache=debug,info"
//! cache:
//!   sort_by_name: true
//! edit:
//!   revert_on_failure: false
//! data_sources:
//!   - id: warehouse
//!     name: Warehouse
//!     dialect: postgresql
//!     default_schema: public
//! ```

use serde::{Deserialize, Serialize};
use sqlmeta_cache::CacheConfig;
use sqlmeta_edit::EditConfig;
use sqlmeta_model::Dialect;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed
    #[error("Cannot parse {format} configuration: {message}")]
    Parse {
        format: ConfigFormat,
        message: String,
    },

    /// The configuration file could not be read
    #[error("Cannot read configuration file {path}: {message}")]
    Io { path: String, message: String },

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// No data source with this id is configured
    #[error("Unknown data source '{0}'")]
    UnknownDataSource(String),

    /// Two data sources share an id
    #[error("Duplicate data source id '{0}'")]
    DuplicateId(String),
}

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Guess from a file extension; anything but `.json` is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Json => f.write_str("JSON"),
            ConfigFormat::Yaml => f.write_str("YAML"),
        }
    }
}

/// One database connection known to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Registry key, unique per platform
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub dialect: Dialect,

    /// Overrides the platform-wide cache case sensitivity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    /// Schema used when callers do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
}

impl DataSourceConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dialect,
            case_sensitive: None,
            default_schema: None,
        }
    }

    /// Builder method: set default schema
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Builder method: override case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Cache settings for this data source
    pub fn cache_config(&self, defaults: CacheConfig) -> CacheConfig {
        match self.case_sensitive {
            Some(case_sensitive) => defaults.with_case_sensitive(case_sensitive),
            None => defaults,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Validation("data source id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "data source '{}' has an empty name",
                self.id
            )));
        }
        if self.default_schema.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "data source '{}' has an empty default schema",
                self.id
            )));
        }
        Ok(())
    }
}

/// Top-level platform configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// `tracing` filter directives; `RUST_LOG` is used when unset
    pub log_filter: Option<String>,

    pub cache: CacheConfig,

    pub edit: EditConfig,

    pub data_sources: Vec<DataSourceConfig>,
}

impl PlatformConfig {
    /// Parse and validate a document
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: PlatformConfig = match format {
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| ConfigError::Parse {
                format,
                message: e.to_string(),
            })?,
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
                format,
                message: e.to_string(),
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, ConfigFormat::Json)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, ConfigFormat::Yaml)
    }

    /// Read, parse and validate a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text, ConfigFormat::from_path(path))
    }

    /// Check ids, names and the log filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(filter) = &self.log_filter {
            EnvFilter::try_new(filter).map_err(|e| {
                ConfigError::Validation(format!("invalid log filter '{filter}': {e}"))
            })?;
        }
        let mut seen = HashSet::new();
        for source in &self.data_sources {
            source.validate()?;
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::DuplicateId(source.id.clone()));
            }
        }
        Ok(())
    }

    /// Data source configuration by id
    pub fn data_source(&self, id: &str) -> Result<&DataSourceConfig, ConfigError> {
        self.data_sources
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ConfigError::UnknownDataSource(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
log_filter: "sqlmeta_cache=debug,info"
cache:
  sort_by_name: true
edit:
  revert_on_failure: true
data_sources:
  - id: warehouse
    name: Warehouse
    dialect: postgresql
    default_schema: public
  - id: shop
    name: Shop
    dialect: mysql
    case_sensitive: true
"#;

    #[test]
    fn test_parse_yaml() {
        let config = PlatformConfig::from_yaml(YAML).unwrap();
        assert!(config.cache.sort_by_name);
        assert!(!config.cache.case_sensitive);
        assert!(config.edit.revert_on_failure);
        assert_eq!(config.data_sources.len(), 2);

        let warehouse = config.data_source("warehouse").unwrap();
        assert_eq!(warehouse.dialect, Dialect::PostgreSQL);
        assert_eq!(warehouse.default_schema.as_deref(), Some("public"));

        let shop = config.data_source("shop").unwrap();
        assert!(shop.cache_config(config.cache).case_sensitive);
        assert!(matches!(
            config.data_source("nope"),
            Err(ConfigError::UnknownDataSource(_))
        ));
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let config = PlatformConfig::from_json(
            r#"{ "data_sources": [ { "id": "local", "name": "Local" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.log_filter, None);
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.data_sources[0].dialect, Dialect::Generic);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = PlatformConfig::from_json(
            r#"{ "data_sources": [
                { "id": "a", "name": "A" },
                { "id": "a", "name": "Again" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_validation_errors() {
        let err = PlatformConfig::from_json(r#"{ "data_sources": [ { "id": "a", "name": " " } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = PlatformConfig::from_json(r#"{ "log_filter": "sqlmeta=loud" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_errors_name_the_format() {
        let err = PlatformConfig::from_yaml("data_sources: [").unwrap_err();
        assert!(err.to_string().starts_with("Cannot parse YAML configuration"));

        let err = PlatformConfig::from_json("{").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Parse {
                format: ConfigFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
    }
}
