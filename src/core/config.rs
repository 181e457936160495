//! Connection configuration
//!
//! [`ConnectionBuilder`] collects everything needed to open a [`Database`]:
//! the storage location, connection parameters passed to SQLite verbatim,
//! and table definitions that must always be present. [`DatabaseConfig`] is
//! the same settings in a serde-friendly shape, e.g. loaded from JSON.

use super::database::Database;
use super::error::Result;
use super::query_builder::TableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Serializable connection settings
///
/// ```
/// use lite_tables::DatabaseConfig;
///
/// let config = DatabaseConfig::from_json_str(
///     r#"{ "path": ":memory:", "pragmas": { "cache_size": "-2000" } }"#,
/// ).unwrap();
/// assert!(config.foreign_keys);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Storage location (`:memory:`, a file path or a `file:` URI)
    pub path: String,
    /// Open the database read-only
    pub read_only: bool,
    /// Enable `PRAGMA foreign_keys`
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds
    pub busy_timeout_ms: Option<u64>,
    /// Extra pragmas, applied verbatim as `PRAGMA name = value`
    pub pragmas: BTreeMap<String, String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            read_only: false,
            foreign_keys: true,
            busy_timeout_ms: None,
            pragmas: BTreeMap::new(),
        }
    }
}

impl DatabaseConfig {
    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Turn the settings into a builder
    pub fn into_builder(self) -> ConnectionBuilder {
        ConnectionBuilder::from(self)
    }
}

/// Database connection builder
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    path: String,
    read_only: bool,
    foreign_keys: bool,
    busy_timeout: Option<Duration>,
    pragmas: Vec<(String, String)>,
    definitions: Vec<TableDefinition>,
}

impl ConnectionBuilder {
    /// Create a builder for the given storage location
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            read_only: false,
            foreign_keys: true,
            busy_timeout: None,
            pragmas: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Open the database read-only
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Enable or disable foreign key enforcement (on by default)
    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set how long to wait on a locked database file
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Add a pragma, passed to SQLite as `PRAGMA name = value` verbatim
    #[must_use]
    pub fn pragma<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.pragmas.push((name.into(), value.into()));
        self
    }

    /// Declare a table that discovery creates whenever it is missing
    #[must_use]
    pub fn define_table(mut self, definition: TableDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn foreign_keys_enabled(&self) -> bool {
        self.foreign_keys
    }

    pub fn busy_timeout_value(&self) -> Option<Duration> {
        self.busy_timeout
    }

    pub fn pragmas(&self) -> &[(String, String)] {
        &self.pragmas
    }

    pub fn definitions(&self) -> &[TableDefinition] {
        &self.definitions
    }

    /// Open the connection and run table discovery
    pub fn open(self) -> Result<Database> {
        Database::from_builder(self)
    }
}

impl From<DatabaseConfig> for ConnectionBuilder {
    fn from(config: DatabaseConfig) -> Self {
        let mut builder = ConnectionBuilder::new(config.path)
            .read_only(config.read_only)
            .foreign_keys(config.foreign_keys);
        if let Some(ms) = config.busy_timeout_ms {
            builder = builder.busy_timeout(Duration::from_millis(ms));
        }
        for (name, value) in config.pragmas {
            builder = builder.pragma(name, value);
        }
        builder
    }
}
