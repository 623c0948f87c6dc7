//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (Microsoft Access file).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// How text columns are fetched from the ODBC driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Fetch raw narrow bytes and decode them with `source.encoding`.
    #[default]
    Narrow,

    /// Fetch UTF-16 from the driver; `source.encoding` only applies to binary cells.
    Wide,
}

/// Source database (Microsoft Access) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "access" for now).
    #[serde(default = "default_access")]
    pub r#type: String,

    /// Path to the `.mdb` / `.accdb` file.
    pub path: PathBuf,

    /// ODBC driver name.
    #[serde(default = "default_access_driver")]
    pub driver: String,

    /// Database password, if the file is protected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Character encoding of legacy text (any WHATWG label, default: windows-1252).
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Text fetch mode (default: narrow).
    #[serde(default)]
    pub text_mode: TextMode,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("path", &self.path)
            .field("driver", &self.driver)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("encoding", &self.encoding)
            .field("text_mode", &self.text_mode)
            .finish()
    }
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "postgres" for now).
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    #[serde(default = "default_localhost")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Target schema (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Destination connection parameters as supplied by an invoking context.
#[derive(Clone, Default)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Append-only log of lossy character replacements.
    #[serde(default = "default_replacement_log")]
    pub replacement_log: PathBuf,

    /// Number of intermediate progress ticks per table (default: 50).
    #[serde(default = "default_progress_ticks")]
    pub progress_ticks: usize,

    /// Rows encoded per COPY chunk (default: 10000).
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: usize,

    /// Tables to migrate (exact names). Empty means all.
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Tables to skip (exact names).
    #[serde(default)]
    pub exclude_tables: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            replacement_log: default_replacement_log(),
            progress_ticks: default_progress_ticks(),
            chunk_rows: default_chunk_rows(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
        }
    }
}

impl MigrationConfig {
    /// Check whether a source table passes the include/exclude filters.
    pub fn includes_table(&self, name: &str) -> bool {
        if self.exclude_tables.iter().any(|t| t == name) {
            return false;
        }
        self.include_tables.is_empty() || self.include_tables.iter().any(|t| t == name)
    }
}

// Default value functions for serde
fn default_access() -> String {
    "access".to_string()
}

fn default_postgres() -> String {
    "postgres".to_string()
}

pub(crate) fn default_access_driver() -> String {
    "Microsoft Access Driver (*.mdb, *.accdb)".to_string()
}

pub(crate) fn default_encoding() -> String {
    "windows-1252".to_string()
}

fn default_localhost() -> String {
    "localhost".to_string()
}

pub(crate) fn default_pg_port() -> u16 {
    5432
}

fn default_public_schema() -> String {
    "public".to_string()
}

pub(crate) fn default_disable() -> String {
    "disable".to_string()
}

pub(crate) fn default_connect_timeout() -> u64 {
    30
}

fn default_replacement_log() -> PathBuf {
    PathBuf::from("access2pg_replacements.log")
}

fn default_progress_ticks() -> usize {
    50
}

fn default_chunk_rows() -> usize {
    10_000
}
