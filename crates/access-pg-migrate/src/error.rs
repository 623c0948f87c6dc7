//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration errors (invalid YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the source or target cannot be reached.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for source catalog or row fetch failures.
pub const EXIT_SOURCE_ERROR: u8 = 3;
/// Exit code when destination DDL is rejected.
pub const EXIT_SCHEMA_ERROR: u8 = 4;
/// Exit code when a bulk load is rejected by the destination.
pub const EXIT_BULK_LOAD_ERROR: u8 = 5;
/// Exit code for JSON serialization failures.
pub const EXIT_SERIALIZATION_ERROR: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for a user-initiated stop (mirrors SIGINT convention).
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source or destination could not be reached or rejected the credentials.
    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Source catalog enumeration or row fetch failed.
    #[error("Source error for table {table}: {message}")]
    Source { table: String, message: String },

    /// Destination rejected a CREATE SCHEMA / CREATE TABLE statement.
    #[error("Schema creation failed for {table}: {message}")]
    SchemaCreation { table: String, message: String },

    /// Destination rejected the COPY payload for a table.
    #[error("Bulk load failed for table {table}: {message}")]
    BulkLoad { table: String, message: String },

    /// Target database error not attributed to a specific table.
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled by the invoking context (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Connection error for the named endpoint.
    pub fn connection(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a Source error.
    pub fn source(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Source {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a SchemaCreation error.
    pub fn schema(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::SchemaCreation {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a BulkLoad error.
    pub fn bulk_load(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::BulkLoad {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a user-initiated stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrateError::Cancelled)
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Source { .. } => EXIT_SOURCE_ERROR,
            MigrateError::SchemaCreation { .. } => EXIT_SCHEMA_ERROR,
            MigrateError::BulkLoad { .. } | MigrateError::Target(_) => EXIT_BULK_LOAD_ERROR,
            MigrateError::Json(_) => EXIT_SERIALIZATION_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::connection("PostgreSQL", "refused").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(
            MigrateError::schema("Clientes", "syntax").exit_code(),
            EXIT_SCHEMA_ERROR
        );
        assert_eq!(
            MigrateError::bulk_load("Clientes", "extra data").exit_code(),
            EXIT_BULK_LOAD_ERROR
        );
        assert_eq!(MigrateError::Cancelled.exit_code(), EXIT_CANCELLED);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(MigrateError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(MigrateError::Cancelled.is_cancelled());
        assert!(!MigrateError::bulk_load("t", "boom").is_cancelled());
    }

    #[test]
    fn test_display_includes_table() {
        let err = MigrateError::bulk_load("Pedidos", "extra data after last expected column");
        assert_eq!(
            err.to_string(),
            "Bulk load failed for table Pedidos: extra data after last expected column"
        );
        assert!(err.format_detailed().starts_with("Error: Bulk load failed"));
    }
}
