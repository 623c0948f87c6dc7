//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from the arguments of a direct `migrate` call.
    pub fn from_params(
        source_path: impl Into<PathBuf>,
        params: &ConnectionParams,
        target_schema: &str,
    ) -> Result<Self> {
        let config = Config {
            source: SourceConfig {
                r#type: "access".to_string(),
                path: source_path.into(),
                driver: default_access_driver(),
                password: None,
                encoding: default_encoding(),
                text_mode: TextMode::default(),
            },
            target: TargetConfig {
                r#type: "postgres".to_string(),
                host: params.host.clone(),
                port: if params.port == 0 {
                    default_pg_port()
                } else {
                    params.port
                },
                database: params.dbname.clone(),
                user: params.user.clone(),
                password: params.password.clone(),
                schema: target_schema.to_string(),
                ssl_mode: default_disable(),
                connect_timeout_secs: default_connect_timeout(),
            },
            migration: MigrationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build an ODBC connection string for the Access driver.
    pub fn connection_string(&self) -> String {
        let mut conn_str = format!("Driver={{{}}};DBQ={};", self.driver, self.path.display());
        if let Some(ref pwd) = self.password {
            conn_str.push_str(&format!("PWD={};", pwd));
        }
        conn_str
    }

    /// Resolve the configured legacy text encoding.
    pub fn text_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            MigrateError::Config(format!(
                "source.encoding '{}' is not a recognized encoding label",
                self.encoding
            ))
        })
    }
}

impl TargetConfig {
    /// Human-readable endpoint for logs and errors (no credentials).
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
source:
  path: C:\datos\ventas.accdb
target:
  database: ventas
  user: postgres
  password: secret
"#;

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.source.driver, "Microsoft Access Driver (*.mdb, *.accdb)");
        assert_eq!(config.source.encoding, "windows-1252");
        assert_eq!(config.source.text_mode, TextMode::Narrow);
        assert_eq!(config.target.host, "localhost");
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.target.schema, "public");
        assert_eq!(config.target.ssl_mode, "disable");
        assert_eq!(config.migration.progress_ticks, 50);
        assert_eq!(config.migration.chunk_rows, 10_000);
        assert_eq!(
            config.migration.replacement_log,
            PathBuf::from("access2pg_replacements.log")
        );
    }

    #[test]
    fn test_connection_string() {
        let mut config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(
            config.source.connection_string(),
            "Driver={Microsoft Access Driver (*.mdb, *.accdb)};DBQ=C:\\datos\\ventas.accdb;"
        );
        config.source.password = Some("pw".to_string());
        assert!(config.source.connection_string().ends_with("PWD=pw;"));
    }

    #[test]
    fn test_text_encoding_resolution() {
        let mut config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.source.text_encoding().unwrap(), encoding_rs::WINDOWS_1252);
        config.source.encoding = "utf-8".to_string();
        assert_eq!(config.source.text_encoding().unwrap(), encoding_rs::UTF_8);
        config.source.encoding = "klingon".to_string();
        assert!(config.source.text_encoding().is_err());
    }

    #[test]
    fn test_from_params() {
        let params = ConnectionParams {
            host: "db.local".to_string(),
            port: 0,
            dbname: "erp".to_string(),
            user: "migrador".to_string(),
            password: "x".to_string(),
        };
        let config = Config::from_params("legacy.mdb", &params, "legado").unwrap();
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.target.schema, "legado");
        assert_eq!(config.target.endpoint(), "db.local:5432/erp");
    }

    #[test]
    fn test_from_params_requires_schema() {
        let params = ConnectionParams {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "erp".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        };
        assert!(Config::from_params("legacy.mdb", &params, "").is_err());
    }

    #[test]
    fn test_table_filters() {
        let mut migration = MigrationConfig::default();
        assert!(migration.includes_table("Clientes"));
        migration.exclude_tables = vec!["MSysObjects".to_string()];
        assert!(!migration.includes_table("MSysObjects"));
        migration.include_tables = vec!["Pedidos".to_string()];
        assert!(migration.includes_table("Pedidos"));
        assert!(!migration.includes_table("Clientes"));
    }
}
