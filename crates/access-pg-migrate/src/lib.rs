//! # access-pg-migrate
//!
//! Microsoft Access to PostgreSQL migration library.
//!
//! Every user table of an Access database is copied into a PostgreSQL
//! schema:
//!
//! - **Schema synthesis** with coarse, never-failing type mapping
//! - **Bulk loads** using PostgreSQL text-format COPY, one transaction per table
//! - **Legacy text decoding** with a configurable encoding policy and an
//!   audit log of cells that lost characters
//! - **Progress and cancellation** through a callback and a cancellation token
//!
//! ## Example
//!
//! ```rust,no_run
//! use access_pg_migrate::{migrate, ConnectionParams};
//!
//! #[tokio::main]
//! async fn main() -> access_pg_migrate::Result<()> {
//!     let params = ConnectionParams {
//!         host: "localhost".into(),
//!         port: 5432,
//!         dbname: "destino".into(),
//!         user: "postgres".into(),
//!         password: "secret".into(),
//!     };
//!     let result = migrate("ventas.accdb", &params, "legacy", |msg: &str, pct: u8| {
//!         println!("[{:>3}%] {}", pct, msg);
//!     })
//!     .await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod encoder;
pub mod error;
pub mod orchestrator;
pub mod sanitize;
pub mod source;
pub mod target;
pub mod typemap;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

// Re-exports for convenient access
pub use crate::config::{Config, ConnectionParams, MigrationConfig, SourceConfig, TargetConfig, TextMode};
pub use crate::core::{ProgressEvent, ProgressSink};
pub use crate::error::{MigrateError, Result};
pub use crate::orchestrator::{HealthCheckResult, MigrationResult, Orchestrator, RunStatus};
pub use crate::sanitize::{FileReplacementLog, MemoryReplacementLog, ReplacementLog};
pub use crate::source::AccessReader;
pub use crate::target::PgWriter;
pub use crate::typemap::{map_type, TargetColumnType};

/// Migrate every table of the Access file at `source_path` into
/// `target_schema` of the PostgreSQL database described by `params`.
///
/// Uses default settings for everything else (windows-1252 text, replacement
/// log `access2pg_replacements.log` in the working directory).
pub async fn migrate<P>(
    source_path: impl AsRef<Path>,
    params: &ConnectionParams,
    target_schema: &str,
    progress: P,
) -> Result<MigrationResult>
where
    P: ProgressSink + 'static,
{
    let config = Config::from_params(source_path.as_ref(), params, target_schema)?;
    Orchestrator::connect(config)
        .await?
        .with_progress(Arc::new(progress))
        .run(CancellationToken::new())
        .await
}
