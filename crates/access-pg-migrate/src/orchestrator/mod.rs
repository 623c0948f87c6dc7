//! Migration orchestrator - main workflow coordinator.
//!
//! Tables are migrated one at a time in catalog order:
//! inspect → create → extract → encode/load. Each table's load is its own
//! transaction, so a stopped or failed run leaves earlier tables committed
//! and the interrupted one empty.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::core::progress::{NoProgress, ProgressEvent, ProgressSink};
use crate::core::traits::{SourceReader, TargetWriter};
use crate::ddl::{self, SchemaPlan};
use crate::encoder::{EncoderOptions, RowStreamEncoder};
use crate::error::{MigrateError, Result};
use crate::sanitize::{FileReplacementLog, ReplacementLog, Sanitizer};
use crate::source::AccessReader;
use crate::target::PgWriter;

/// Run phases, logged at debug level on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Connecting,
    Inspecting,
    Creating,
    Extracting,
    Encoding,
    Loading,
    Completed,
    Cancelled,
    Failed,
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    Failed,
}

/// Outcome for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Rows were loaded and committed.
    Completed,
    /// Table created, source had no rows.
    Empty,
}

/// Per-table summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: usize,
    pub status: TableStatus,
    pub rows_loaded: u64,
    pub replacements: u64,
    pub duration_ms: u64,
    /// Columns stored as TEXT because their type name was not recognized.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_warnings: Vec<String>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: RunStatus,

    /// Destination schema.
    pub target_schema: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables selected for migration.
    pub tables_total: usize,

    /// Tables whose rows were loaded.
    pub tables_completed: usize,

    /// Tables created without rows.
    pub tables_empty: usize,

    /// Total rows transferred.
    pub rows_transferred: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Cells that lost characters during sanitization.
    pub replacements: u64,

    /// Per-table outcomes, in migration order.
    pub tables: Vec<TableSummary>,

    /// Error message when the run did not complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of probing both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn SourceReader>,
    target: Arc<dyn TargetWriter>,
    progress: Arc<dyn ProgressSink>,
    replacement_log: Arc<dyn ReplacementLog>,
}

impl Orchestrator {
    /// Open the Access source and the PostgreSQL destination.
    ///
    /// A failure on either side is a `Connection` error and no table is touched.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        log_phase(None, RunPhase::Idle, RunPhase::Connecting);

        let source = AccessReader::new(&config.source).await?;
        let target = match PgWriter::connect(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        Ok(Self::from_parts(config, Arc::new(source), Arc::new(target)))
    }

    /// Build an orchestrator over any reader/writer pair.
    pub fn from_parts(
        config: Config,
        source: Arc<dyn SourceReader>,
        target: Arc<dyn TargetWriter>,
    ) -> Self {
        let replacement_log = Arc::new(FileReplacementLog::new(&config.migration.replacement_log));
        Self {
            config,
            source,
            target,
            progress: Arc::new(NoProgress),
            replacement_log,
        }
    }

    /// Report progress to `sink`.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Record lossy cells in `log` instead of the configured file.
    pub fn with_replacement_log(mut self, log: Arc<dyn ReplacementLog>) -> Self {
        self.replacement_log = log;
        self
    }

    /// Run the migration.
    ///
    /// Both connections are closed before returning, whatever the outcome.
    pub async fn run(self, cancel: CancellationToken) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {}", run_id);

        let sanitizer = match Sanitizer::from_config(&self.config.source) {
            Ok(sanitizer) => sanitizer,
            Err(e) => {
                self.source.close().await;
                self.target.close().await;
                return Err(e);
            }
        };
        debug!("Source text decoding policy: {}", sanitizer.encoding_name());

        let mut summaries = Vec::new();
        let mut tables_total = 0;
        let outcome = self
            .migrate_tables(&cancel, &sanitizer, &mut tables_total, &mut summaries)
            .await;

        self.source.close().await;
        self.target.close().await;

        let status = match &outcome {
            Ok(()) => RunStatus::Completed,
            Err(e) if e.is_cancelled() => RunStatus::Cancelled,
            Err(_) => RunStatus::Failed,
        };
        let final_phase = match status {
            RunStatus::Completed => RunPhase::Completed,
            RunStatus::Cancelled => RunPhase::Cancelled,
            RunStatus::Failed => RunPhase::Failed,
        };
        log_phase(None, RunPhase::Loading, final_phase);

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let rows_transferred: u64 = summaries.iter().map(|s| s.rows_loaded).sum();
        let rows_per_second = if duration > 0.0 {
            (rows_transferred as f64 / duration) as u64
        } else {
            0
        };

        let result = MigrationResult {
            run_id,
            status,
            target_schema: self.config.target.schema.clone(),
            started_at,
            completed_at,
            duration_seconds: duration,
            tables_total,
            tables_completed: summaries
                .iter()
                .filter(|s| s.status == TableStatus::Completed)
                .count(),
            tables_empty: summaries
                .iter()
                .filter(|s| s.status == TableStatus::Empty)
                .count(),
            rows_transferred,
            rows_per_second,
            replacements: sanitizer.replacements(),
            tables: summaries,
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };

        info!(
            "Migration {:?}: {}/{} tables, {} rows in {:.1}s ({} rows/s), {} replacements",
            result.status,
            result.tables_completed + result.tables_empty,
            result.tables_total,
            result.rows_transferred,
            result.duration_seconds,
            result.rows_per_second,
            result.replacements
        );

        match outcome {
            Ok(()) => Ok(result),
            Err(e) => {
                if e.is_cancelled() {
                    warn!("Migration cancelled");
                } else {
                    error!("Migration failed: {}", e);
                }
                Err(e)
            }
        }
    }

    async fn migrate_tables(
        &self,
        cancel: &CancellationToken,
        sanitizer: &Sanitizer,
        tables_total: &mut usize,
        summaries: &mut Vec<TableSummary>,
    ) -> Result<()> {
        let schema = &self.config.target.schema;

        log_phase(None, RunPhase::Connecting, RunPhase::Creating);
        self.target.create_schema(schema).await?;

        let tables = self.selected_tables().await?;
        *tables_total = tables.len();
        info!("Found {} tables to migrate", tables.len());

        for name in &tables {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }
            let summary = self.migrate_table(name, cancel, sanitizer).await?;
            summaries.push(summary);
        }

        self.progress.report(&ProgressEvent::run_completed());
        Ok(())
    }

    async fn migrate_table(
        &self,
        name: &str,
        cancel: &CancellationToken,
        sanitizer: &Sanitizer,
    ) -> Result<TableSummary> {
        let started = Instant::now();
        let schema = &self.config.target.schema;

        self.progress.report(&ProgressEvent::table_started(name));
        info!("Migrating table {}", name);

        log_phase(Some(name), RunPhase::Creating, RunPhase::Inspecting);
        let source_table = self.source.describe_table(name).await?;
        let target_table = source_table.to_target(schema);
        let plan = ddl::plan_schema(&target_table)?;

        log_phase(Some(name), RunPhase::Inspecting, RunPhase::Creating);
        self.target.create_table(&plan).await?;

        log_phase(Some(name), RunPhase::Creating, RunPhase::Extracting);
        let rows = self.source.fetch_rows(&source_table).await?;

        if rows.is_empty() {
            self.progress.report(&ProgressEvent::table_empty(name));
            info!("{}: no data", name);
            return Ok(TableSummary {
                name: name.to_string(),
                columns: target_table.columns.len(),
                status: TableStatus::Empty,
                rows_loaded: 0,
                replacements: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                type_warnings: target_table.type_warnings,
            });
        }

        log_phase(Some(name), RunPhase::Extracting, RunPhase::Encoding);
        let replacements_before = sanitizer.replacements();
        let mut encoder = RowStreamEncoder::new(
            name,
            target_table.column_names(),
            &rows,
            EncoderOptions {
                chunk_rows: self.config.migration.chunk_rows,
                progress_ticks: self.config.migration.progress_ticks,
            },
            sanitizer,
            self.replacement_log.as_ref(),
            self.progress.as_ref(),
            cancel.clone(),
        );

        log_phase(Some(name), RunPhase::Encoding, RunPhase::Loading);
        let rows_loaded = self.target.bulk_load(&target_table, &mut encoder).await?;
        if rows_loaded != encoder.rows_encoded() as u64 {
            warn!(
                "{}: destination reported {} rows, {} were encoded",
                name,
                rows_loaded,
                encoder.rows_encoded()
            );
        }

        self.progress.report(&ProgressEvent::table_completed(name));
        let summary = TableSummary {
            name: name.to_string(),
            columns: target_table.columns.len(),
            status: TableStatus::Completed,
            rows_loaded,
            replacements: sanitizer.replacements() - replacements_before,
            duration_ms: started.elapsed().as_millis() as u64,
            type_warnings: target_table.type_warnings,
        };
        info!(
            "{}: {} rows loaded in {}ms ({} replacements)",
            name, summary.rows_loaded, summary.duration_ms, summary.replacements
        );
        Ok(summary)
    }

    /// Source tables in catalog order, after include/exclude filters.
    async fn selected_tables(&self) -> Result<Vec<String>> {
        let all = self.source.list_tables().await?;
        let selected: Vec<String> = all
            .into_iter()
            .filter(|name| {
                let keep = self.config.migration.includes_table(name);
                if !keep {
                    debug!("Skipping table {} (filtered)", name);
                }
                keep
            })
            .collect();
        Ok(selected)
    }

    /// Dry run: inspect the source and return the DDL/COPY plan per table.
    ///
    /// Nothing is executed against the destination.
    pub async fn plan(self) -> Result<Vec<SchemaPlan>> {
        let outcome = self.build_plans().await;
        self.source.close().await;
        self.target.close().await;
        outcome
    }

    async fn build_plans(&self) -> Result<Vec<SchemaPlan>> {
        let schema = &self.config.target.schema;
        let mut plans = Vec::new();
        for name in self.selected_tables().await? {
            let source_table = self.source.describe_table(&name).await?;
            plans.push(ddl::plan_schema(&source_table.to_target(schema))?);
        }
        info!("Planned {} tables", plans.len());
        Ok(plans)
    }

    /// Probe both endpoints independently.
    pub async fn health_check(config: &Config) -> Result<HealthCheckResult> {
        config.validate()?;

        let start = Instant::now();
        let (source_connected, source_error) = match AccessReader::new(&config.source).await {
            Ok(reader) => {
                reader.close().await;
                (true, None)
            }
            Err(e) => (false, Some(e.to_string())),
        };
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let (target_connected, target_error) = match PgWriter::connect(&config.target).await {
            Ok(writer) => {
                writer.close().await;
                (true, None)
            }
            Err(e) => (false, Some(e.to_string())),
        };
        let target_latency_ms = start.elapsed().as_millis() as u64;

        Ok(HealthCheckResult {
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
            healthy: source_connected && target_connected,
        })
    }
}

fn log_phase(table: Option<&str>, from: RunPhase, to: RunPhase) {
    match table {
        Some(table) => debug!("{}: {:?} -> {:?}", table, from, to),
        None => debug!("run: {:?} -> {:?}", from, to),
    }
}
