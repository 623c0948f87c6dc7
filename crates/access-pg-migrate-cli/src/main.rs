//! access-pg-migrate CLI - Microsoft Access to PostgreSQL migration.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use access_pg_migrate::core::ProgressKind;
use access_pg_migrate::{Config, MigrateError, Orchestrator, ProgressEvent, ProgressSink};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "access-pg-migrate")]
#[command(about = "Migrate Microsoft Access databases to PostgreSQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Timeout in seconds for graceful shutdown (default: 60)
    #[arg(long, default_value = "60")]
    shutdown_timeout: u64,

    /// Print progress updates as JSON lines to stderr
    #[arg(long)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every table of the Access database
    Run {
        /// Override the Access database file
        #[arg(long)]
        source_path: Option<PathBuf>,

        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,
    },

    /// Show the DDL and COPY statements without loading data
    Plan {
        /// Override the Access database file
        #[arg(long)]
        source_path: Option<PathBuf>,

        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,
    },

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            eprintln!("Migration cancelled");
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            source_path,
            target_schema,
        } => {
            apply_overrides(&mut config, source_path, target_schema)?;

            let cancel_token = setup_signal_handler(cli.shutdown_timeout);
            let orchestrator = Orchestrator::connect(config)
                .await?
                .with_progress(progress_sink(cli.progress));

            let result = run_with_shutdown_timeout(
                orchestrator.run(cancel_token.clone()),
                &cancel_token,
                cli.shutdown_timeout,
            )
            .await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Tables: {} loaded, {} empty, {} total",
                    result.tables_completed, result.tables_empty, result.tables_total
                );
                println!("  Rows: {}", result.rows_transferred);
                println!("  Throughput: {} rows/sec", result.rows_per_second);
                if result.replacements > 0 {
                    println!(
                        "  Cells with replaced characters: {} (see log)",
                        result.replacements
                    );
                }
            }
        }

        Commands::Plan {
            source_path,
            target_schema,
        } => {
            apply_overrides(&mut config, source_path, target_schema)?;

            let plans = Orchestrator::connect(config).await?.plan().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                if let Some(first) = plans.first() {
                    println!("{};", first.create_schema);
                }
                for plan in &plans {
                    println!("{};", plan.create_table);
                    println!("-- {}", plan.copy_statement);
                }
                println!("\n{} tables planned", plans.len());
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::health_check(&config).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (Access): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (PostgreSQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                let endpoint = if result.source_connected {
                    config.target.endpoint()
                } else {
                    config.source.path.display().to_string()
                };
                return Err(MigrateError::connection(endpoint, "health check failed"));
            }
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    source_path: Option<PathBuf>,
    target_schema: Option<String>,
) -> Result<(), MigrateError> {
    if let Some(path) = source_path {
        config.source.path = path;
    }
    if let Some(schema) = target_schema {
        config.target.schema = schema;
    }
    config.validate()
}

/// Progress as JSON lines on stderr.
struct JsonLinesProgress;

impl ProgressSink for JsonLinesProgress {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            eprintln!("{}", line);
        }
    }
}

/// Progress through the log; row ticks only at debug level.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, event: &ProgressEvent) {
        match event.kind {
            ProgressKind::RowsEncoded => debug!("[{:>3}%] {}", event.percent, event.message),
            _ => info!("[{:>3}%] {}", event.percent, event.message),
        }
    }
}

fn progress_sink(json_lines: bool) -> Arc<dyn ProgressSink> {
    if json_lines {
        Arc::new(JsonLinesProgress)
    } else {
        Arc::new(LogProgress)
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Await the run; once cancelled, give it `shutdown_timeout` seconds to roll
/// back and close before giving up.
async fn run_with_shutdown_timeout<F, T>(
    run: F,
    cancel: &CancellationToken,
    shutdown_timeout: u64,
) -> Result<T, MigrateError>
where
    F: std::future::Future<Output = Result<T, MigrateError>>,
{
    tokio::pin!(run);
    tokio::select! {
        result = &mut run => result,
        _ = async {
            cancel.cancelled().await;
            tokio::time::sleep(Duration::from_secs(shutdown_timeout)).await;
        } => {
            warn!("Shutdown timeout of {}s exceeded, exiting", shutdown_timeout);
            Err(MigrateError::Cancelled)
        }
    }
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler(shutdown_timeout: u64) -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to install {} handler: {}", name, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!(
                "\nReceived {}. Rolling back the current table (timeout: {}s)...",
                name, shutdown_timeout
            );
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler(shutdown_timeout: u64) -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            return;
        }
        eprintln!(
            "\nReceived Ctrl-C. Rolling back the current table (timeout: {}s)...",
            shutdown_timeout
        );
        token.cancel();
    });

    cancel_token
}
