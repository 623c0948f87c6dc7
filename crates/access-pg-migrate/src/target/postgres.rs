//! PostgreSQL target writer.
//!
//! Implements the `TargetWriter` trait over tokio-postgres. The pool holds a
//! single connection, reused for every statement of the run, and each bulk
//! load is a text-format COPY inside its own transaction.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::SinkExt;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::schema::TargetTable;
use crate::core::traits::{CopyPayload, TargetWriter};
use crate::ddl::{self, SchemaPlan};
use crate::error::{MigrateError, Result};

use super::tls::{make_tls_connect, SslMode};

/// PostgreSQL writer.
pub struct PgWriter {
    pool: Pool,
    endpoint: String,
}

impl PgWriter {
    /// Connect to the destination and verify the connection with `SELECT 1`.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let endpoint = config.endpoint();

        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("access-pg-migrate");
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let mgr = match make_tls_connect(ssl_mode)? {
            Some(tls) => Manager::from_config(pg_config, tls, mgr_config),
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config)
            }
        };

        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| MigrateError::connection(&endpoint, e))?;

        let writer = Self { pool, endpoint };
        let client = writer.client().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(&writer.endpoint, pg_message(&e)))?;
        drop(client);

        info!("Connected to PostgreSQL target: {}", writer.endpoint);
        Ok(writer)
    }

    async fn client(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::connection(&self.endpoint, e))
    }

    async fn copy_chunks(
        &self,
        client: &mut Object,
        table: &TargetTable,
        payload: &mut CopyPayload<'_>,
    ) -> Result<u64> {
        let full_name = table.full_name();
        let copy_sql = ddl::copy_sql(table)?;
        debug!("COPY statement: {}", copy_sql);

        let tx = client
            .transaction()
            .await
            .map_err(|e| MigrateError::bulk_load(&full_name, format!("BEGIN: {}", pg_message(&e))))?;

        let mut sink = Box::pin(
            tx.copy_in::<_, Bytes>(&copy_sql)
                .await
                .map_err(|e| MigrateError::bulk_load(&full_name, format!("COPY init: {}", pg_message(&e))))?,
        );

        for chunk in payload {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Dropping the sink aborts the COPY; the rollback discards the table's rows.
                    drop(sink);
                    if let Err(rb) = tx.rollback().await {
                        warn!("Rollback of {} failed: {}", full_name, pg_message(&rb));
                    }
                    return Err(e);
                }
            };
            sink.send(chunk)
                .await
                .map_err(|e| MigrateError::bulk_load(&full_name, format!("COPY send: {}", pg_message(&e))))?;
        }

        let rows = sink
            .as_mut()
            .finish()
            .await
            .map_err(|e| MigrateError::bulk_load(&full_name, format!("COPY finish: {}", pg_message(&e))))?;

        tx.commit()
            .await
            .map_err(|e| MigrateError::bulk_load(&full_name, format!("COMMIT: {}", pg_message(&e))))?;

        Ok(rows)
    }
}

/// Prefer the server's message (and detail) over the generic client error text.
fn pg_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} ({})", db.message(), detail),
            None => db.message().to_string(),
        },
        None => err.to_string(),
    }
}

#[async_trait]
impl TargetWriter for PgWriter {
    async fn create_schema(&self, schema: &str) -> Result<()> {
        let sql = ddl::create_schema_sql(schema)?;
        let client = self.client().await?;
        client
            .batch_execute(&sql)
            .await
            .map_err(|e| MigrateError::schema(schema, pg_message(&e)))?;

        debug!("Created schema '{}'", schema);
        Ok(())
    }

    async fn create_table(&self, plan: &SchemaPlan) -> Result<()> {
        let client = self.client().await?;
        client
            .batch_execute(&plan.create_table)
            .await
            .map_err(|e| MigrateError::schema(plan.table.full_name(), pg_message(&e)))?;

        debug!("Created table {}", plan.table.full_name());
        Ok(())
    }

    async fn bulk_load(&self, table: &TargetTable, payload: &mut CopyPayload<'_>) -> Result<u64> {
        let mut client = self.client().await?;
        let rows = self.copy_chunks(&mut client, table, payload).await?;
        debug!("Loaded {} rows into {}", rows, table.full_name());
        Ok(rows)
    }

    fn db_type(&self) -> &str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close();
        debug!("Closed PostgreSQL target {}", self.endpoint);
    }
}
