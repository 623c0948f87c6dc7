//! Core traits for the migration seams.
//!
//! - [`SourceReader`]: reads the catalog and rows of the legacy database
//! - [`TargetWriter`]: creates schema objects and bulk-loads rows into PostgreSQL
//!
//! Both are object-safe so the orchestrator can hold `Arc<dyn ...>` and tests
//! can substitute in-memory implementations.

use async_trait::async_trait;
use bytes::Bytes;

use crate::ddl::SchemaPlan;
use crate::error::Result;

use super::schema::{SourceColumn, SourceTable, TargetTable};
use super::value::Row;

/// Streamed COPY payload: an iterator of encoded chunks.
///
/// Each item is either a chunk of tab-delimited rows or the error that
/// stopped encoding (including cancellation).
pub type CopyPayload<'a> = dyn Iterator<Item = Result<Bytes>> + Send + 'a;

/// Read catalog metadata and rows from the legacy source.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Names of all user tables, in catalog order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table in catalog order.
    async fn columns(&self, table: &str) -> Result<Vec<SourceColumn>>;

    /// Build a full table descriptor.
    ///
    /// Template method over [`columns`](Self::columns).
    async fn describe_table(&self, table: &str) -> Result<SourceTable> {
        let columns = self.columns(table).await?;
        Ok(SourceTable::new(table, columns))
    }

    /// Fetch every row of a table, cells in column order.
    async fn fetch_rows(&self, table: &SourceTable) -> Result<Vec<Row>>;

    /// Get the database type identifier (e.g., "access").
    fn db_type(&self) -> &str;

    /// Release the connection.
    async fn close(&self);
}

/// Write schema objects and data to the destination.
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Create the target schema if it doesn't exist.
    async fn create_schema(&self, schema: &str) -> Result<()>;

    /// Execute the planned CREATE TABLE statement.
    async fn create_table(&self, plan: &SchemaPlan) -> Result<()>;

    /// Stream a COPY payload into the table inside a single transaction.
    ///
    /// Returns the number of rows the destination accepted. On any error the
    /// transaction is rolled back and no rows from this call remain.
    async fn bulk_load(&self, table: &TargetTable, payload: &mut CopyPayload<'_>) -> Result<u64>;

    /// Get the database type identifier (e.g., "postgres").
    fn db_type(&self) -> &str;

    /// Release the connection.
    async fn close(&self);
}
