//! ODBC reader for Access (Jet/ACE) databases.
//!
//! **Requirements:**
//! - An ODBC driver that can open `.mdb`/`.accdb` files must be installed:
//!   - Windows: Microsoft Access Database Engine (ships the
//!     "Microsoft Access Driver (*.mdb, *.accdb)")
//!   - Linux/macOS: unixODBC plus an Access driver such as mdbtools-odbc,
//!     configured under the name given in `source.driver`
//!
//! ODBC calls are blocking and the driver is not thread-safe, so the single
//! connection opened by [`AccessReader::new`] is used under a mutex for the
//! whole run.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::Encoding;
use odbc_api::buffers::TextRowSet;
use odbc_api::{
    Bit, Connection, ConnectionOptions, Cursor, CursorRow, DataType, Nullable, ResultSetMetadata,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{SourceConfig, TextMode};
use crate::core::identifier::quote_access;
use crate::core::schema::{SourceColumn, SourceTable};
use crate::core::traits::SourceReader;
use crate::core::value::{CellValue, Row};
use crate::error::{MigrateError, Result};

/// Catalog rows fetched per round trip.
const CATALOG_BATCH_SIZE: usize = 500;

/// Longest catalog string (table/column/type names) fetched.
const CATALOG_MAX_STR_LEN: usize = 1024;

/// SQLTables result column holding TABLE_NAME (0-based).
const TABLES_NAME_COL: usize = 2;

/// SQLColumns result columns holding COLUMN_NAME and TYPE_NAME (0-based).
const COLUMNS_NAME_COL: usize = 3;
const COLUMNS_TYPE_COL: usize = 5;

/// How a result column is fetched from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Integer,
    Float,
    Bit,
    Exact,
    Timestamp,
    Date,
    Time,
    Binary,
    Text,
}

impl FetchKind {
    fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                FetchKind::Integer
            }
            DataType::Real | DataType::Double | DataType::Float { .. } => FetchKind::Float,
            DataType::Bit => FetchKind::Bit,
            DataType::Numeric { .. } | DataType::Decimal { .. } => FetchKind::Exact,
            DataType::Timestamp { .. } => FetchKind::Timestamp,
            DataType::Date => FetchKind::Date,
            DataType::Time { .. } => FetchKind::Time,
            DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
                FetchKind::Binary
            }
            _ => FetchKind::Text,
        }
    }
}

/// Escape `_`, `%` and the escape character itself so a table name is
/// matched literally by catalog functions that take search patterns.
fn escape_search_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | '_' | '%') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Access source reader over ODBC.
pub struct AccessReader {
    path_display: String,
    text_mode: TextMode,
    encoding: &'static Encoding,
    /// The run's only connection; `None` once closed.
    conn: Mutex<Option<Connection<'static>>>,
}

impl AccessReader {
    /// Open the Access file. The connection is kept until [`SourceReader::close`].
    ///
    /// # Errors
    ///
    /// Returns a `Connection` error if the ODBC environment cannot be created,
    /// the driver is missing, or the file cannot be opened.
    pub async fn new(config: &SourceConfig) -> Result<Self> {
        let path_display = config.path.display().to_string();
        let encoding = config.text_encoding()?;

        let env = odbc_api::environment().map_err(|e| {
            MigrateError::connection(
                &path_display,
                format!(
                    "failed to create ODBC environment: {}. \
                     Make sure an ODBC driver manager and an Access driver are installed.",
                    e
                ),
            )
        })?;

        let connection_string = config.connection_string();
        debug!(
            "ODBC connection string (credentials hidden): Driver={{{}}};DBQ={};...",
            config.driver, path_display
        );

        let conn = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| MigrateError::connection(&path_display, e))?;

        info!("Opened Access database via ODBC: {}", path_display);

        Ok(Self {
            path_display,
            text_mode: config.text_mode,
            encoding,
            conn: Mutex::new(Some(conn)),
        })
    }

    fn closed_error(&self) -> MigrateError {
        MigrateError::connection(&self.path_display, "connection already closed")
    }

    /// Decode a catalog string with the source encoding.
    fn decode_name(&self, bytes: &[u8]) -> String {
        self.encoding.decode_without_bom_handling(bytes).0.into_owned()
    }

    /// Drain a catalog cursor, keeping the requested 0-based columns.
    fn read_catalog<C: Cursor>(
        &self,
        mut cursor: C,
        table: &str,
        wanted: &[usize],
    ) -> Result<Vec<Vec<Option<String>>>> {
        let mut buffers =
            TextRowSet::for_cursor(CATALOG_BATCH_SIZE, &mut cursor, Some(CATALOG_MAX_STR_LEN))
                .map_err(|e| MigrateError::source(table, format!("binding catalog buffer: {}", e)))?;
        let mut row_cursor = cursor
            .bind_buffer(&mut buffers)
            .map_err(|e| MigrateError::source(table, format!("binding catalog buffer: {}", e)))?;

        let mut rows = Vec::new();
        while let Some(batch) = row_cursor
            .fetch()
            .map_err(|e| MigrateError::source(table, format!("reading catalog: {}", e)))?
        {
            for row_idx in 0..batch.num_rows() {
                let row = wanted
                    .iter()
                    .map(|&col| batch.at(col, row_idx).map(|b| self.decode_name(b)))
                    .collect();
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn list_tables_sync(&self, conn: &Connection<'_>) -> Result<Vec<String>> {
        let cursor = conn
            .tables("", "", "", "TABLE")
            .map_err(|e| MigrateError::source("<catalog>", format!("listing tables: {}", e)))?;

        let rows = self.read_catalog(cursor, "<catalog>", &[TABLES_NAME_COL])?;
        Ok(rows
            .into_iter()
            .filter_map(|mut r| r.pop().flatten())
            .filter(|name| !name.is_empty())
            .collect())
    }

    fn columns_sync(&self, conn: &Connection<'_>, table: &str) -> Result<Vec<SourceColumn>> {
        let cursor = conn
            .columns("", "", &escape_search_pattern(table), "")
            .map_err(|e| MigrateError::source(table, format!("listing columns: {}", e)))?;

        let rows = self.read_catalog(cursor, table, &[COLUMNS_NAME_COL, COLUMNS_TYPE_COL])?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let mut it = r.into_iter();
                let name = it.next().flatten()?;
                let type_name = it.next().flatten().unwrap_or_default();
                Some(SourceColumn::new(name, type_name))
            })
            .collect())
    }

    fn fetch_rows_sync(&self, conn: &Connection<'_>, table: &SourceTable) -> Result<Vec<Row>> {
        let name = table.name.as_str();
        let sql = format!("SELECT * FROM {}", quote_access(name)?);
        debug!("Access query: {}", sql);

        let Some(mut cursor) = conn
            .execute(&sql, ())
            .map_err(|e| MigrateError::source(name, format!("query failed: {}", e)))?
        else {
            return Ok(Vec::new());
        };

        let num_cols = cursor
            .num_result_cols()
            .map_err(|e| MigrateError::source(name, format!("reading column count: {}", e)))?
            as u16;

        let mut kinds = Vec::with_capacity(num_cols as usize);
        for col in 1..=num_cols {
            let data_type = cursor
                .col_data_type(col)
                .map_err(|e| MigrateError::source(name, format!("reading column type: {}", e)))?;
            kinds.push(FetchKind::from_data_type(&data_type));
        }

        let mut rows = Vec::new();
        let mut text_buf = Vec::new();
        let mut wide_buf = Vec::new();

        while let Some(mut row) = cursor
            .next_row()
            .map_err(|e| MigrateError::source(name, format!("fetching row: {}", e)))?
        {
            let mut values = Vec::with_capacity(kinds.len());
            for (idx, kind) in kinds.iter().enumerate() {
                let col = idx as u16 + 1;
                let value = self
                    .read_cell(&mut row, col, *kind, &mut text_buf, &mut wide_buf)
                    .map_err(|e| {
                        MigrateError::source(
                            name,
                            format!("reading row {} column {}: {}", rows.len() + 1, col, e),
                        )
                    })?;
                values.push(value);
            }
            rows.push(values);
        }

        Ok(rows)
    }

    fn read_cell(
        &self,
        row: &mut CursorRow<'_>,
        col: u16,
        kind: FetchKind,
        text_buf: &mut Vec<u8>,
        wide_buf: &mut Vec<u16>,
    ) -> std::result::Result<CellValue, odbc_api::Error> {
        let value = match kind {
            FetchKind::Integer => {
                let mut v = Nullable::<i64>::null();
                row.get_data(col, &mut v)?;
                v.into_opt().into()
            }
            FetchKind::Float => {
                let mut v = Nullable::<f64>::null();
                row.get_data(col, &mut v)?;
                v.into_opt().into()
            }
            FetchKind::Bit => {
                let mut v = Nullable::<Bit>::null();
                row.get_data(col, &mut v)?;
                v.into_opt().map(|b| b.as_bool()).into()
            }
            FetchKind::Binary => {
                if row.get_binary(col, text_buf)? {
                    CellValue::Bytes(text_buf.clone())
                } else {
                    CellValue::Null
                }
            }
            FetchKind::Text if self.text_mode == TextMode::Wide => {
                if row.get_wide_text(col, wide_buf)? {
                    CellValue::Text(String::from_utf16_lossy(wide_buf))
                } else {
                    CellValue::Null
                }
            }
            FetchKind::Text => {
                if row.get_text(col, text_buf)? {
                    CellValue::Bytes(text_buf.clone())
                } else {
                    CellValue::Null
                }
            }
            FetchKind::Exact | FetchKind::Timestamp | FetchKind::Date | FetchKind::Time => {
                if row.get_text(col, text_buf)? {
                    let text = String::from_utf8_lossy(text_buf);
                    convert_rendered(&text, kind)
                } else {
                    CellValue::Null
                }
            }
        };
        Ok(value)
    }
}

/// Convert a value the driver rendered as text into a typed cell.
///
/// Unparseable temporal text is kept as text rather than dropped.
fn convert_rendered(text: &str, kind: FetchKind) -> CellValue {
    let text = text.trim();
    match kind {
        FetchKind::Timestamp => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::Text(text.to_string())),
        FetchKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(CellValue::Date)
            .unwrap_or_else(|_| CellValue::Text(text.to_string())),
        FetchKind::Time => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .map(CellValue::Time)
            .unwrap_or_else(|_| CellValue::Text(text.to_string())),
        _ => CellValue::Decimal(text.to_string()),
    }
}

#[async_trait]
impl SourceReader for AccessReader {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(|| self.closed_error())?;
        let tables = self.list_tables_sync(conn)?;
        info!("Found {} tables in {}", tables.len(), self.path_display);
        Ok(tables)
    }

    async fn columns(&self, table: &str) -> Result<Vec<SourceColumn>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(|| self.closed_error())?;
        self.columns_sync(conn, table)
    }

    async fn fetch_rows(&self, table: &SourceTable) -> Result<Vec<Row>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(|| self.closed_error())?;
        let rows = self.fetch_rows_sync(conn, table)?;
        debug!("Fetched {} rows from {}", rows.len(), table.name);
        Ok(rows)
    }

    fn db_type(&self) -> &str {
        "access"
    }

    async fn close(&self) {
        // Dropping the connection disconnects it
        if self.conn.lock().await.take().is_some() {
            debug!("Closed Access source {}", self.path_display);
        }
    }
}
