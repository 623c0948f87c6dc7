//! Streams fetched rows as COPY text chunks.
//!
//! The encoder is a plain [`Iterator`] so the writer can pull chunks while the
//! COPY is open. Progress ticks and cancellation checks happen between rows.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::sync::CancellationToken;

use crate::core::progress::{ProgressEvent, ProgressSink};
use crate::core::value::Row;
use crate::error::{MigrateError, Result};
use crate::sanitize::{CellContext, ReplacementLog, Sanitizer};

/// Row stream settings.
#[derive(Debug, Clone, Copy)]
pub struct EncoderOptions {
    /// Rows per emitted chunk.
    pub chunk_rows: usize,
    /// Number of progress ticks spread over a table.
    pub progress_ticks: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            chunk_rows: 10_000,
            progress_ticks: 50,
        }
    }
}

/// Encodes one table's rows into tab-delimited, newline-terminated chunks.
pub struct RowStreamEncoder<'a> {
    table: &'a str,
    columns: Vec<String>,
    rows: std::slice::Iter<'a, Row>,
    total: usize,
    row_index: usize,
    step: usize,
    chunk_rows: usize,
    sanitizer: &'a Sanitizer,
    log: &'a dyn ReplacementLog,
    progress: &'a dyn ProgressSink,
    cancel: CancellationToken,
    buf: BytesMut,
    done: bool,
}

impl<'a> RowStreamEncoder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: &'a str,
        columns: Vec<String>,
        rows: &'a [Row],
        options: EncoderOptions,
        sanitizer: &'a Sanitizer,
        log: &'a dyn ReplacementLog,
        progress: &'a dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Self {
        let total = rows.len();
        let ticks = options.progress_ticks.max(1);
        Self {
            table,
            columns,
            rows: rows.iter(),
            total,
            row_index: 0,
            step: (total / ticks).max(1),
            chunk_rows: options.chunk_rows.max(1),
            sanitizer,
            log,
            progress,
            cancel,
            buf: BytesMut::new(),
            done: false,
        }
    }

    /// Rows encoded so far.
    pub fn rows_encoded(&self) -> usize {
        self.row_index
    }

    fn encode_row(&mut self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(MigrateError::bulk_load(
                self.table,
                format!(
                    "row {} has {} values, expected {}",
                    self.row_index,
                    row.len(),
                    self.columns.len()
                ),
            ));
        }

        for (i, (value, column)) in row.iter().zip(&self.columns).enumerate() {
            if i > 0 {
                self.buf.put_u8(b'\t');
            }
            let ctx = CellContext {
                table: self.table,
                row: self.row_index,
                column,
            };
            let field = self.sanitizer.sanitize(value, &ctx, self.log);
            self.buf.put_slice(field.as_bytes());
        }
        self.buf.put_u8(b'\n');
        Ok(())
    }

    fn fail(&mut self, err: MigrateError) -> Option<Result<Bytes>> {
        self.done = true;
        self.buf.clear();
        Some(Err(err))
    }
}

impl Iterator for RowStreamEncoder<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut in_chunk = 0;
        loop {
            if self.cancel.is_cancelled() {
                return self.fail(MigrateError::Cancelled);
            }

            let Some(row) = self.rows.next() else {
                self.done = true;
                if self.buf.is_empty() {
                    return None;
                }
                return Some(Ok(self.buf.split().freeze()));
            };

            self.row_index += 1;
            if let Err(e) = self.encode_row(row) {
                return self.fail(e);
            }

            if self.row_index % self.step == 0 {
                self.progress.report(&ProgressEvent::rows_encoded(
                    self.table,
                    self.row_index,
                    self.total,
                ));
            }

            in_chunk += 1;
            if in_chunk >= self.chunk_rows {
                return Some(Ok(self.buf.split().freeze()));
            }
        }
    }
}
