//! Cell sanitization for the COPY text format.
//!
//! Every fetched cell becomes exactly one field: `\N` for NULL, otherwise a
//! single-line string without tabs, with backslashes escaped and characters
//! PostgreSQL text cannot hold removed. Cells that lose content are recorded
//! in the injected [`ReplacementLog`].

pub mod log;

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use encoding_rs::Encoding;
use tracing::warn;

use crate::config::SourceConfig;
use crate::core::value::CellValue;
use crate::error::Result;

pub use log::{FileReplacementLog, MemoryReplacementLog, ReplacementLog, ReplacementLogEntry};

/// COPY text-format NULL marker.
pub const NULL_MARKER: &str = "\\N";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Where a cell sits, for the replacement log.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub table: &'a str,
    /// 1-based row index.
    pub row: usize,
    pub column: &'a str,
}

/// Turns cell values into COPY text fields using a source decoding policy.
#[derive(Debug)]
pub struct Sanitizer {
    encoding: &'static Encoding,
    replacements: AtomicU64,
}

impl Sanitizer {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            replacements: AtomicU64::new(0),
        }
    }

    /// Build a sanitizer with the configured source encoding.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(config.text_encoding()?))
    }

    /// Name of the decoding policy.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Number of lossy cells seen so far.
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::Relaxed)
    }

    /// Sanitize one cell. Never fails; lossy cells are logged once each.
    pub fn sanitize(&self, value: &CellValue, ctx: &CellContext<'_>, log: &dyn ReplacementLog) -> String {
        if value.is_null() {
            return NULL_MARKER.to_string();
        }

        let (text, mut lossy) = self.render(value);

        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\u{FFFD}' | '\0' => lossy = true,
                '\n' | '\t' => out.push(' '),
                '\r' => {}
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }

        if lossy {
            self.replacements.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Invalid characters replaced in {} row {} column '{}'",
                ctx.table, ctx.row, ctx.column
            );
            let entry = ReplacementLogEntry::new(ctx.table, ctx.row, ctx.column);
            if let Err(e) = log.record(&entry) {
                warn!("Failed to write replacement log entry: {}", e);
            }
        }

        out
    }

    /// Render a non-null value as text. The flag is set when decoding hit
    /// bytes invalid under the policy.
    fn render<'v>(&self, value: &'v CellValue) -> (Cow<'v, str>, bool) {
        match value {
            CellValue::Null => (Cow::Borrowed(NULL_MARKER), false),
            CellValue::Text(s) => (Cow::Borrowed(s.as_str()), false),
            CellValue::Bytes(b) => {
                let (decoded, had_errors) = self.encoding.decode_without_bom_handling(b);
                (decoded, had_errors)
            }
            CellValue::Int(i) => (Cow::Owned(i.to_string()), false),
            CellValue::Float(f) => (Cow::Owned(f.to_string()), false),
            CellValue::Bool(b) => (Cow::Borrowed(if *b { "true" } else { "false" }), false),
            CellValue::Decimal(d) => (Cow::Borrowed(d.as_str()), false),
            CellValue::DateTime(dt) => (Cow::Owned(dt.format(DATETIME_FORMAT).to_string()), false),
            CellValue::Date(d) => (Cow::Owned(d.format("%Y-%m-%d").to_string()), false),
            CellValue::Time(t) => (Cow::Owned(t.format("%H:%M:%S%.f").to_string()), false),
        }
    }
}
