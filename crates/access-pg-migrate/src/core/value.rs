//! Cell values fetched from the legacy source.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single cell as delivered by the source adapter.
///
/// Text arrives either already decoded (`Text`) or as the driver's raw
/// narrow bytes (`Bytes`), in which case the sanitizer applies the
/// configured decoding policy.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// SQL NULL.
    Null,

    /// Decoded text.
    Text(String),

    /// Raw bytes (narrow text or binary columns).
    Bytes(Vec<u8>),

    /// Integer of any width.
    Int(i64),

    /// Floating point (Single, Double).
    Float(f64),

    /// Yes/No.
    Bool(bool),

    /// Exact numeric rendered by the driver (Decimal, Currency).
    Decimal(String),

    /// Date/Time with both components.
    DateTime(NaiveDateTime),

    /// Date only.
    Date(NaiveDate),

    /// Time only.
    Time(NaiveTime),
}

impl CellValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Int(v as i64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(v: Vec<u8>) -> Self {
        CellValue::Bytes(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(v: NaiveDateTime) -> Self {
        CellValue::DateTime(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// One fetched row, cells in column order.
pub type Row = Vec<CellValue>;
