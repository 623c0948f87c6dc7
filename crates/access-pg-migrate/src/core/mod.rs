//! Core abstractions shared by the source adapter, the writer and the
//! orchestrator.
//!
//! - [`schema`]: source and destination table descriptors
//! - [`value`]: cell values as fetched from the source
//! - [`identifier`]: identifier validation and quoting
//! - [`progress`]: progress events and sinks
//! - [`traits`]: the reader/writer seams

pub mod identifier;
pub mod progress;
pub mod schema;
pub mod traits;
pub mod value;

pub use progress::{NoProgress, ProgressEvent, ProgressKind, ProgressSink};
pub use schema::{SourceColumn, SourceTable, TargetColumn, TargetTable};
pub use traits::{CopyPayload, SourceReader, TargetWriter};
pub use value::{CellValue, Row};
