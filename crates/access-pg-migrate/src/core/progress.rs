//! Progress reporting from the migration worker to the invoking context.

use serde::Serialize;

/// What a progress event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    TableStarted,
    RowsEncoded,
    TableEmpty,
    TableCompleted,
    RunCompleted,
}

/// One progress tick: a human-readable message and a 0-100 percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub message: String,
    pub percent: u8,
}

impl ProgressEvent {
    pub fn table_started(table: &str) -> Self {
        Self {
            kind: ProgressKind::TableStarted,
            table: Some(table.to_string()),
            message: format!("Migrating table {}...", table),
            percent: 0,
        }
    }

    pub fn rows_encoded(table: &str, row: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((row as u128 * 100) / total as u128).min(100) as u8
        };
        Self {
            kind: ProgressKind::RowsEncoded,
            table: Some(table.to_string()),
            message: format!("{} ({}/{})", table, row, total),
            percent,
        }
    }

    pub fn table_empty(table: &str) -> Self {
        Self {
            kind: ProgressKind::TableEmpty,
            table: Some(table.to_string()),
            message: format!("{}: no data", table),
            percent: 100,
        }
    }

    pub fn table_completed(table: &str) -> Self {
        Self {
            kind: ProgressKind::TableCompleted,
            table: Some(table.to_string()),
            message: format!("{}: completed", table),
            percent: 100,
        }
    }

    pub fn run_completed() -> Self {
        Self {
            kind: ProgressKind::RunCompleted,
            table: None,
            message: "Migration completed".to_string(),
            percent: 100,
        }
    }
}

/// Receives progress events synchronously from the migration worker.
///
/// Any `Fn(&str, u8)` closure is a sink, so callers can pass
/// `|msg, pct| ...` directly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, u8) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(&event.message, event.percent)
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_rows_encoded_percent() {
        assert_eq!(ProgressEvent::rows_encoded("t", 1, 3).percent, 33);
        assert_eq!(ProgressEvent::rows_encoded("t", 3, 3).percent, 100);
        assert_eq!(ProgressEvent::rows_encoded("t", 50, 1000).message, "t (50/1000)");
    }

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |msg: &str, pct: u8| seen.lock().unwrap().push((msg.to_string(), pct));
        sink.report(&ProgressEvent::table_started("Clientes"));
        sink.report(&ProgressEvent::run_completed());

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen[0], ("Migrating table Clientes...".to_string(), 0));
        assert_eq!(seen[1], ("Migration completed".to_string(), 100));
    }

    #[test]
    fn test_event_serializes_kind() {
        let json = serde_json::to_string(&ProgressEvent::table_empty("Vacía")).unwrap();
        assert!(json.contains("\"kind\":\"table_empty\""));
        assert!(json.contains("\"percent\":100"));
    }
}
