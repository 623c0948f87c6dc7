//! Audit sink for cells whose content could not be carried over intact.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{MigrateError, Result};

/// One lossy cell: table, 1-based row index and column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementLogEntry {
    pub table: String,
    pub row: usize,
    pub column: String,
}

impl ReplacementLogEntry {
    pub fn new(table: impl Into<String>, row: usize, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row,
            column: column.into(),
        }
    }
}

impl fmt::Display for ReplacementLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Fila {}, Columna '{}': caracteres inválidos reemplazados",
            self.table, self.row, self.column
        )
    }
}

/// Append-only sink for replacement entries. Never read back by the migration.
pub trait ReplacementLog: Send + Sync {
    fn record(&self, entry: &ReplacementLogEntry) -> Result<()>;
}

/// Appends one line per entry to a file.
///
/// The file is opened in append mode on the first entry, so a run without
/// replacements leaves no file behind.
pub struct FileReplacementLog {
    path: PathBuf,
    writer: Mutex<Option<LineWriter<File>>>,
}

impl FileReplacementLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileReplacementLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReplacementLog")
            .field("path", &self.path)
            .finish()
    }
}

impl ReplacementLog for FileReplacementLog {
    fn record(&self, entry: &ReplacementLogEntry) -> Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| MigrateError::Io(std::io::Error::other("replacement log lock poisoned")))?;
        if guard.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            *guard = Some(LineWriter::new(file));
        }
        if let Some(writer) = guard.as_mut() {
            writeln!(writer, "{}", entry)?;
        }
        Ok(())
    }
}

/// Keeps entries in memory (tests, embedding).
#[derive(Debug, Default)]
pub struct MemoryReplacementLog {
    entries: Mutex<Vec<ReplacementLogEntry>>,
}

impl MemoryReplacementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries.
    pub fn entries(&self) -> Vec<ReplacementLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl ReplacementLog for MemoryReplacementLog {
    fn record(&self, entry: &ReplacementLogEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MigrateError::Io(std::io::Error::other("replacement log lock poisoned")))?;
        entries.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_format() {
        let entry = ReplacementLogEntry::new("Clientes", 7, "Nombre");
        assert_eq!(
            entry.to_string(),
            "[Clientes] Fila 7, Columna 'Nombre': caracteres inválidos reemplazados"
        );
    }

    #[test]
    fn test_file_log_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("replacements.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let log = FileReplacementLog::new(&path);
        log.record(&ReplacementLogEntry::new("A", 1, "x")).unwrap();
        log.record(&ReplacementLogEntry::new("B", 2, "y")).unwrap();
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "previous run");
        assert!(lines[2].starts_with("[B] Fila 2"));
    }

    #[test]
    fn test_file_log_created_lazily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unused.log");
        let log = FileReplacementLog::new(&path);
        assert_eq!(log.path(), path.as_path());
        assert!(!path.exists());
    }

    #[test]
    fn test_memory_log() {
        let log = MemoryReplacementLog::new();
        log.record(&ReplacementLogEntry::new("T", 3, "c")).unwrap();
        assert_eq!(log.entries(), vec![ReplacementLogEntry::new("T", 3, "c")]);
    }
}
