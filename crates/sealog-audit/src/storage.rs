//! Event storage trait with in-memory and JSON-lines implementations.

use sealog_core::{EventId, SessionId};
use std::collections::{BTreeSet, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::error::{AuditError, AuditResult};
use crate::record::{EventRecord, StoredRow, UnreadableRow};

/// Storage backend for event rows.
///
/// Implementations must be thread-safe and support:
/// - Atomic single-row appends (a failed append leaves no partial row)
/// - Session-scoped reads in insertion order
/// - Lookup by event ID
///
/// A row that cannot be parsed never fails a read. [`rows`](Self::rows)
/// reports it as [`StoredRow::Unreadable`]; the record-level reads skip it.
pub trait EventStorage: Send + Sync {
    /// Persist one row atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be persisted.
    fn append_row(&self, record: &EventRecord) -> AuditResult<()>;

    /// Every row in insertion order, unreadable ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn rows(&self) -> AuditResult<Vec<StoredRow>>;

    /// Readable rows for a session, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn fetch_by_session(&self, session_id: &SessionId) -> AuditResult<Vec<EventRecord>>;

    /// Get a readable row by event ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn get(&self, event_id: &EventId) -> AuditResult<Option<EventRecord>>;

    /// List all session IDs that have at least one row, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn list_sessions(&self) -> AuditResult<Vec<SessionId>>;

    /// Count total rows, unreadable ones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn count(&self) -> AuditResult<usize>;

    /// Flush pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> AuditResult<()> {
        Ok(())
    }
}

fn sessions_of<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<SessionId> {
    let distinct: BTreeSet<&str> = keys.collect();
    distinct
        .into_iter()
        .filter_map(|s| match SessionId::parse(s) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(session_id = %s, error = %e, "Skipping unparsable session id");
                None
            },
        })
        .collect()
}

#[derive(Default)]
struct MemoryRows {
    rows: Vec<EventRecord>,
    ids: HashSet<String>,
}

/// In-memory storage, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryEventStorage {
    inner: RwLock<MemoryRows>,
}

impl MemoryEventStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryEventStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventStorage").finish_non_exhaustive()
    }
}

impl EventStorage for MemoryEventStorage {
    fn append_row(&self, record: &EventRecord) -> AuditResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        if !inner.ids.insert(record.event_id.clone()) {
            return Err(AuditError::Storage(format!(
                "duplicate event id: {}",
                record.event_id
            )));
        }
        inner.rows.push(record.clone());
        Ok(())
    }

    fn rows(&self) -> AuditResult<Vec<StoredRow>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(inner.rows.iter().cloned().map(StoredRow::Record).collect())
    }

    fn fetch_by_session(&self, session_id: &SessionId) -> AuditResult<Vec<EventRecord>> {
        let wanted = session_id.to_string();
        let inner = self
            .inner
            .read()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(inner
            .rows
            .iter()
            .filter(|r| r.session_id == wanted)
            .cloned()
            .collect())
    }

    fn get(&self, event_id: &EventId) -> AuditResult<Option<EventRecord>> {
        let wanted = event_id.to_string();
        let inner = self
            .inner
            .read()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(inner.rows.iter().find(|r| r.event_id == wanted).cloned())
    }

    fn list_sessions(&self) -> AuditResult<Vec<SessionId>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(sessions_of(inner.rows.iter().map(|r| r.session_id.as_str())))
    }

    fn count(&self) -> AuditResult<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        Ok(inner.rows.len())
    }
}

/// Append-only JSON-lines file, one row per line.
///
/// Each append is written and synced before returning. If the write fails
/// the file is truncated back to its previous length so no partial row
/// survives.
pub struct FileEventStorage {
    path: PathBuf,
    writer: Mutex<File>,
}

impl FileEventStorage {
    /// Open (or create) a log file at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Storage`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuditError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::Storage(format!("failed to open {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Opened event log file");
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row in file order. Blank lines are ignored.
    fn read_all(&self) -> AuditResult<Vec<StoredRow>> {
        let mut bytes = Vec::new();
        File::open(&self.path)
            .and_then(|mut file| file.read_to_end(&mut bytes))
            .map_err(|e| {
                AuditError::Storage(format!("failed to read {}: {e}", self.path.display()))
            })?;

        let mut rows = Vec::new();
        for (idx, line) in bytes.split(|b| *b == b'\n').enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }
            let line_no = idx.saturating_add(1);
            let row = match std::str::from_utf8(line) {
                Ok(text) => parse_row(line_no, text),
                Err(e) => unreadable(line_no, &String::from_utf8_lossy(line), &e),
            };
            rows.push(row);
        }
        Ok(rows)
    }

    fn records(&self) -> AuditResult<impl Iterator<Item = EventRecord>> {
        Ok(self.read_all()?.into_iter().filter_map(|row| match row {
            StoredRow::Record(record) => Some(record),
            StoredRow::Unreadable(_) => None,
        }))
    }
}

fn parse_row(line_no: usize, text: &str) -> StoredRow {
    match serde_json::from_str::<EventRecord>(text) {
        Ok(record) => StoredRow::Record(record),
        Err(e) => unreadable(line_no, text, &e),
    }
}

/// Salvage the identifying fields so verification can attribute the row.
fn unreadable(line_no: usize, text: &str, reason: &dyn std::fmt::Display) -> StoredRow {
    let fields = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text).ok();
    let field = |name: &str| {
        fields
            .as_ref()
            .and_then(|map| map.get(name))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };
    warn!(line = line_no, error = %reason, "Unreadable event row");
    StoredRow::Unreadable(UnreadableRow {
        line: line_no,
        event_id: field("event_id"),
        session_id: field("session_id"),
        raw: text.to_string(),
        reason: reason.to_string(),
    })
}

impl std::fmt::Debug for FileEventStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEventStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EventStorage for FileEventStorage {
    fn append_row(&self, record: &EventRecord) -> AuditResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self
            .writer
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        let previous_len = file
            .metadata()
            .map_err(|e| AuditError::Storage(e.to_string()))?
            .len();

        if let Err(e) = file.write_all(&line).and_then(|()| file.sync_data()) {
            if let Err(rollback) = file.set_len(previous_len) {
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial event row"
                );
            }
            return Err(AuditError::Storage(format!(
                "failed to append to {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn rows(&self) -> AuditResult<Vec<StoredRow>> {
        self.read_all()
    }

    fn fetch_by_session(&self, session_id: &SessionId) -> AuditResult<Vec<EventRecord>> {
        let wanted = session_id.to_string();
        Ok(self.records()?.filter(|r| r.session_id == wanted).collect())
    }

    fn get(&self, event_id: &EventId) -> AuditResult<Option<EventRecord>> {
        let wanted = event_id.to_string();
        Ok(self.records()?.find(|r| r.event_id == wanted))
    }

    fn list_sessions(&self) -> AuditResult<Vec<SessionId>> {
        let rows = self.read_all()?;
        Ok(sessions_of(rows.iter().filter_map(StoredRow::session_key)))
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self.read_all()?.len())
    }

    fn flush(&self) -> AuditResult<()> {
        let file = self
            .writer
            .lock()
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        file.sync_all()
            .map_err(|e| AuditError::Storage(e.to_string()))
    }
}
