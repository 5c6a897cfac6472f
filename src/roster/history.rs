//! The append-only call history.

use crate::error::Result;
use crate::journal::Journal;
use crate::types::{CallId, CallRecord, Timestamp};
use parking_lot::RwLock;
use std::path::Path;

/// Magic bytes for the history journal.
const HISTORY_MAGIC: [u8; 4] = *b"RHS\0";

/// Call history. Entries are never updated or removed.
pub struct HistoryLog {
    journal: Journal<CallRecord>,
    records: RwLock<Vec<CallRecord>>,
}

impl HistoryLog {
    /// Open the history, replaying its journal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let (journal, records) = Journal::open(path, HISTORY_MAGIC)?;
        Ok(Self {
            journal,
            records: RwLock::new(records),
        })
    }

    /// Append a call stamped with the current time.
    pub fn append(&self, name: &str) -> Result<CallRecord> {
        self.append_at(name, Timestamp::now())
    }

    /// Append a call with an explicit timestamp.
    pub fn append_at(&self, name: &str, called_at: Timestamp) -> Result<CallRecord> {
        let mut records = self.records.write();

        let id = CallId(records.last().map_or(1, |last| last.id.0 + 1));
        let record = CallRecord {
            id,
            name: name.to_string(),
            called_at,
        };

        self.journal.append(&record)?;
        records.push(record.clone());
        Ok(record)
    }

    /// Up to `limit` entries, newest first.
    ///
    /// Ordered by timestamp; entries sharing a timestamp are ordered by
    /// insertion, later first.
    pub fn recent(&self, limit: usize) -> Vec<CallRecord> {
        let mut records = self.records.read().clone();
        records.sort_by(|a, b| {
            b.called_at
                .cmp(&a.called_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        records.truncate(limit);
        records
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no call has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Flush the journal to disk.
    pub fn sync(&self) -> Result<()> {
        self.journal.sync()
    }

    /// Journal size in bytes.
    pub fn journal_size(&self) -> u64 {
        self.journal.size()
    }

    /// Path of the backing journal.
    pub fn journal_path(&self) -> &Path {
        self.journal.path()
    }

    #[cfg(test)]
    pub(crate) fn journal(&self) -> &Journal<CallRecord> {
        &self.journal
    }
}
