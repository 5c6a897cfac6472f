//! The names table.

use crate::error::Result;
use crate::journal::Journal;
use crate::types::{NameId, NameRow, RosterOp};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Magic bytes for the names journal.
const NAMES_MAGIC: [u8; 4] = *b"RNM\0";

#[derive(Default)]
struct Table {
    by_name: HashMap<String, NameId>,
    next_id: u64,
}

impl Table {
    fn apply(&mut self, op: RosterOp) {
        match op {
            RosterOp::Insert(rows) => {
                for row in rows {
                    self.next_id = self.next_id.max(row.id.0 + 1);
                    self.by_name.entry(row.name).or_insert(row.id);
                }
            }
            RosterOp::Delete(names) => {
                for name in names {
                    self.by_name.remove(&name);
                }
            }
            RosterOp::Clear => self.by_name.clear(),
            RosterOp::Snapshot(rows) => {
                self.by_name.clear();
                self.apply(RosterOp::Insert(rows));
            }
        }
    }

    fn rows(&self) -> Vec<NameRow> {
        let mut rows: Vec<_> = self
            .by_name
            .iter()
            .map(|(name, id)| NameRow {
                id: *id,
                name: name.clone(),
            })
            .collect();
        rows.sort_by_key(|row| row.id);
        rows
    }
}

/// Unique names, persisted as a journal of [`RosterOp`]s.
///
/// Names passed in must already be trimmed. Uniqueness is exact
/// (case-sensitive) string equality.
pub struct NameTable {
    journal: Journal<RosterOp>,
    table: RwLock<Table>,
    /// Journal entries written since the last snapshot.
    ops_since_compact: RwLock<usize>,
}

impl NameTable {
    /// Open the table, replaying its journal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let (journal, ops) = Journal::open(path, NAMES_MAGIC)?;

        let mut table = Table {
            next_id: 1,
            ..Default::default()
        };
        let replayed = ops.len();
        for op in ops {
            table.apply(op);
        }

        Ok(Self {
            journal,
            table: RwLock::new(table),
            ops_since_compact: RwLock::new(replayed),
        })
    }

    /// All names, case-insensitive alphabetical.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().by_name.keys().cloned().collect();
        names.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        names
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.table.read().by_name.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.read().by_name.is_empty()
    }

    /// Exact-match lookup.
    pub fn contains(&self, name: &str) -> bool {
        self.table.read().by_name.contains_key(name)
    }

    /// Insert the candidates that are not yet stored.
    ///
    /// Duplicates within `candidates` are inserted once. All new names are
    /// written as a single journal entry. Returns the names inserted, in
    /// input order.
    pub fn insert<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
        let mut table = self.table.write();

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for name in candidates {
            if table.by_name.contains_key(name) || !seen.insert(name) {
                continue;
            }
            rows.push(NameRow {
                id: NameId(table.next_id + rows.len() as u64),
                name: name.to_string(),
            });
        }

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let inserted: Vec<String> = rows.iter().map(|row| row.name.clone()).collect();
        let op = RosterOp::Insert(rows);
        self.journal.append(&op)?;
        table.apply(op);
        *self.ops_since_compact.write() += 1;

        Ok(inserted)
    }

    /// Remove the given names that exist. Returns the names removed.
    pub fn remove<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
        let mut table = self.table.write();

        let mut seen = HashSet::new();
        let removed: Vec<String> = names
            .into_iter()
            .filter(|name| table.by_name.contains_key(*name) && seen.insert(*name))
            .map(str::to_string)
            .collect();

        if removed.is_empty() {
            return Ok(removed);
        }

        let op = RosterOp::Delete(removed.clone());
        self.journal.append(&op)?;
        table.apply(op);
        *self.ops_since_compact.write() += 1;

        Ok(removed)
    }

    /// Remove every name. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut table = self.table.write();
        let count = table.by_name.len();

        self.journal.append(&RosterOp::Clear)?;
        table.apply(RosterOp::Clear);
        *self.ops_since_compact.write() += 1;

        Ok(count)
    }

    /// Rewrite the journal as a single snapshot of the current table.
    pub fn compact(&self) -> Result<()> {
        // Write lock keeps mutations out while the file is swapped.
        let table = self.table.write();
        let rows = table.rows();
        self.journal.rewrite(&[RosterOp::Snapshot(rows)])?;
        *self.ops_since_compact.write() = 1;
        Ok(())
    }

    /// Journal entries written since the last snapshot.
    pub fn ops_since_compact(&self) -> usize {
        *self.ops_since_compact.read()
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
    pub(crate) fn journal(&self) -> &Journal<RosterOp> {
        &self.journal
    }
}
