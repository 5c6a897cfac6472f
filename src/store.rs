//! Main RosterStore struct tying the tables together.
//!
//! Everything below this type reports failures as [`RosterError`]. The
//! roster operations here translate those failures into the boolean,
//! count and empty-list results callers expect: the error is logged,
//! broadcast as [`RosterEvent::StorageFailure`], and swallowed. Only
//! opening the store returns an error.

use crate::error::{Result, RosterError};
use crate::roll::RosterSource;
use crate::roster::{HistoryLog, NameTable};
use crate::subscriptions::{
    RosterEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use crate::types::{normalize_name, CallRecord, RosterStats};
use chrono::Local;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Roster store configuration.
#[derive(Clone, Debug)]
pub struct RosterConfig {
    /// Data directory for the store.
    pub path: PathBuf,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Rewrite the names journal as a snapshot after this many mutations.
    /// 0 disables automatic compaction.
    pub compact_after: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
            create_if_missing: true,
            compact_after: 500,
        }
    }
}

impl RosterConfig {
    /// Configuration with the data directory next to the running binary.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let base = exe.parent().ok_or_else(|| {
            RosterError::InvalidConfig(format!("No parent directory for {}", exe.display()))
        })?;
        Ok(Self {
            path: base.join("data"),
            ..Default::default()
        })
    }
}

/// Magic bytes for store manifest.
const STORE_MAGIC: &[u8; 4] = b"RCL\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

const MANIFEST_FILE: &str = "MANIFEST";
const LOCK_FILE: &str = "LOCK";
const NAMES_FILE: &str = "names.journal";
const HISTORY_FILE: &str = "history.journal";
const BACKUP_DIR: &str = "backups";

/// The roster store.
///
/// Provides:
/// - A set of unique, trimmed, non-empty names
/// - An append-only history of called names
/// - Change notifications for subscribers
pub struct RosterStore {
    /// Store configuration.
    config: RosterConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Names table.
    names: NameTable,

    /// Call history.
    history: HistoryLog,

    /// Change subscribers.
    subscriptions: SubscriptionManager,
}

impl RosterStore {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: RosterConfig) -> Result<Self> {
        if config.path.join(MANIFEST_FILE).exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(RosterError::NotInitialized)
        }
    }

    /// Create a new store.
    pub fn create(config: RosterConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;
        Self::write_manifest(&config.path)?;

        let names = NameTable::open(config.path.join(NAMES_FILE))?;
        let history = HistoryLog::open(config.path.join(HISTORY_FILE))?;

        tracing::info!(path = %config.path.display(), "Created roster store");

        Ok(Self {
            config,
            _lock_file: lock_file,
            names,
            history,
            subscriptions: SubscriptionManager::new(),
        })
    }

    /// Open an existing store.
    pub fn open(config: RosterConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;

        let names = NameTable::open(config.path.join(NAMES_FILE))?;
        let history = HistoryLog::open(config.path.join(HISTORY_FILE))?;

        tracing::info!(
            path = %config.path.display(),
            names = names.len(),
            calls = history.len(),
            "Opened roster store"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            names,
            history,
            subscriptions: SubscriptionManager::new(),
        })
    }

    // --- Name Operations ---

    /// All names, case-insensitive alphabetical.
    ///
    /// The returned vector is the caller's own copy.
    pub fn list_names(&self) -> Vec<String> {
        self.names.list()
    }

    /// Add one name. Returns false for blank input or an existing name.
    pub fn add_name(&self, text: &str) -> bool {
        let Some(name) = normalize_name(text) else {
            tracing::debug!("Rejected blank name");
            return false;
        };

        match self.names.insert([name]) {
            Ok(inserted) if inserted.is_empty() => {
                tracing::warn!(name, "Name already exists");
                false
            }
            Ok(inserted) => {
                tracing::info!(name, "Added name");
                self.after_mutation(RosterEvent::NamesAdded { names: inserted });
                true
            }
            Err(e) => self.report_failure("add_name", e, false),
        }
    }

    /// Add many names at once. Returns how many were inserted.
    ///
    /// Blank entries, names already stored and repeats within `texts` are
    /// skipped. The insert is all-or-nothing: on a storage failure nothing
    /// is added and 0 is returned.
    pub fn add_names<S: AsRef<str>>(&self, texts: &[S]) -> usize {
        let candidates = texts.iter().filter_map(|t| normalize_name(t.as_ref()));

        match self.names.insert(candidates) {
            Ok(inserted) if inserted.is_empty() => 0,
            Ok(inserted) => {
                let count = inserted.len();
                tracing::info!(count, "Added names");
                self.after_mutation(RosterEvent::NamesAdded { names: inserted });
                count
            }
            Err(e) => self.report_failure("add_names", e, 0),
        }
    }

    /// Delete one name. Returns true iff it existed.
    pub fn delete_name(&self, text: &str) -> bool {
        let Some(name) = normalize_name(text) else {
            return false;
        };

        match self.names.remove([name]) {
            Ok(removed) if removed.is_empty() => {
                tracing::warn!(name, "Name does not exist");
                false
            }
            Ok(removed) => {
                tracing::info!(name, "Deleted name");
                self.after_mutation(RosterEvent::NamesRemoved { names: removed });
                true
            }
            Err(e) => self.report_failure("delete_name", e, false),
        }
    }

    /// Delete many names. Returns how many existed and were removed.
    pub fn delete_names<S: AsRef<str>>(&self, texts: &[S]) -> usize {
        let targets = texts.iter().filter_map(|t| normalize_name(t.as_ref()));

        match self.names.remove(targets) {
            Ok(removed) if removed.is_empty() => 0,
            Ok(removed) => {
                let count = removed.len();
                tracing::info!(count, "Deleted names");
                self.after_mutation(RosterEvent::NamesRemoved { names: removed });
                count
            }
            Err(e) => self.report_failure("delete_names", e, 0),
        }
    }

    /// Remove every name. History is left alone.
    pub fn clear_names(&self) -> bool {
        match self.names.clear() {
            Ok(removed) => {
                tracing::info!(removed, "Cleared roster");
                self.after_mutation(RosterEvent::RosterCleared { removed });
                true
            }
            Err(e) => self.report_failure("clear_names", e, false),
        }
    }

    /// Number of stored names.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Exact-match membership (after trimming).
    pub fn contains(&self, text: &str) -> bool {
        normalize_name(text).is_some_and(|name| self.names.contains(name))
    }

    // --- History Operations ---

    /// Append a call for `name`, stamped with the current time.
    ///
    /// The name does not have to be on the roster.
    pub fn record_call(&self, name: &str) -> bool {
        let Some(name) = normalize_name(name) else {
            tracing::debug!("Rejected blank call record");
            return false;
        };

        match self.history.append(name) {
            Ok(record) => {
                tracing::info!(name, called_at = %record.called_at, "Recorded call");
                self.subscriptions
                    .broadcast(RosterEvent::CallRecorded { record });
                true
            }
            Err(e) => self.report_failure("record_call", e, false),
        }
    }

    /// Up to `limit` history entries, newest first.
    pub fn get_history(&self, limit: usize) -> Vec<CallRecord> {
        self.history.recent(limit)
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // --- Subscriptions ---

    /// Subscribe to roster events.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.subscriptions.subscribe(config)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id)
    }

    // --- Maintenance ---

    /// Rewrite the names journal as a single snapshot.
    pub fn compact(&self) -> bool {
        let before = self.names.journal_size();
        match self.names.compact() {
            Ok(()) => {
                tracing::info!(
                    before,
                    after = self.names.journal_size(),
                    "Compacted names journal"
                );
                true
            }
            Err(e) => self.report_failure("compact", e, false),
        }
    }

    /// Copy the store files into `dest`, or into a timestamped directory
    /// under `<data>/backups` when `dest` is `None`.
    ///
    /// Returns the backup directory on success.
    pub fn backup(&self, dest: Option<&Path>) -> Option<PathBuf> {
        let target = match dest {
            Some(dest) => dest.to_path_buf(),
            None => self.config.path.join(BACKUP_DIR).join(format!(
                "names_backup_{}",
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        };

        match self.copy_files_to(&target) {
            Ok(()) => {
                tracing::info!(path = %target.display(), "Backed up roster store");
                Some(target)
            }
            Err(e) => self.report_failure("backup", e, None),
        }
    }

    /// Flush both journals to disk.
    pub fn sync(&self) -> bool {
        match self.names.sync().and_then(|()| self.history.sync()) {
            Ok(()) => true,
            Err(e) => self.report_failure("sync", e, false),
        }
    }

    /// Store statistics.
    pub fn stats(&self) -> RosterStats {
        RosterStats {
            name_count: self.names.len() as u64,
            history_count: self.history.len() as u64,
            names_journal_bytes: self.names.journal_size(),
            history_journal_bytes: self.history.journal_size(),
        }
    }

    /// Get the data directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // --- Private Helpers ---

    fn after_mutation(&self, event: RosterEvent) {
        self.subscriptions.broadcast(event);

        let threshold = self.config.compact_after;
        if threshold > 0 && self.names.ops_since_compact() >= threshold {
            self.compact();
        }
    }

    fn report_failure<T>(&self, operation: &'static str, error: RosterError, fallback: T) -> T {
        tracing::error!(operation, error = %error, "Roster storage operation failed");
        self.subscriptions.broadcast(RosterEvent::StorageFailure {
            operation: operation.to_string(),
            message: error.to_string(),
        });
        fallback
    }

    fn copy_files_to(&self, target: &Path) -> Result<()> {
        self.names.sync()?;
        self.history.sync()?;

        fs::create_dir_all(target)?;
        fs::copy(self.config.path.join(MANIFEST_FILE), target.join(MANIFEST_FILE))?;
        fs::copy(self.names.journal_path(), target.join(NAMES_FILE))?;
        fs::copy(self.history.journal_path(), target.join(HISTORY_FILE))?;
        Ok(())
    }

    fn write_manifest(path: &Path) -> Result<()> {
        use std::io::Write;

        let mut file = File::create(path.join(MANIFEST_FILE))?;
        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        use std::io::Read;

        let mut file = File::open(path.join(MANIFEST_FILE))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(RosterError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(RosterError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| RosterError::Locked)?;

        Ok(lock_file)
    }
}

impl RosterSource for RosterStore {
    fn list_names(&self) -> Vec<String> {
        RosterStore::list_names(self)
    }

    fn record_call(&self, name: &str) -> bool {
        RosterStore::record_call(self, name)
    }
}

impl Drop for RosterStore {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.names.sync();
        let _ = self.history.sync();
    }
}
