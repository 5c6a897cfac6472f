//! Append-only journal files.
//!
//! A journal is a header (4 magic bytes and a version byte) followed by
//! frames of `[len: u32 LE][MessagePack body][crc32: u32 LE]`. Every append
//! writes exactly one frame and syncs it, so a multi-item mutation written
//! as one entry is all-or-nothing. A frame torn by a crash can only be the
//! last one; it is cut off when the journal is reopened.

use crate::error::{Result, RosterError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Current journal format version.
const JOURNAL_VERSION: u8 = 1;

/// Header size: magic + version.
const HEADER_SIZE: u64 = 5;

/// Frame overhead: length prefix + checksum.
const FRAME_OVERHEAD: usize = 8;

/// Largest body accepted when reading a frame.
const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

struct Inner {
    file: File,
    len: u64,
}

/// Append-only journal of serde entries.
pub struct Journal<T> {
    path: PathBuf,
    magic: [u8; 4],
    inner: Mutex<Inner>,
    #[cfg(test)]
    fail_next_append: std::sync::atomic::AtomicBool,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Journal<T> {
    /// Open a journal, creating it if missing, and replay its entries.
    pub fn open(path: impl AsRef<Path>, magic: [u8; 4]) -> Result<(Self, Vec<T>)> {
        let path = path.as_ref().to_path_buf();

        let (file, len, entries) = if path.exists() {
            let bytes = fs::read(&path)?;
            let (entries, valid_len) = Self::replay(&path, &bytes, &magic)?;

            let file = OpenOptions::new().read(true).write(true).open(&path)?;
            if valid_len < bytes.len() as u64 {
                tracing::warn!(
                    path = %path.display(),
                    dropped_bytes = bytes.len() as u64 - valid_len,
                    "Truncating torn journal tail"
                );
                file.set_len(valid_len)?;
                file.sync_all()?;
            }
            (file, valid_len, entries)
        } else {
            let file = Self::create_file(&path, &magic)?;
            (file, HEADER_SIZE, Vec::new())
        };

        Ok((
            Self {
                path,
                magic,
                inner: Mutex::new(Inner { file, len }),
                #[cfg(test)]
                fail_next_append: std::sync::atomic::AtomicBool::new(false),
                _entry: PhantomData,
            },
            entries,
        ))
    }

    /// Append one entry as a single synced frame.
    ///
    /// On failure the file is cut back to its previous length, so a failed
    /// append leaves no trace.
    pub fn append(&self, entry: &T) -> Result<()> {
        let frame = Self::encode_frame(entry)?;

        let mut inner = self.inner.lock();
        let start = inner.len;

        match self.write_frame(&mut inner.file, start, &frame) {
            Ok(()) => {
                inner.len = start + frame.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = inner.file.set_len(start) {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %rollback,
                        "Failed to roll back partial journal frame"
                    );
                }
                Err(e)
            }
        }
    }

    /// Replace the journal contents with `entries`.
    ///
    /// Written to a sibling file and renamed into place.
    pub fn rewrite(&self, entries: &[T]) -> Result<()> {
        let mut inner = self.inner.lock();

        let tmp_path = self.path.with_extension("compact");
        let mut tmp = Self::create_file(&tmp_path, &self.magic)?;
        let mut len = HEADER_SIZE;
        for entry in entries {
            let frame = Self::encode_frame(entry)?;
            tmp.write_all(&frame)?;
            len += frame.len() as u64;
        }
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;

        inner.file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        inner.len = len;
        Ok(())
    }

    /// Force all written frames to disk.
    pub fn sync(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }

    /// Current file size in bytes.
    pub fn size(&self) -> u64 {
        self.inner.lock().len
    }

    /// Path of the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn fail_next_append(&self) {
        self.fail_next_append
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn write_frame(&self, file: &mut File, offset: u64, frame: &[u8]) -> Result<()> {
        file.seek(SeekFrom::Start(offset))?;

        #[cfg(test)]
        if self
            .fail_next_append
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            file.write_all(&frame[..frame.len() / 2])?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected write failure",
            )
            .into());
        }

        file.write_all(frame)?;
        file.sync_data()?;
        Ok(())
    }

    fn create_file(path: &Path, magic: &[u8; 4]) -> Result<File> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(magic)?;
        file.write_all(&[JOURNAL_VERSION])?;
        file.sync_all()?;
        Ok(file)
    }

    fn encode_frame(entry: &T) -> Result<Vec<u8>> {
        let body = rmp_serde::to_vec(entry)?;

        let mut frame = Vec::with_capacity(body.len() + FRAME_OVERHEAD);
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        Ok(frame)
    }

    /// Decode every frame. Returns the entries and the length of the valid
    /// prefix of the file.
    fn replay(path: &Path, bytes: &[u8], magic: &[u8; 4]) -> Result<(Vec<T>, u64)> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(RosterError::InvalidFormat(format!(
                "Journal header too short: {}",
                path.display()
            )));
        }
        if &bytes[0..4] != magic {
            return Err(RosterError::InvalidFormat(format!(
                "Invalid journal magic: {}",
                path.display()
            )));
        }
        if bytes[4] != JOURNAL_VERSION {
            return Err(RosterError::InvalidFormat(format!(
                "Unsupported journal version: {}",
                bytes[4]
            )));
        }

        let mut entries = Vec::new();
        let mut offset = HEADER_SIZE as usize;

        while offset < bytes.len() {
            let remaining = bytes.len() - offset;
            if remaining < FRAME_OVERHEAD {
                break;
            }

            let len = read_u32(bytes, offset) as usize;
            if len > MAX_FRAME_SIZE {
                return Err(RosterError::Corruption(format!(
                    "Journal frame too large at offset {offset}"
                )));
            }
            if remaining < len + FRAME_OVERHEAD {
                // A torn write leaves nothing intact behind it
                if Self::intact_frame_after(bytes, offset + 1) {
                    return Err(RosterError::Corruption(format!(
                        "Journal frame at offset {offset} overruns valid frames"
                    )));
                }
                break;
            }

            let body = &bytes[offset + 4..offset + 4 + len];
            let stored = read_u32(bytes, offset + 4 + len);
            let computed = crc32fast::hash(body);
            let frame_end = offset + len + FRAME_OVERHEAD;

            if stored != computed {
                if frame_end == bytes.len() {
                    break;
                }
                return Err(RosterError::ChecksumMismatch {
                    expected: stored,
                    got: computed,
                });
            }

            let entry = rmp_serde::from_slice(body).map_err(|e| {
                RosterError::Corruption(format!("Undecodable journal frame at offset {offset}: {e}"))
            })?;
            entries.push(entry);
            offset = frame_end;
        }

        Ok((entries, offset as u64))
    }

    /// Whether a complete frame with a matching checksum and a decodable
    /// body starts anywhere at or after `from`.
    fn intact_frame_after(bytes: &[u8], from: usize) -> bool {
        let last_start = bytes.len().saturating_sub(FRAME_OVERHEAD);
        (from..=last_start).any(|start| {
            let len = read_u32(bytes, start) as usize;
            if len == 0 || len > bytes.len() - start - FRAME_OVERHEAD {
                return false;
            }
            let body = &bytes[start + 4..start + 4 + len];
            read_u32(bytes, start + 4 + len) == crc32fast::hash(body)
                && rmp_serde::from_slice::<T>(body).is_ok()
        })
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
