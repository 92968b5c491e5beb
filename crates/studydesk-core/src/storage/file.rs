//! JSON file persistence.
//!
//! The whole snapshot is written as pretty JSON to a temporary file next to
//! the target and then renamed over it, so a crash mid-write leaves the
//! previous snapshot in place.
//!
//! Several processes may share one file (a running timer and one-shot
//! commands). Each save holds an exclusive lock on `<file>.lock`, re-reads
//! the file, and merges it with the local state when another writer has
//! changed it since this sink last loaded or saved.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use super::data_dir;
use crate::error::StorageError;
use crate::sink::PersistenceSink;
use crate::store::Snapshot;

pub const SNAPSHOT_FILE: &str = "studydesk.json";

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    /// What this sink last read or wrote; the merge base for the next save.
    base: Option<Snapshot>,
}

impl JsonFileSink {
    /// Sink at `<data dir>/studydesk.json`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::at(data_dir()?.join(SNAPSHOT_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| SNAPSHOT_FILE.into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    /// Blocks until this process holds the exclusive lock. Released on drop.
    fn acquire_lock(&self) -> Result<File, StorageError> {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .and_then(|file| file.lock_exclusive().map(|()| file))
            .map_err(|source| StorageError::WriteFailed {
                path: lock_path,
                source,
            })?;
        Ok(file)
    }

    fn read(&self) -> Result<Option<Snapshot>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let snapshot = serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }
}

impl PersistenceSink for JsonFileSink {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let path = self.path.clone();
        let write_failed = |source| StorageError::WriteFailed {
            path: path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let _lock = self.acquire_lock()?;
        let on_disk = self.read()?;
        // After a merge the caller still holds its unmerged state, so the
        // base stays its ancestor until a save goes through unmerged.
        let (merged, base) = match on_disk {
            Some(theirs) if self.base.as_ref() != Some(&theirs) => {
                info!(path = %self.path.display(), "snapshot changed by another writer, merging");
                let base = self.base.clone().unwrap_or_default();
                (snapshot.merge(&base, &theirs), base)
            }
            _ => (snapshot.clone(), snapshot.clone()),
        };

        let content = serde_json::to_string_pretty(&merged)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, content).map_err(write_failed)?;
        std::fs::rename(&tmp, &self.path).map_err(write_failed)?;
        debug!(path = %self.path.display(), "snapshot saved");
        self.base = Some(base);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, StorageError> {
        let snapshot = self.read()?;
        self.base = snapshot.clone();
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Settings;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::at(dir.path().join("studydesk.json"));
        assert!(sink.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::at(dir.path().join("nested").join("studydesk.json"));
        let snapshot = Snapshot {
            settings: Settings {
                dark_mode: true,
                ..Settings::default()
            },
            ..Snapshot::default()
        };
        sink.save(&snapshot).unwrap();
        assert_eq!(sink.load().unwrap(), Some(snapshot));
        assert!(!sink.tmp_path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studydesk.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut sink = JsonFileSink::at(&path);
        assert!(matches!(sink.load(), Err(StorageError::Corrupt { .. })));
    }
}
