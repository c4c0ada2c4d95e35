use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::models::{Collection, Patient, Record};

/// Errors that can occur while persisting a collection.
///
/// Reads never fail: a missing or corrupt file reads as an empty collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("Failed to encode {0}: {1}")]
    Encode(&'static str, #[source] serde_json::Error),
}

/// Newest-first JSON collections under a data directory.
///
/// Every public method holds the store lock for its whole read-modify-write,
/// so an `append` never interleaves with an `update_sync_flag`.
#[derive(Debug)]
pub struct LocalStore {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full path for a collection.
    pub fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.filename())
    }

    /// All records of a collection, newest-first.
    pub fn get_all<T: Record>(&self) -> Vec<T> {
        let _guard = self.guard();
        self.read()
    }

    /// Records of one patient, storage order preserved.
    pub fn get_by_patient<T: Record>(&self, patient: Patient) -> Vec<T> {
        self.get_all::<T>()
            .into_iter()
            .filter(|r| r.patient() == patient)
            .collect()
    }

    /// Records not yet confirmed by the remote store.
    pub fn pending<T: Record>(&self) -> Vec<T> {
        self.get_all::<T>()
            .into_iter()
            .filter(|r| !r.is_synced())
            .collect()
    }

    /// Prepends a record and persists the whole collection.
    pub fn append<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        self.update(|mut records: Vec<T>| {
            records.insert(0, record.clone());
            records
        })
    }

    /// Marks the record with `id` as synced.
    ///
    /// Returns whether a record with that id exists. Only writes when the
    /// flag actually changes.
    pub fn update_sync_flag<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut records: Vec<T> = self.read();

        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(false);
        };
        if !record.is_synced() {
            record.mark_synced();
            self.write(&records)?;
        }
        Ok(true)
    }

    /// Overwrites a collection.
    pub fn replace_all<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.write(records)
    }

    /// Reads a collection, transforms it and writes it back under one lock.
    pub fn update<T, F>(&self, f: F) -> Result<(), StoreError>
    where
        T: Record,
        F: FnOnce(Vec<T>) -> Vec<T>,
    {
        let _guard = self.guard();
        let records = f(self.read());
        self.write(&records)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T: Record>(&self) -> Vec<T> {
        let path = self.path(T::COLLECTION);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt {} collection at {}: {}",
                    T::COLLECTION.label(),
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn write<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::Io(self.data_dir.clone(), e))?;

        let path = self.path(T::COLLECTION);
        let bytes = serde_json::to_vec(records)
            .map_err(|e| StoreError::Encode(T::COLLECTION.label(), e))?;
        fs::write(&path, bytes).map_err(|e| StoreError::Io(path, e))?;

        tracing::debug!(
            "Stored {} {} record(s)",
            records.len(),
            T::COLLECTION.label()
        );
        Ok(())
    }
}
