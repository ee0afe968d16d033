use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::{corrupt_at, io_at, StoreError};
use crate::model::record::{IndexEntry, TranslationRecord};
use crate::services::atomic;

const RECORDS_DIR: &str = "translations";
const RECORD_FILE: &str = "record.json";
const INDEX_FILE: &str = "translations_index.json";

type Index = BTreeMap<Uuid, DateTime<Utc>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactReport {
    pub removed_orphans: usize,
    /// Index entries whose record was missing or unreadable.
    pub dropped_entries: usize,
}

/// Synchronous view of the on-disk store, owned by the worker in `mod.rs`.
#[derive(Debug)]
pub(super) struct RecordDir {
    root: PathBuf,
}

impl RecordDir {
    pub(super) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    fn record_dir(&self, id: Uuid) -> PathBuf {
        self.records_dir().join(id.to_string())
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.record_dir(id).join(RECORD_FILE)
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn ensure_records_dir(&self) -> Result<PathBuf, StoreError> {
        let dir = self.records_dir();
        fs::create_dir_all(&dir).map_err(io_at(&dir))?;
        Ok(dir)
    }

    pub(super) fn save(&self, record: &TranslationRecord) -> Result<(), StoreError> {
        self.ensure_records_dir()?;

        let dir = self.record_dir(record.id());
        let existed = dir.exists();
        fs::create_dir_all(&dir).map_err(io_at(&dir))?;

        let path = dir.join(RECORD_FILE);
        let json = serde_json::to_vec_pretty(record).map_err(corrupt_at(&path))?;
        write_atomic(&path, &json)?;

        let indexed = self.load_index_for_update().and_then(|mut index| {
            index.insert(record.id(), record.created_at());
            self.write_index(&index)
        });

        if let Err(e) = indexed {
            tracing::warn!(id = %record.id(), error = %e, "index update failed after record write");
            if !existed {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    tracing::warn!(path = %dir.display(), error = %cleanup, "could not roll back unindexed record");
                }
            }
            return Err(e);
        }

        tracing::debug!(id = %record.id(), "saved translation record");
        Ok(())
    }

    pub(super) fn list(&self) -> Vec<TranslationRecord> {
        let index = match read_index(&self.index_path()) {
            Ok(Some(index)) => index,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "index unreadable; treating history as empty");
                return Vec::new();
            }
        };

        let mut records: Vec<TranslationRecord> = index
            .keys()
            .filter_map(|&id| match self.read_record(id) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "skipping unavailable record");
                    None
                }
            })
            .collect();

        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });

        records
    }

    pub(super) fn entries(&self) -> Vec<IndexEntry> {
        match read_index(&self.index_path()) {
            Ok(Some(index)) => index
                .into_iter()
                .map(|(record_id, created_at)| IndexEntry {
                    record_id,
                    created_at,
                })
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "index unreadable");
                Vec::new()
            }
        }
    }

    pub(super) fn get(&self, id: Uuid) -> Result<TranslationRecord, StoreError> {
        let index = read_index(&self.index_path())?.unwrap_or_default();
        if !index.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        self.read_record(id)
    }

    pub(super) fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let dir = self.record_dir(id);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(io_at(&dir))?;
        }

        let mut index = self.load_index_for_update()?;
        let removed = index.remove(&id).is_some();
        self.write_index(&index)?;

        tracing::debug!(%id, removed, "deleted translation record");
        Ok(())
    }

    pub(super) fn clear_all(&self) -> Result<(), StoreError> {
        let dir = self.records_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_at(&dir)(e)),
        }

        self.ensure_records_dir()?;
        self.write_index(&Index::new())?;

        tracing::debug!("cleared all translation records");
        Ok(())
    }

    /// Drops index entries whose record cannot be read, then removes record
    /// directories the index does not know about.
    pub(super) fn compact(&self) -> Result<CompactReport, StoreError> {
        let mut index = self.load_index_for_update()?;
        let records_dir = self.ensure_records_dir()?;
        let mut report = CompactReport::default();

        let mut unreadable: Vec<Uuid> = Vec::new();
        for &id in index.keys() {
            match self.read_record(id) {
                Ok(_) => {}
                Err(e @ StoreError::Io { .. }) => return Err(e),
                Err(e) => {
                    tracing::debug!(%id, error = %e, "dropping unreadable index entry");
                    unreadable.push(id);
                }
            }
        }
        for id in &unreadable {
            index.remove(id);
        }
        report.dropped_entries = unreadable.len();

        for entry in fs::read_dir(&records_dir).map_err(io_at(&records_dir))? {
            let entry = entry.map_err(io_at(&records_dir))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let indexed = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
                .is_some_and(|id| index.contains_key(&id));

            if !indexed {
                fs::remove_dir_all(&path).map_err(io_at(&path))?;
                tracing::debug!(path = %path.display(), "removed orphaned record directory");
                report.removed_orphans += 1;
            }
        }

        self.write_index(&index)?;

        tracing::info!(
            removed_orphans = report.removed_orphans,
            dropped_entries = report.dropped_entries,
            "compacted record store"
        );
        Ok(report)
    }

    fn read_record(&self, id: Uuid) -> Result<TranslationRecord, StoreError> {
        let path = self.record_path(id);
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(io_at(&path)(e)),
        };

        let record: TranslationRecord = serde_json::from_slice(&data).map_err(corrupt_at(&path))?;

        if record.id() != id {
            return Err(StoreError::Corrupt {
                path,
                detail: format!("document holds record {} instead of {id}", record.id()),
            });
        }

        Ok(record)
    }

    fn load_index_for_update(&self) -> Result<Index, StoreError> {
        match read_index(&self.index_path()) {
            Ok(Some(index)) => Ok(index),
            Ok(None) => self.rebuild_index(),
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "rebuilding corrupt index from record directories");
                self.rebuild_index()
            }
            Err(e) => Err(e),
        }
    }

    fn rebuild_index(&self) -> Result<Index, StoreError> {
        let mut index = Index::new();
        let dir = self.records_dir();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(index),
            Err(e) => return Err(io_at(&dir)(e)),
        };

        for entry in entries.flatten() {
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
            else {
                continue;
            };

            if let Ok(record) = self.read_record(id) {
                index.insert(id, record.created_at());
            }
        }

        Ok(index)
    }

    fn write_index(&self, index: &Index) -> Result<(), StoreError> {
        let path = self.index_path();
        let json = serde_json::to_vec_pretty(index).map_err(corrupt_at(&path))?;
        write_atomic(&path, &json)
    }
}

fn read_index(path: &Path) -> Result<Option<Index>, StoreError> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_at(path)(e)),
    };

    let raw: BTreeMap<String, DateTime<Utc>> =
        serde_json::from_slice(&data).map_err(corrupt_at(path))?;

    let mut index = Index::new();
    for (key, created_at) in raw {
        match Uuid::parse_str(&key) {
            Ok(id) => {
                index.insert(id, created_at);
            }
            Err(_) => tracing::warn!(key = %key, "ignoring index entry with invalid record id"),
        }
    }

    Ok(Some(index))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    atomic::write_atomic(path, bytes).map_err(io_at(path))
}
