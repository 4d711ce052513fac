// Results store: append-only history of terminal jobs
//
// Records are written once, when a job reaches a terminal state, and are
// never updated afterwards. Deletion is the only other mutation.

use crate::file_manager::{read_json_file_or_default, write_json_file};
use crate::models::{HistoryFilter, HistoryRecord};
use log::{debug, info};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("History storage error: {0}")]
    Io(String),

    #[error("History already contains job {0}")]
    Duplicate(String),
}

pub struct HistoryStore {
    path: Option<PathBuf>, // None keeps history in memory only
    records: Mutex<Vec<HistoryRecord>>,
}

impl HistoryStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Open (or lazily create) a history file
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let records: Vec<HistoryRecord> =
            read_json_file_or_default(path).map_err(HistoryError::Io)?;
        info!("Loaded {} history record(s) from {:?}", records.len(), path);

        Ok(Self {
            path: Some(path.to_path_buf()),
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        match &self.path {
            Some(path) => write_json_file(path, &records).map_err(HistoryError::Io),
            None => Ok(()),
        }
    }

    /// Append a terminal job's record. Visible to readers only once persisted.
    pub fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let mut records = self.records.lock();

        if records.iter().any(|r| r.id == record.id) {
            return Err(HistoryError::Duplicate(record.id));
        }

        let id = record.id.clone();
        records.push(record);
        if let Err(e) = self.persist(&records) {
            records.pop();
            return Err(e);
        }

        debug!("Recorded job {} in history", id);
        Ok(())
    }

    /// Matching records, most recently created first
    pub fn list(&self, filter: &HistoryFilter) -> Vec<HistoryRecord> {
        let mut matching: Vec<HistoryRecord> = self
            .records
            .lock()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matching
    }

    pub fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    /// Remove a record; deleting an unknown id is a no-op returning `None`
    pub fn delete(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let mut records = self.records.lock();

        let Some(position) = records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = records.remove(position);
        if let Err(e) = self.persist(&records) {
            records.insert(position, removed);
            return Err(e);
        }

        info!("Deleted history record {}", id);
        Ok(Some(removed))
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
