use super::CommandError;
use crate::models::{HistoryFilter, HistoryRecord, JobState};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

/// One line of the history listing; the frozen job is fetched separately
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
    pub state: JobState,
    pub model_ids: Vec<String>,
    pub sample_count: usize,
    pub feature_count: usize,
    pub best_model: Option<String>,
    pub best_accuracy: Option<f64>,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&HistoryRecord> for HistoryEntry {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            filename: record.filename.clone(),
            state: record.state,
            model_ids: record.job.model_ids.clone(),
            sample_count: record.job.sample_count(),
            feature_count: record.job.feature_count,
            best_model: record.best_model.clone(),
            best_accuracy: record.best_accuracy,
            duration_ms: record.duration_ms,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeleteHistoryResponse {
    pub deleted: bool,
}

pub fn list_history(state: &AppState, filter: &HistoryFilter) -> Vec<HistoryEntry> {
    let records = state.history.list(filter);
    debug!("History query {:?} matched {} record(s)", filter, records.len());
    records.iter().map(HistoryEntry::from).collect()
}

pub fn get_history_record(state: &AppState, id: &str) -> Result<HistoryRecord, CommandError> {
    state
        .history
        .get(id)
        .ok_or_else(|| CommandError::new("job_not_found", format!("Job not found: {}", id)))
}

/// Delete a history record and its retained dataset. Unknown ids succeed.
///
/// A finished job whose history write failed is still held by the
/// orchestrator; deleting its id releases it as well.
pub fn delete_history(state: &AppState, id: &str) -> Result<DeleteHistoryResponse, CommandError> {
    let released = state.orchestrator.release(id);
    let removed = state.history.delete(id)?.map(|record| record.job);

    let Some(job) = removed.or(released) else {
        return Ok(DeleteHistoryResponse { deleted: false });
    };
    if state.datasets.remove(&job.dataset_id) {
        debug!("Removed dataset {} with history record {}", job.dataset_id, id);
    }
    Ok(DeleteHistoryResponse { deleted: true })
}
