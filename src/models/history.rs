// History data models
use super::analysis_job::{AnalysisJob, JobState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Frozen snapshot of a terminal job plus derived summary fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: String, // same as the job id
    pub filename: String,
    pub state: JobState,
    pub best_model: Option<String>,
    pub best_accuracy: Option<f64>,
    pub duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub job: AnalysisJob,
}

impl HistoryRecord {
    pub fn from_job(job: AnalysisJob) -> Self {
        Self {
            id: job.id.clone(),
            filename: job.filename.clone(),
            state: job.state,
            best_model: job.best_model.clone(),
            best_accuracy: job.best_accuracy(),
            duration_ms: job.duration_ms(),
            created_at: job.created_at,
            recorded_at: Utc::now(),
            job,
        }
    }
}

/// History query; every field is optional and they compose with AND
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub search: Option<String>, // substring of filename or id, case-insensitive
    pub status: Option<JobState>,
    pub model: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !record.filename.to_lowercase().contains(&needle)
                && !record.id.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.state != status {
                return false;
            }
        }

        if let Some(model) = &self.model {
            if !record.job.model_ids.iter().any(|m| m == model) {
                return false;
            }
        }

        true
    }
}
