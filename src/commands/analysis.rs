use super::CommandError;
use crate::models::{AnalysisJob, JobState, ModelSlot};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisStarted {
    pub job_id: String,
    pub model_ids: Vec<String>,
}

/// Status view of a job: state, progress and whatever results have arrived
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobStatus {
    pub job_id: String,
    pub filename: String,
    pub state: JobState,
    pub progress: f64,
    pub model_ids: Vec<String>,
    pub partial_results: BTreeMap<String, ModelSlot>,
    pub best_model: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AnalysisJob> for JobStatus {
    fn from(job: AnalysisJob) -> Self {
        Self {
            job_id: job.id,
            filename: job.filename,
            state: job.state,
            progress: job.progress,
            model_ids: job.model_ids,
            partial_results: job.results,
            best_model: job.best_model,
            error: job.error,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Start an analysis. Without an explicit model list the registry's
/// recommended selection is used.
pub fn start_analysis(
    state: &AppState,
    dataset_id: &str,
    model_ids: Option<Vec<String>>,
) -> Result<AnalysisStarted, CommandError> {
    let model_ids = model_ids.unwrap_or_else(|| state.registry.default_selection());
    let job_id = state.orchestrator.submit(dataset_id, model_ids.clone())?;
    Ok(AnalysisStarted { job_id, model_ids })
}

pub fn get_job_status(state: &AppState, job_id: &str) -> Result<JobStatus, CommandError> {
    Ok(state.orchestrator.get_status(job_id)?.into())
}

/// Full snapshot; only available once the job is terminal
pub fn get_job_results(state: &AppState, job_id: &str) -> Result<AnalysisJob, CommandError> {
    Ok(state.orchestrator.get_results(job_id)?)
}

pub async fn cancel_analysis(state: &AppState, job_id: &str) -> Result<JobStatus, CommandError> {
    Ok(state.orchestrator.cancel(job_id).await?.into())
}

pub async fn wait_for_job(state: &AppState, job_id: &str) -> Result<JobStatus, CommandError> {
    Ok(state.orchestrator.wait(job_id).await?.into())
}
