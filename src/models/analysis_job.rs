// Analysis job data models
use super::prediction::{Label, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(JobState::Created),
            "running" => Ok(JobState::Running),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" => Ok(JobState::Cancelled),
            _ => Err(format!("Invalid job state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    InferenceFailure,
}

/// Entry of a job's result map for one requested model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelSlot {
    Success { result: PredictionResult },
    Failed { kind: FailureKind, message: String },
}

impl ModelSlot {
    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            ModelSlot::Success { result } => Some(result),
            ModelSlot::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisJob {
    pub id: String,
    pub dataset_id: String,
    pub filename: String,
    pub model_ids: Vec<String>, // request order, fixed at creation
    pub state: JobState,
    pub results: BTreeMap<String, ModelSlot>,
    pub sample_ids: Vec<String>,
    #[serde(default)]
    pub feature_count: usize,
    #[serde(default)]
    pub ground_truth: Option<Vec<Label>>,
    pub progress: f64, // 0-1
    pub best_model: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    pub fn new(
        id: String,
        dataset_id: String,
        filename: String,
        model_ids: Vec<String>,
        sample_ids: Vec<String>,
        ground_truth: Option<Vec<Label>>,
    ) -> Self {
        Self {
            id,
            dataset_id,
            filename,
            model_ids,
            state: JobState::Created,
            results: BTreeMap::new(),
            sample_ids,
            feature_count: 0,
            ground_truth,
            progress: 0.0,
            best_model: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_feature_count(mut self, feature_count: usize) -> Self {
        self.feature_count = feature_count;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_ids.len()
    }

    /// Successful slots in request order
    pub fn successful_results(&self) -> impl Iterator<Item = (&str, &PredictionResult)> {
        self.model_ids.iter().filter_map(|id| {
            self.results
                .get(id)
                .and_then(ModelSlot::result)
                .map(|r| (id.as_str(), r))
        })
    }

    pub fn best_accuracy(&self) -> Option<f64> {
        self.successful_results()
            .map(|(_, r)| r.accuracy())
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_milliseconds())
    }
}
