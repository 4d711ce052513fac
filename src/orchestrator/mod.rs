//! Analysis orchestrator.
//!
//! Accepts analysis requests, fans one inference task out per requested
//! model and folds their outcomes into the job as they arrive. Each model
//! task races its backend against the per-model timeout and the job's
//! cancellation token; whatever it ends up with is offered to the job, which
//! decides under its own lock whether the result still counts.
//!
//! Terminal jobs are written to history and then dropped from the active
//! set, so status lookups fall through to history once a job is done.

pub mod job;

use crate::dataset::DatasetStore;
use crate::history::{HistoryError, HistoryStore};
use crate::inference::InferenceError;
use crate::models::{AnalysisJob, FailureKind, FailurePolicy, HistoryRecord, ModelSlot, Settings};
use crate::registry::{ModelDescriptor, ModelRegistry};
use futures::FutureExt;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

pub use job::{best_model, JobHandle, ModelRanking, RecordOutcome};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Invalid model selection: {0}")]
    InvalidModelSelection(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {0} has already finished")]
    JobAlreadyFinished(String),

    #[error("Job {0} has not finished yet")]
    NotTerminal(String),

    #[error("Too many active jobs (limit {0})")]
    TooManyJobs(usize),

    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    pub model_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub max_concurrent_jobs: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            model_timeout: settings.model_timeout(),
            failure_policy: settings.failure_policy,
            max_concurrent_jobs: settings.max_concurrent_jobs,
        }
    }
}

pub struct Orchestrator {
    registry: Arc<ModelRegistry>,
    datasets: Arc<DatasetStore>,
    history: Arc<HistoryStore>,
    config: OrchestratorConfig,
    runtime: Handle,
    jobs: RwLock<HashMap<String, Arc<JobHandle>>>, // active jobs, plus terminal ones whose persistence failed
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        datasets: Arc<DatasetStore>,
        history: Arc<HistoryStore>,
        config: OrchestratorConfig,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            datasets,
            history,
            config,
            runtime,
            jobs: RwLock::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Number of jobs still in CREATED or RUNNING
    pub fn active_jobs(&self) -> usize {
        self.jobs
            .read()
            .values()
            .filter(|h| !h.state().is_terminal())
            .count()
    }

    fn resolve_models(&self, model_ids: &[String]) -> Result<Vec<ModelDescriptor>, OrchestratorError> {
        if model_ids.is_empty() {
            return Err(OrchestratorError::InvalidModelSelection(
                "at least one model must be selected".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = model_ids
            .iter()
            .filter(|id| !seen.insert(id.as_str()))
            .map(String::as_str)
            .collect();
        if !duplicates.is_empty() {
            return Err(OrchestratorError::InvalidModelSelection(format!(
                "duplicate model ids: {}",
                duplicates.join(", ")
            )));
        }

        let mut descriptors = Vec::with_capacity(model_ids.len());
        let mut unknown = Vec::new();
        for id in model_ids {
            match self.registry.get(id) {
                Ok(descriptor) => descriptors.push(descriptor.clone()),
                Err(_) => unknown.push(id.as_str()),
            }
        }
        if !unknown.is_empty() {
            return Err(OrchestratorError::InvalidModelSelection(format!(
                "unknown model ids: {}",
                unknown.join(", ")
            )));
        }

        Ok(descriptors)
    }

    /// Validate a request and start the analysis. Nothing is created when any
    /// check fails.
    pub fn submit(
        self: &Arc<Self>,
        dataset_id: &str,
        model_ids: Vec<String>,
    ) -> Result<String, OrchestratorError> {
        let descriptors = self.resolve_models(&model_ids)?;

        let dataset = self
            .datasets
            .get(dataset_id)
            .ok_or_else(|| OrchestratorError::DatasetNotFound(dataset_id.to_string()))?;

        let ranking = ModelRanking::new(
            model_ids
                .iter()
                .filter_map(|id| self.registry.rank_of(id).map(|rank| (id.clone(), rank)))
                .collect(),
        );

        let job = AnalysisJob::new(
            uuid::Uuid::new_v4().to_string(),
            dataset.id().to_string(),
            dataset.filename().to_string(),
            model_ids,
            dataset.sample_ids().to_vec(),
            dataset.labels().map(<[_]>::to_vec),
        )
        .with_feature_count(dataset.feature_count());
        let job_id = job.id.clone();
        let handle = Arc::new(JobHandle::new(job, dataset, ranking));

        {
            let mut jobs = self.jobs.write();
            let active = jobs.values().filter(|h| !h.state().is_terminal()).count();
            if active >= self.config.max_concurrent_jobs {
                return Err(OrchestratorError::TooManyJobs(self.config.max_concurrent_jobs));
            }
            jobs.insert(job_id.clone(), handle.clone());
        }

        info!(
            "Submitted job {} on dataset {} with models [{}]",
            job_id,
            dataset_id,
            descriptors.iter().map(|d| d.id()).collect::<Vec<_>>().join(", ")
        );

        handle.start();
        for descriptor in descriptors {
            let this = self.clone();
            let handle = handle.clone();
            self.runtime.spawn(async move {
                this.run_model(handle, descriptor).await;
            });
        }

        Ok(job_id)
    }

    async fn run_model(self: Arc<Self>, handle: Arc<JobHandle>, descriptor: ModelDescriptor) {
        let model_id = descriptor.id().to_string();
        let dataset = handle.dataset();
        let sample_count = dataset.sample_count();
        let timeout = self.config.model_timeout;
        let backend = descriptor.backend();

        debug!("[{}] Model {} started", handle.id(), model_id);

        let inference = AssertUnwindSafe(backend.predict(dataset)).catch_unwind();

        let slot = tokio::select! {
            _ = handle.cancelled() => {
                debug!("[{}] Model {} abandoned, job already finished", handle.id(), model_id);
                return;
            }
            outcome = tokio::time::timeout(timeout, inference) => match outcome {
                Err(_) => ModelSlot::Failed {
                    kind: FailureKind::Timeout,
                    message: format!("No result within {}s", timeout.as_secs_f64()),
                },
                Ok(Err(_)) => ModelSlot::Failed {
                    kind: FailureKind::InferenceFailure,
                    message: "Model backend panicked".to_string(),
                },
                Ok(Ok(Err(e))) => ModelSlot::Failed {
                    kind: FailureKind::InferenceFailure,
                    message: e.to_string(),
                },
                Ok(Ok(Ok(result))) => match result.check_shape(sample_count) {
                    Ok(()) => ModelSlot::Success { result },
                    Err(reason) => ModelSlot::Failed {
                        kind: FailureKind::InferenceFailure,
                        message: InferenceError::InvalidOutput(reason).to_string(),
                    },
                },
            },
        };

        if let ModelSlot::Failed { message, .. } = &slot {
            warn!("[{}] Model {} failed: {}", handle.id(), model_id, message);
        }

        match handle.record(&model_id, slot, self.config.failure_policy) {
            RecordOutcome::Accepted => debug!("[{}] Model {} finished", handle.id(), model_id),
            RecordOutcome::Discarded => {
                debug!("[{}] Late result from {} discarded", handle.id(), model_id)
            }
            RecordOutcome::Finished(snapshot) => self.finalize(&handle, snapshot).await,
        }
    }

    /// Persist a terminal job, then release it from the active set. Waiters
    /// are woken only after the history write has been attempted.
    async fn finalize(&self, handle: &JobHandle, snapshot: AnalysisJob) {
        let job_id = snapshot.id.clone();
        info!(
            "Job {} finished: {} (best model: {})",
            job_id,
            snapshot.state,
            snapshot.best_model.as_deref().unwrap_or("none")
        );

        let history = self.history.clone();
        let record = HistoryRecord::from_job(snapshot);
        match tokio::task::spawn_blocking(move || history.append(record)).await {
            Ok(Ok(())) => {
                self.jobs.write().remove(&job_id);
            }
            Ok(Err(e)) => error!("Failed to record job {} in history: {}", job_id, e),
            Err(e) => error!("History task for job {} failed: {}", job_id, e),
        }
        handle.mark_settled();
    }

    /// Drop a terminal job that is still held in memory, which only happens
    /// when its history write failed
    pub fn release(&self, job_id: &str) -> Option<AnalysisJob> {
        let mut jobs = self.jobs.write();
        if !jobs.get(job_id)?.state().is_terminal() {
            return None;
        }
        let handle = jobs.remove(job_id)?;
        warn!("Released unpersisted job {}", job_id);
        Some(handle.snapshot())
    }

    /// Current snapshot of a job, active or historical
    pub fn get_status(&self, job_id: &str) -> Result<AnalysisJob, OrchestratorError> {
        if let Some(handle) = self.jobs.read().get(job_id) {
            return Ok(handle.snapshot());
        }

        self.history
            .get(job_id)
            .map(|record| record.job)
            .ok_or_else(|| OrchestratorError::JobNotFound(job_id.to_string()))
    }

    /// Final snapshot of a terminal job
    pub fn get_results(&self, job_id: &str) -> Result<AnalysisJob, OrchestratorError> {
        let job = self.get_status(job_id)?;
        if !job.state.is_terminal() {
            return Err(OrchestratorError::NotTerminal(job_id.to_string()));
        }
        Ok(job)
    }

    pub async fn cancel(&self, job_id: &str) -> Result<AnalysisJob, OrchestratorError> {
        let handle = self.jobs.read().get(job_id).cloned();
        let Some(handle) = handle else {
            return match self.history.get(job_id) {
                Some(_) => Err(OrchestratorError::JobAlreadyFinished(job_id.to_string())),
                None => Err(OrchestratorError::JobNotFound(job_id.to_string())),
            };
        };

        let snapshot = handle
            .cancel()
            .ok_or_else(|| OrchestratorError::JobAlreadyFinished(job_id.to_string()))?;

        info!("Cancelled job {}", job_id);
        self.finalize(&handle, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Resolve once the job is terminal and its history write is done
    pub async fn wait(&self, job_id: &str) -> Result<AnalysisJob, OrchestratorError> {
        let handle = self.jobs.read().get(job_id).cloned();
        if let Some(handle) = handle {
            handle.settled().await;
            return Ok(handle.snapshot());
        }

        self.get_results(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::inference::InferenceBackend;
    use crate::models::{
        AccuracyTier, ClassificationMetrics, HistoryFilter, JobState, Label, ModelInfo,
        PredictionResult,
    };
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    enum Behavior {
        Succeed { accuracy: f64, delay: Duration },
        Fail,
        Hang,
        Panic,
        WrongLength,
    }

    struct StubBackend(Behavior);

    fn prediction(samples: usize, accuracy: f64) -> PredictionResult {
        PredictionResult {
            predictions: vec![Label::Te; samples],
            confidences: vec![0.9; samples],
            metrics: ClassificationMetrics {
                accuracy,
                f1_score: accuracy,
                auc_score: accuracy,
                per_class: BTreeMap::new(),
            },
        }
    }

    #[async_trait]
    impl InferenceBackend for StubBackend {
        async fn predict(&self, dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError> {
            match &self.0 {
                Behavior::Succeed { accuracy, delay } => {
                    tokio::time::sleep(*delay).await;
                    Ok(prediction(dataset.sample_count(), *accuracy))
                }
                Behavior::Fail => Err(InferenceError::Failed("model exploded".to_string())),
                Behavior::Hang => futures::future::pending().await,
                Behavior::Panic => panic!("backend bug"),
                Behavior::WrongLength => Ok(prediction(dataset.sample_count() + 1, 0.9)),
            }
        }
    }

    fn registry(models: Vec<(&str, Behavior)>) -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        for (priority, (id, behavior)) in models.into_iter().enumerate() {
            let info = ModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                priority: priority as u32 + 1,
                accuracy_tier: AccuracyTier::High,
                speed: "fast".to_string(),
                recommended: true,
            };
            registry
                .register(ModelDescriptor::new(info, Arc::new(StubBackend(behavior))))
                .unwrap();
        }
        Arc::new(registry)
    }

    fn quick(accuracy: f64) -> Behavior {
        Behavior::Succeed {
            accuracy,
            delay: Duration::from_millis(5),
        }
    }

    struct Fixture {
        orchestrator: Arc<Orchestrator>,
        history: Arc<HistoryStore>,
        dataset_id: String,
    }

    fn fixture(models: Vec<(&str, Behavior)>, config: OrchestratorConfig) -> Fixture {
        fixture_with_history(models, config, HistoryStore::in_memory())
    }

    fn fixture_with_history(
        models: Vec<(&str, Behavior)>,
        config: OrchestratorConfig,
        history: HistoryStore,
    ) -> Fixture {
        let datasets = Arc::new(DatasetStore::new(Duration::from_secs(3600)));
        let dataset = Dataset::from_parts(
            (0..3).map(|i| format!("cell-{}", i)).collect(),
            vec!["GATA3".to_string(), "NANOG".to_string()],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            None,
        )
        .unwrap()
        .with_filename("embryo.csv");
        let dataset_id = dataset.id().to_string();
        datasets.insert(dataset);

        let history = Arc::new(history);
        let orchestrator = Orchestrator::new(
            registry(models),
            datasets,
            history.clone(),
            config,
            Handle::current(),
        );
        Fixture {
            orchestrator,
            history,
            dataset_id,
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_models_succeed() {
        let f = fixture(
            vec![("catboost", quick(0.97)), ("xgboost", quick(0.95))],
            OrchestratorConfig::default(),
        );
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.results.len(), 2);
        assert_eq!(job.best_model.as_deref(), Some("catboost"));
        assert_eq!(job.filename, "embryo.csv");
    }

    #[tokio::test]
    async fn test_one_timeout_yields_partial_completion() {
        let config = OrchestratorConfig {
            model_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        };
        let f = fixture(vec![("catboost", quick(0.97)), ("xgboost", Behavior::Hang)], config);
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(matches!(
            job.results["xgboost"],
            ModelSlot::Failed {
                kind: FailureKind::Timeout,
                ..
            }
        ));
        assert_eq!(job.best_model.as_deref(), Some("catboost"));
    }

    #[tokio::test]
    async fn test_all_models_failing_fails_job() {
        let f = fixture(
            vec![("catboost", Behavior::Fail), ("xgboost", Behavior::Panic)],
            OrchestratorConfig::default(),
        );
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert!(job.results.values().all(|slot| !slot.is_success()));
        assert!(job.error.unwrap().contains("panicked"));
    }

    #[tokio::test]
    async fn test_malformed_result_counts_as_failure() {
        let f = fixture(
            vec![("catboost", quick(0.9)), ("xgboost", Behavior::WrongLength)],
            OrchestratorConfig::default(),
        );
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(!job.results["xgboost"].is_success());
    }

    #[tokio::test]
    async fn test_fail_fast_policy() {
        let config = OrchestratorConfig {
            failure_policy: FailurePolicy::FailFast,
            ..OrchestratorConfig::default()
        };
        let f = fixture(vec![("catboost", Behavior::Fail), ("xgboost", Behavior::Hang)], config);
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert!(!job.results.contains_key("xgboost"));
    }

    #[tokio::test]
    async fn test_invalid_selection_creates_nothing() {
        let f = fixture(vec![("catboost", quick(0.9))], OrchestratorConfig::default());

        for selection in [vec![], ids(&["catboost", "unknown-model"]), ids(&["catboost", "catboost"])] {
            let err = f.orchestrator.submit(&f.dataset_id, selection).unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidModelSelection(_)));
        }
        assert_eq!(f.orchestrator.active_jobs(), 0);
        assert!(f.history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_dataset_rejected() {
        let f = fixture(vec![("catboost", quick(0.9))], OrchestratorConfig::default());
        let err = f.orchestrator.submit("missing", ids(&["catboost"])).unwrap_err();
        assert_eq!(err, OrchestratorError::DatasetNotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_job_limit() {
        let config = OrchestratorConfig {
            max_concurrent_jobs: 1,
            ..OrchestratorConfig::default()
        };
        let f = fixture(vec![("catboost", Behavior::Hang)], config);
        let first = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap();

        let err = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap_err();
        assert_eq!(err, OrchestratorError::TooManyJobs(1));

        f.orchestrator.cancel(&first).await.unwrap();
        assert!(f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).is_ok());
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let f = fixture(
            vec![("catboost", quick(0.9)), ("xgboost", Behavior::Hang)],
            OrchestratorConfig::default(),
        );
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let cancelled = f.orchestrator.cancel(&job_id).await.unwrap();
        assert_eq!(cancelled.state, JobState::Cancelled);

        let err = f.orchestrator.cancel(&job_id).await.unwrap_err();
        assert_eq!(err, OrchestratorError::JobAlreadyFinished(job_id.clone()));

        let record = f.history.get(&job_id).unwrap();
        assert_eq!(record.job, cancelled);
        assert!(!record.job.results.contains_key("xgboost"));
    }

    #[tokio::test]
    async fn test_status_of_running_job_and_results_guard() {
        let f = fixture(vec![("catboost", Behavior::Hang)], OrchestratorConfig::default());
        let job_id = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap();

        let status = f.orchestrator.get_status(&job_id).unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(
            f.orchestrator.get_results(&job_id).unwrap_err(),
            OrchestratorError::NotTerminal(job_id.clone())
        );

        f.orchestrator.cancel(&job_id).await.unwrap();
        assert!(f.orchestrator.get_results(&job_id).is_ok());
        assert_eq!(
            f.orchestrator.get_status("nope").unwrap_err(),
            OrchestratorError::JobNotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_terminal_snapshots_are_identical() {
        let f = fixture(
            vec![("catboost", quick(0.97)), ("xgboost", quick(0.95))],
            OrchestratorConfig::default(),
        );
        let job_id = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "xgboost"]))
            .unwrap();
        f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(f.orchestrator.active_jobs(), 0);
        assert_eq!(f.history.len(), 1);

        let a = serde_json::to_vec(&f.orchestrator.get_status(&job_id).unwrap()).unwrap();
        let b = serde_json::to_vec(&f.orchestrator.get_results(&job_id).unwrap()).unwrap();
        let c = serde_json::to_vec(&f.history.list(&HistoryFilter::default())[0].job).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[tokio::test]
    async fn test_wait_returns_after_history_write() {
        for _ in 0..20 {
            let f = fixture(
                vec![("catboost", quick(0.97))],
                OrchestratorConfig::default(),
            );
            let job_id = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap();

            let job = f.orchestrator.wait(&job_id).await.unwrap();
            assert_eq!(f.history.get(&job_id).map(|r| r.job), Some(job));
        }
    }

    #[tokio::test]
    async fn test_two_jobs_run_side_by_side() {
        let f = fixture(
            vec![
                ("catboost", quick(0.97)),
                ("xgboost", quick(0.95)),
                ("randomforest", Behavior::Fail),
            ],
            OrchestratorConfig::default(),
        );
        let first = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["catboost", "randomforest"]))
            .unwrap();
        let second = f
            .orchestrator
            .submit(&f.dataset_id, ids(&["xgboost", "catboost"]))
            .unwrap();
        assert_ne!(first, second);

        let (a, b) = tokio::join!(f.orchestrator.wait(&first), f.orchestrator.wait(&second));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.state, JobState::Completed);
        assert_eq!(a.best_model.as_deref(), Some("catboost"));
        assert!(!a.results["randomforest"].is_success());
        assert_eq!(b.state, JobState::Completed);
        assert_eq!(b.model_ids, ids(&["xgboost", "catboost"]));
        assert!(b.results.values().all(ModelSlot::is_success));

        assert_eq!(f.history.len(), 2);
        assert_eq!(f.orchestrator.active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_unpersisted_job_stays_queryable_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        // Parent of the history file is a regular file, so every write fails
        let history = HistoryStore::open(&blocker.join("history.json")).unwrap();

        let f = fixture_with_history(
            vec![("catboost", quick(0.9))],
            OrchestratorConfig::default(),
            history,
        );
        let job_id = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap();

        let job = f.orchestrator.wait(&job_id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(f.history.is_empty());
        assert_eq!(f.orchestrator.get_status(&job_id).unwrap(), job);

        assert_eq!(f.orchestrator.release(&job_id), Some(job));
        assert!(f.orchestrator.release(&job_id).is_none());
        assert_eq!(
            f.orchestrator.get_status(&job_id).unwrap_err(),
            OrchestratorError::JobNotFound(job_id.clone())
        );
    }

    #[tokio::test]
    async fn test_running_job_is_not_released() {
        let f = fixture(vec![("catboost", Behavior::Hang)], OrchestratorConfig::default());
        let job_id = f.orchestrator.submit(&f.dataset_id, ids(&["catboost"])).unwrap();

        assert!(f.orchestrator.release(&job_id).is_none());
        assert_eq!(f.orchestrator.active_jobs(), 1);
        f.orchestrator.cancel(&job_id).await.unwrap();
    }
}
