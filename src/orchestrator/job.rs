// Analysis job lifecycle
//
// CREATED -> RUNNING -> {COMPLETED, FAILED, CANCELLED}. Every transition and
// every result-map write happens under the handle's mutex; the terminal
// check and the write are one critical section.

use crate::dataset::Dataset;
use crate::models::{AnalysisJob, FailurePolicy, JobState, ModelSlot};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Outcome of offering a model result to a job
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Accepted,
    /// This result completed the job; carries the terminal snapshot
    Finished(AnalysisJob),
    /// The job was already terminal or the slot was filled; nothing changed
    Discarded,
}

/// Registry position of each requested model, used to break accuracy ties
#[derive(Debug, Clone, Default)]
pub struct ModelRanking {
    ranks: HashMap<String, usize>,
}

impl ModelRanking {
    pub fn new(ranks: HashMap<String, usize>) -> Self {
        Self { ranks }
    }

    fn rank(&self, model_id: &str) -> usize {
        self.ranks.get(model_id).copied().unwrap_or(usize::MAX)
    }
}

/// Highest accuracy, then highest F1, then the model registered first
pub fn best_model(job: &AnalysisJob, ranking: &ModelRanking) -> Option<String> {
    job.results
        .iter()
        .filter_map(|(id, slot)| slot.result().map(|r| (id, r)))
        .max_by(|(a_id, a), (b_id, b)| {
            a.accuracy()
                .total_cmp(&b.accuracy())
                .then_with(|| a.f1_score().total_cmp(&b.f1_score()))
                .then_with(|| ranking.rank(b_id).cmp(&ranking.rank(a_id)))
                .then_with(|| b_id.cmp(a_id))
        })
        .map(|(id, _)| id.clone())
}

impl AnalysisJob {
    /// CREATED -> RUNNING
    pub fn start(&mut self) -> bool {
        if self.state != JobState::Created {
            return false;
        }
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Any non-terminal state -> CANCELLED
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.finish(JobState::Cancelled, Some("Cancelled by user".to_string()));
        true
    }

    /// Store one model's outcome. Slots are written at most once and never after
    /// the job has become terminal.
    pub fn record(
        &mut self,
        model_id: &str,
        slot: ModelSlot,
        policy: FailurePolicy,
        ranking: &ModelRanking,
    ) -> RecordOutcome {
        if self.state != JobState::Running
            || self.results.contains_key(model_id)
            || !self.model_ids.iter().any(|m| m == model_id)
        {
            return RecordOutcome::Discarded;
        }

        let failure = match &slot {
            ModelSlot::Failed { message, .. } => Some(format!("{}: {}", model_id, message)),
            ModelSlot::Success { .. } => None,
        };

        self.results.insert(model_id.to_string(), slot);
        self.progress = self.results.len() as f64 / self.model_ids.len() as f64;

        if let (Some(failure), FailurePolicy::FailFast) = (&failure, policy) {
            self.finish(JobState::Failed, Some(failure.clone()));
            return RecordOutcome::Finished(self.clone());
        }

        if self.results.len() < self.model_ids.len() {
            return RecordOutcome::Accepted;
        }

        if self.results.values().any(ModelSlot::is_success) {
            self.best_model = best_model(self, ranking);
            self.finish(JobState::Completed, None);
        } else {
            let reasons: Vec<String> = self
                .model_ids
                .iter()
                .filter_map(|id| match self.results.get(id) {
                    Some(ModelSlot::Failed { message, .. }) => Some(format!("{}: {}", id, message)),
                    _ => None,
                })
                .collect();
            self.finish(
                JobState::Failed,
                Some(format!("All models failed ({})", reasons.join("; "))),
            );
        }
        RecordOutcome::Finished(self.clone())
    }

    fn finish(&mut self, state: JobState, error: Option<String>) {
        self.state = state;
        self.error = error;
        self.completed_at = Some(Utc::now());
    }
}

/// Live job owned by the orchestrator while it is active
pub struct JobHandle {
    job: Mutex<AnalysisJob>,
    dataset: Arc<Dataset>,
    ranking: ModelRanking,
    cancel: CancellationToken, // fires on cancel or fail-fast; stops in-flight model tasks
    state_tx: watch::Sender<JobState>,
    settled_tx: watch::Sender<bool>, // set once the terminal job has been handed to history
}

impl JobHandle {
    pub fn new(job: AnalysisJob, dataset: Arc<Dataset>, ranking: ModelRanking) -> Self {
        let (state_tx, _) = watch::channel(job.state);
        let (settled_tx, _) = watch::channel(false);
        Self {
            job: Mutex::new(job),
            dataset,
            ranking,
            cancel: CancellationToken::new(),
            state_tx,
            settled_tx,
        }
    }

    pub fn id(&self) -> String {
        self.job.lock().id.clone()
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        self.dataset.clone()
    }

    pub fn state(&self) -> JobState {
        self.job.lock().state
    }

    pub fn snapshot(&self) -> AnalysisJob {
        self.job.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state_tx.subscribe()
    }

    pub fn mark_settled(&self) {
        self.settled_tx.send_replace(true);
    }

    /// Resolves after `mark_settled`, which only follows a terminal transition
    pub async fn settled(&self) {
        let mut rx = self.settled_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|settled| *settled).await;
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn start(&self) -> bool {
        let mut job = self.job.lock();
        let started = job.start();
        if started {
            self.state_tx.send_replace(job.state);
        }
        started
    }

    pub fn record(&self, model_id: &str, slot: ModelSlot, policy: FailurePolicy) -> RecordOutcome {
        let mut job = self.job.lock();
        let outcome = job.record(model_id, slot, policy, &self.ranking);
        if let RecordOutcome::Finished(_) = &outcome {
            self.state_tx.send_replace(job.state);
            // Remaining model tasks have nowhere to write; let them stop early
            self.cancel.cancel();
        }
        outcome
    }

    /// Cancel the job, returning the terminal snapshot, or `None` if it had
    /// already finished
    pub fn cancel(&self) -> Option<AnalysisJob> {
        let mut job = self.job.lock();
        if !job.cancel() {
            return None;
        }
        self.state_tx.send_replace(job.state);
        self.cancel.cancel();
        Some(job.clone())
    }
}
