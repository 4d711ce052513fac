// Inference capability seam
// Every classifier, in-process or external, is reached through InferenceBackend

pub mod linear;
pub mod metrics;
pub mod worker_backend;

use crate::dataset::Dataset;
use crate::models::PredictionResult;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use linear::{LinearArtifact, LinearBackend};
pub use worker_backend::PythonWorkerBackend;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    Failed(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// A pre-trained classifier: a pure function from a dataset to predictions.
///
/// Implementations must not mutate shared state; the same dataset is handed
/// to several backends concurrently.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn predict(&self, dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError>;
}
