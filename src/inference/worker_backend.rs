// External model backend: a Python script holding the trained artifact

use super::{InferenceBackend, InferenceError};
use crate::dataset::Dataset;
use crate::models::{Label, PredictionResult};
use crate::process_manager::{spawn_python_worker_async, WorkerMessage};
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Payload written to the worker's stdin
#[derive(Serialize)]
struct WorkerInput<'a> {
    model_id: &'a str,
    sample_ids: &'a [String],
    feature_names: &'a [String],
    rows: Vec<&'a [f64]>,
    labels: Option<&'a [Label]>,
}

pub struct PythonWorkerBackend {
    model_id: String,
    script: String,
}

impl PythonWorkerBackend {
    pub fn new(model_id: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            script: script.into(),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }
}

#[async_trait]
impl InferenceBackend for PythonWorkerBackend {
    async fn predict(&self, dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError> {
        let input = WorkerInput {
            model_id: &self.model_id,
            sample_ids: dataset.sample_ids(),
            feature_names: dataset.feature_names(),
            rows: dataset.rows().collect(),
            labels: dataset.labels(),
        };

        let (tx, mut rx) = mpsc::channel::<WorkerMessage>(32);
        let model_id = self.model_id.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let WorkerMessage::Progress { percent, stage } = message {
                    debug!("[{}] {}% {}", model_id, percent, stage);
                }
            }
        });

        let data = spawn_python_worker_async(&self.script, &input, Some(tx))
            .await
            .map_err(InferenceError::Worker)?;

        serde_json::from_value(data)
            .map_err(|e| InferenceError::InvalidOutput(format!("Unreadable worker result: {}", e)))
    }
}
