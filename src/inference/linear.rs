// In-process logistic scorer loaded from a JSON artifact

use super::metrics::{evaluate, te_probability};
use super::{InferenceBackend, InferenceError};
use crate::dataset::Dataset;
use crate::file_manager::read_json_file;
use crate::models::{ClassificationMetrics, Label, PredictionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

fn default_threshold() -> f64 {
    0.5
}

/// Trained weights exported by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub weights: HashMap<String, f64>, // feature name -> weight
    pub bias: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64, // P(TE) at or above which TE is predicted
    pub reference_metrics: ClassificationMetrics, // hold-out metrics from training
}

pub struct LinearBackend {
    artifact: Arc<LinearArtifact>,
}

impl LinearBackend {
    pub fn new(artifact: LinearArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let artifact: LinearArtifact = read_json_file(path)?;
        Ok(Self::new(artifact))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn score(artifact: &LinearArtifact, dataset: &Dataset) -> Result<PredictionResult, InferenceError> {
    let weights: Vec<(usize, f64)> = artifact
        .weights
        .iter()
        .filter_map(|(name, w)| dataset.feature_index(name).map(|i| (i, *w)))
        .collect();

    if weights.is_empty() {
        return Err(InferenceError::Failed(
            "Model shares no features with the dataset".to_string(),
        ));
    }

    let mut predictions = Vec::with_capacity(dataset.sample_count());
    let mut confidences = Vec::with_capacity(dataset.sample_count());
    let mut te_scores = Vec::with_capacity(dataset.sample_count());

    for row in dataset.rows() {
        let logit = artifact.bias + weights.iter().map(|(i, w)| row[*i] * w).sum::<f64>();
        let p_te = sigmoid(logit);
        let label = if p_te >= artifact.threshold {
            Label::Te
        } else {
            Label::Icm
        };
        let confidence = match label {
            Label::Te => p_te,
            Label::Icm => 1.0 - p_te,
        };

        predictions.push(label);
        confidences.push(confidence);
        te_scores.push(te_probability(label, confidence));
    }

    let metrics = match dataset.labels() {
        Some(truth) => evaluate(truth, &predictions, &te_scores),
        None => artifact.reference_metrics.clone(),
    };

    Ok(PredictionResult {
        predictions,
        confidences,
        metrics,
    })
}

#[async_trait]
impl InferenceBackend for LinearBackend {
    async fn predict(&self, dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError> {
        let artifact = self.artifact.clone();
        tokio::task::spawn_blocking(move || score(&artifact, &dataset))
            .await
            .map_err(|e| InferenceError::Failed(format!("Scoring task failed: {}", e)))?
    }
}
