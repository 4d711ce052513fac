// Prediction data models
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed label set produced by every classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    #[serde(rename = "ICM")]
    Icm,
    #[serde(rename = "TE")]
    Te,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Icm, Label::Te];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Icm => "ICM",
            Label::Te => "TE",
        }
    }

    /// Case-insensitive parse of "ICM" / "TE"
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("icm") {
            Some(Label::Icm)
        } else if value.eq_ignore_ascii_case("te") {
            Some(Label::Te)
        } else {
            None
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub f1_score: f64,
    pub auc_score: f64,
    #[serde(default)]
    pub per_class: BTreeMap<Label, ClassMetrics>,
}

impl ClassificationMetrics {
    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        [self.accuracy, self.f1_score, self.auc_score]
            .into_iter()
            .chain(
                self.per_class
                    .values()
                    .flat_map(|c| [c.precision, c.recall, c.f1_score]),
            )
    }
}

/// Output of one model over one dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub predictions: Vec<Label>,
    pub confidences: Vec<f64>, // confidence of the predicted label, 0-1
    pub metrics: ClassificationMetrics,
}

impl PredictionResult {
    pub fn accuracy(&self) -> f64 {
        self.metrics.accuracy
    }

    pub fn f1_score(&self) -> f64 {
        self.metrics.f1_score
    }

    /// Check the result is coherent with a dataset of `sample_count` rows
    pub fn check_shape(&self, sample_count: usize) -> Result<(), String> {
        if self.predictions.len() != sample_count {
            return Err(format!(
                "Expected {} predictions, got {}",
                sample_count,
                self.predictions.len()
            ));
        }

        if self.confidences.len() != sample_count {
            return Err(format!(
                "Expected {} confidence scores, got {}",
                sample_count,
                self.confidences.len()
            ));
        }

        if let Some(bad) = self
            .confidences
            .iter()
            .find(|c| !c.is_finite() || **c < 0.0 || **c > 1.0)
        {
            return Err(format!("Confidence score out of range: {}", bad));
        }

        if let Some(bad) = self
            .metrics
            .values()
            .find(|m| !m.is_finite() || *m < 0.0 || *m > 1.0)
        {
            return Err(format!("Metric out of range: {}", bad));
        }

        Ok(())
    }
}
