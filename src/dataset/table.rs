// In-memory validated dataset
use super::validator::ValidationError;
use crate::models::Label;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable numeric matrix indexed by (sample, feature name).
///
/// Values are stored row-major; every row has exactly `feature_count()`
/// entries, there is at least one feature and feature names are unique.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
    sample_ids: Vec<String>,
    feature_names: Vec<String>,
    feature_lookup: HashMap<String, usize>,
    values: Vec<f64>,
    labels: Option<Vec<Label>>,
}

/// Shape summary returned to callers after upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub filename: String,
    pub sample_count: usize,
    pub feature_count: usize,
    pub feature_preview: Vec<String>, // first 10 feature names
    pub has_ground_truth: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn from_parts(
        sample_ids: Vec<String>,
        feature_names: Vec<String>,
        values: Vec<f64>,
        labels: Option<Vec<Label>>,
    ) -> Result<Self, ValidationError> {
        if sample_ids.is_empty() {
            return Err(ValidationError::EmptyDataset);
        }

        if feature_names.is_empty() {
            return Err(ValidationError::MalformedData(
                "Dataset has no feature columns".to_string(),
            ));
        }

        if values.len() != sample_ids.len() * feature_names.len() {
            return Err(ValidationError::MalformedData(format!(
                "Expected {} values for {} samples x {} features, got {}",
                sample_ids.len() * feature_names.len(),
                sample_ids.len(),
                feature_names.len(),
                values.len()
            )));
        }

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ValidationError::MalformedData(format!(
                "Non-finite value in matrix: {}",
                bad
            )));
        }

        let mut feature_lookup = HashMap::with_capacity(feature_names.len());
        for (index, name) in feature_names.iter().enumerate() {
            if feature_lookup.insert(name.clone(), index).is_some() {
                return Err(ValidationError::MalformedData(format!(
                    "Duplicate feature name: {}",
                    name
                )));
            }
        }

        if let Some(labels) = &labels {
            if labels.len() != sample_ids.len() {
                return Err(ValidationError::MalformedData(format!(
                    "Expected {} labels, got {}",
                    sample_ids.len(),
                    labels.len()
                )));
            }
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: String::from("dataset"),
            uploaded_at: Utc::now(),
            sample_ids,
            feature_names,
            feature_lookup,
            values,
            labels,
        })
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn labels(&self) -> Option<&[Label]> {
        self.labels.as_deref()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_lookup.get(name).copied()
    }

    /// Feature values of one sample
    pub fn row(&self, sample: usize) -> &[f64] {
        let width = self.feature_count();
        &self.values[sample * width..(sample + 1) * width]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.feature_count())
    }

    pub fn value(&self, sample: usize, feature: &str) -> Option<f64> {
        if sample >= self.sample_count() {
            return None;
        }
        self.feature_index(feature).map(|f| self.row(sample)[f])
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            dataset_id: self.id.clone(),
            filename: self.filename.clone(),
            sample_count: self.sample_count(),
            feature_count: self.feature_count(),
            feature_preview: self.feature_names.iter().take(10).cloned().collect(),
            has_ground_truth: self.labels.is_some(),
            uploaded_at: self.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("cell_{}", i)).collect()
    }

    #[test]
    fn test_rows_and_lookup() {
        let dataset = Dataset::from_parts(
            ids(2),
            vec!["GATA3".to_string(), "NANOG".to_string()],
            vec![1.0, 2.0, 3.0, 4.0],
            None,
        )
        .unwrap();

        assert_eq!(dataset.row(1), &[3.0, 4.0]);
        assert_eq!(dataset.value(0, "NANOG"), Some(2.0));
        assert_eq!(dataset.value(0, "SOX2"), None);
        assert_eq!(dataset.value(5, "NANOG"), None);
        assert_eq!(dataset.rows().count(), 2);
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        let err = Dataset::from_parts(
            ids(1),
            vec!["GATA3".to_string(), "GATA3".to_string()],
            vec![1.0, 2.0],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedData(_)));
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let err = Dataset::from_parts(ids(2), vec!["GATA3".to_string()], vec![1.0], None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedData(_)));
    }

    #[test]
    fn test_summary_previews_ten_features() {
        let names: Vec<String> = (0..12).map(|i| format!("gene_{}", i)).collect();
        let dataset = Dataset::from_parts(ids(1), names, vec![0.5; 12], None)
            .unwrap()
            .with_filename("embryo.csv");

        let summary = dataset.summary();
        assert_eq!(summary.filename, "embryo.csv");
        assert_eq!(summary.feature_count, 12);
        assert_eq!(summary.feature_preview.len(), 10);
        assert!(!summary.has_ground_truth);
    }
}
