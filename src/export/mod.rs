// Export formatter: serialize a completed job's results for download
//
// Tabular layout, one row per sample in dataset order:
//   sample_id[, true_label], <model>_prediction, <model>_confidence, ...
// Model column pairs follow the job's request order. A model whose slot
// failed keeps its columns, with empty cells.

use crate::models::{AnalysisJob, JobState, ModelSlot};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Job {id} is {state}; only completed jobs can be exported")]
    NotExportable { id: String, state: JobState },

    #[error("Failed to write export: {0}")]
    Csv(String),

    #[error("Failed to serialize export: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Tsv => "text/tab-separated-values",
            ExportFormat::Json => "application/json",
        }
    }

    fn delimiter(&self) -> Option<u8> {
        match self {
            ExportFormat::Csv => Some(b','),
            ExportFormat::Tsv => Some(b'\t'),
            ExportFormat::Json => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unsupported export format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn export_file_name(job_id: &str, format: ExportFormat) -> String {
    format!("analysis_{}_results.{}", job_id, format.extension())
}

fn header(job: &AnalysisJob) -> Vec<String> {
    let mut header = vec!["sample_id".to_string()];
    if job.ground_truth.is_some() {
        header.push("true_label".to_string());
    }
    for model_id in &job.model_ids {
        header.push(format!("{}_prediction", model_id));
        header.push(format!("{}_confidence", model_id));
    }
    header
}

fn row(job: &AnalysisJob, sample: usize) -> Vec<String> {
    let mut row = vec![job.sample_ids[sample].clone()];
    if let Some(truth) = &job.ground_truth {
        row.push(truth.get(sample).map(|l| l.to_string()).unwrap_or_default());
    }

    for model_id in &job.model_ids {
        match job.results.get(model_id).and_then(ModelSlot::result) {
            Some(result) => {
                row.push(
                    result
                        .predictions
                        .get(sample)
                        .map(|l| l.to_string())
                        .unwrap_or_default(),
                );
                row.push(
                    result
                        .confidences
                        .get(sample)
                        .map(|c| c.to_string())
                        .unwrap_or_default(),
                );
            }
            None => {
                row.push(String::new());
                row.push(String::new());
            }
        }
    }
    row
}

fn write_delimited(job: &AnalysisJob, delimiter: u8) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(header(job))
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for sample in 0..job.sample_count() {
        writer
            .write_record(row(job, sample))
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

/// Render a completed job in the requested format
pub fn export(job: &AnalysisJob, format: ExportFormat) -> Result<ExportPayload, ExportError> {
    if job.state != JobState::Completed {
        return Err(ExportError::NotExportable {
            id: job.id.clone(),
            state: job.state,
        });
    }

    let bytes = match format.delimiter() {
        Some(delimiter) => write_delimited(job, delimiter)?,
        None => serde_json::to_vec_pretty(job)
            .map_err(|e| ExportError::Serialization(e.to_string()))?,
    };

    debug!("Exported job {} as {} ({} bytes)", job.id, format, bytes.len());

    Ok(ExportPayload {
        file_name: export_file_name(&job.id, format),
        content_type: format.content_type(),
        bytes,
    })
}
