// Command handlers - one file per concern
//
// Each handler takes the shared AppState and returns a serialisable payload
// or a CommandError carrying a stable snake_case code.
pub mod analysis;
pub mod datasets;
pub mod export;
pub mod history;
pub mod models;

use crate::dataset::ValidationError;
use crate::export::ExportError;
use crate::history::HistoryError;
use crate::orchestrator::OrchestratorError;
use crate::registry::RegistryError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandError {
    pub code: &'static str,
    pub message: String,
}

impl CommandError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for CommandError {}

impl From<ValidationError> for CommandError {
    fn from(e: ValidationError) -> Self {
        let code = match e {
            ValidationError::UnsupportedFormat(_) => "unsupported_format",
            ValidationError::MalformedData(_) => "malformed_data",
            ValidationError::EmptyDataset => "empty_dataset",
        };
        Self::new(code, e.to_string())
    }
}

impl From<RegistryError> for CommandError {
    fn from(e: RegistryError) -> Self {
        let code = match e {
            RegistryError::ModelNotFound(_) => "model_not_found",
            RegistryError::DuplicateModel(_) => "duplicate_model",
            RegistryError::AlreadyInitialized => "registry_already_initialized",
            RegistryError::Config(_) => "model_config",
        };
        Self::new(code, e.to_string())
    }
}

impl From<OrchestratorError> for CommandError {
    fn from(e: OrchestratorError) -> Self {
        let code = match &e {
            OrchestratorError::InvalidModelSelection(_) => "invalid_model_selection",
            OrchestratorError::DatasetNotFound(_) => "dataset_not_found",
            OrchestratorError::JobNotFound(_) => "job_not_found",
            OrchestratorError::JobAlreadyFinished(_) => "job_already_finished",
            OrchestratorError::NotTerminal(_) => "not_terminal",
            OrchestratorError::TooManyJobs(_) => "too_many_jobs",
            OrchestratorError::History(inner) => return inner.clone().into(),
        };
        Self::new(code, e.to_string())
    }
}

impl From<HistoryError> for CommandError {
    fn from(e: HistoryError) -> Self {
        let code = match e {
            HistoryError::Io(_) => "history_io",
            HistoryError::Duplicate(_) => "history_duplicate",
        };
        Self::new(code, e.to_string())
    }
}

impl From<ExportError> for CommandError {
    fn from(e: ExportError) -> Self {
        let code = match e {
            ExportError::NotExportable { .. } => "not_exportable",
            ExportError::Csv(_) | ExportError::Serialization(_) => "export_failed",
        };
        Self::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobState;

    #[test]
    fn test_error_codes() {
        assert_eq!(CommandError::from(ValidationError::EmptyDataset).code, "empty_dataset");
        assert_eq!(
            CommandError::from(OrchestratorError::InvalidModelSelection("x".to_string())).code,
            "invalid_model_selection"
        );
        assert_eq!(
            CommandError::from(ExportError::NotExportable {
                id: "job".to_string(),
                state: JobState::Failed
            })
            .code,
            "not_exportable"
        );
        assert_eq!(
            CommandError::from(OrchestratorError::History(HistoryError::Io("disk".to_string()))).code,
            "history_io"
        );
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_value(CommandError::new("job_not_found", "Job not found: x")).unwrap();
        assert_eq!(json["code"], "job_not_found");
        assert_eq!(json["message"], "Job not found: x");
    }
}
