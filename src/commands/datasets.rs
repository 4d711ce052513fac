use super::CommandError;
use crate::dataset::DatasetSummary;
use crate::state::AppState;
use log::{info, warn};

/// Validate an uploaded file and keep it for analysis.
///
/// `declared_format` may be a MIME type or extension; without one the file
/// name's extension decides.
pub fn upload_dataset(
    state: &AppState,
    filename: &str,
    bytes: &[u8],
    declared_format: Option<&str>,
) -> Result<DatasetSummary, CommandError> {
    let declared = declared_format.unwrap_or(filename);

    let dataset = match state.validator.validate(bytes, declared) {
        Ok(dataset) => dataset.with_filename(filename),
        Err(e) => {
            warn!("Rejected upload {}: {}", filename, e);
            return Err(e.into());
        }
    };

    let dataset = state.datasets.insert(dataset);
    let summary = dataset.summary();
    info!(
        "Accepted dataset {} ({}): {} samples x {} features",
        summary.dataset_id, filename, summary.sample_count, summary.feature_count
    );
    Ok(summary)
}
