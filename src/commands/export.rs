use super::CommandError;
use crate::export::{export, ExportFormat, ExportPayload};
use crate::state::AppState;
use log::info;

pub fn export_results(
    state: &AppState,
    job_id: &str,
    format: &str,
) -> Result<ExportPayload, CommandError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: String| CommandError::new("unsupported_export_format", e))?;

    let job = state.orchestrator.get_status(job_id)?;
    let payload = export(&job, format)?;

    info!("Exported job {} as {}", job_id, payload.file_name);
    Ok(payload)
}
