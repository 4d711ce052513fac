// Command-line front end over the command handlers

use crate::commands::{analysis, datasets, export, history, models};
use crate::models::{HistoryFilter, JobState};
use crate::state::AppState;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "cellclassify",
    about = "Run ICM/TE classifiers over single-cell expression datasets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List registered models in priority order.
    Models,

    /// Upload a dataset, analyze it and print the final status.
    Analyze(AnalyzeArgs),

    /// List past analyses, newest first.
    History(HistoryArgs),

    /// Delete a history record and its retained dataset.
    #[command(name = "history-delete")]
    HistoryDelete { id: String },
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// CSV, XLSX or XLS file with one row per cell.
    pub file: PathBuf,

    /// Comma-separated model ids; defaults to the recommended models.
    #[arg(long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Write the results here; the extension picks csv, tsv or json.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Case-insensitive substring of file name or job id.
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub status: Option<JobState>,

    /// Only analyses that requested this model.
    #[arg(long)]
    pub model: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

async fn run_analyze(state: &AppState, args: AnalyzeArgs) -> Result<(), String> {
    let bytes = fs::read(&args.file).map_err(|e| format!("Failed to read {:?}: {}", args.file, e))?;
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());

    let summary =
        datasets::upload_dataset(state, &filename, &bytes, None).map_err(|e| e.to_string())?;
    eprintln!(
        "Dataset {}: {} samples, {} features",
        summary.dataset_id, summary.sample_count, summary.feature_count
    );

    let started = analysis::start_analysis(state, &summary.dataset_id, args.models)
        .map_err(|e| e.to_string())?;
    eprintln!("Job {} running [{}]", started.job_id, started.model_ids.join(", "));

    let status = analysis::wait_for_job(state, &started.job_id)
        .await
        .map_err(|e| e.to_string())?;
    print_json(&status)?;

    if let Some(out) = args.export {
        let format = out
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "csv".to_string());
        let payload = export::export_results(state, &started.job_id, &format)
            .map_err(|e| e.to_string())?;
        fs::write(&out, &payload.bytes).map_err(|e| format!("Failed to write {:?}: {}", out, e))?;
        eprintln!("Exported results to {:?}", out);
    }

    if status.state == JobState::Completed {
        Ok(())
    } else {
        Err(format!(
            "Job {} ended {}: {}",
            status.job_id,
            status.state,
            status.error.unwrap_or_default()
        ))
    }
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let state = AppState::bootstrap()?;

    match cli.command {
        Commands::Models => print_json(&models::list_models(&state)),
        Commands::Analyze(args) => run_analyze(&state, args).await,
        Commands::History(args) => {
            let filter = HistoryFilter {
                search: args.search,
                status: args.status,
                model: args.model,
            };
            print_json(&history::list_history(&state, &filter))
        }
        Commands::HistoryDelete { id } => {
            let response = history::delete_history(&state, &id).map_err(|e| e.to_string())?;
            print_json(&response)
        }
    }
}
