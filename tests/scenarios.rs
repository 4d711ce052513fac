// End-to-end scenarios through the command handlers with stub classifiers

use async_trait::async_trait;
use cellclassify_lib::commands::{analysis, datasets, export, history, models};
use cellclassify_lib::dataset::Dataset;
use cellclassify_lib::history::HistoryStore;
use cellclassify_lib::inference::{InferenceBackend, InferenceError};
use cellclassify_lib::models::{
    AccuracyTier, ClassificationMetrics, FailureKind, HistoryFilter, JobState, Label, ModelInfo,
    ModelSlot, PredictionResult, Settings,
};
use cellclassify_lib::registry::{ModelDescriptor, ModelRegistry};
use cellclassify_lib::AppState;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct FixedBackend {
    accuracy: f64,
}

#[async_trait]
impl InferenceBackend for FixedBackend {
    async fn predict(&self, dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let predictions: Vec<Label> = (0..dataset.sample_count())
            .map(|i| if i % 2 == 0 { Label::Te } else { Label::Icm })
            .collect();
        Ok(PredictionResult {
            confidences: vec![0.8; predictions.len()],
            predictions,
            metrics: ClassificationMetrics {
                accuracy: self.accuracy,
                f1_score: self.accuracy,
                auc_score: self.accuracy,
                per_class: BTreeMap::new(),
            },
        })
    }
}

struct StalledBackend;

#[async_trait]
impl InferenceBackend for StalledBackend {
    async fn predict(&self, _dataset: Arc<Dataset>) -> Result<PredictionResult, InferenceError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(InferenceError::Failed("unreachable".to_string()))
    }
}

fn descriptor(id: &str, priority: u32, backend: Arc<dyn InferenceBackend>) -> ModelDescriptor {
    ModelDescriptor::new(
        ModelInfo {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            priority,
            accuracy_tier: AccuracyTier::High,
            speed: "fast".to_string(),
            recommended: priority <= 2,
        },
        backend,
    )
}

fn app(xgboost: Arc<dyn InferenceBackend>) -> AppState {
    app_with_history(xgboost, HistoryStore::in_memory())
}

fn app_with_history(xgboost: Arc<dyn InferenceBackend>, history: HistoryStore) -> AppState {
    let mut registry = ModelRegistry::new();
    registry
        .register(descriptor("catboost", 1, Arc::new(FixedBackend { accuracy: 0.97 })))
        .unwrap();
    registry.register(descriptor("xgboost", 2, xgboost)).unwrap();
    registry
        .register(descriptor("randomforest", 3, Arc::new(FixedBackend { accuracy: 0.93 })))
        .unwrap();

    let settings = Settings {
        model_timeout_secs: 1,
        ..Settings::default()
    };
    AppState::new(settings, Arc::new(registry), Arc::new(history))
}

fn csv_dataset(samples: usize, features: usize) -> Vec<u8> {
    let mut text = String::from("cell_id");
    for f in 0..features {
        text.push_str(&format!(",GENE{}", f));
    }
    text.push('\n');
    for s in 0..samples {
        text.push_str(&format!("cell_{}", s));
        for f in 0..features {
            text.push_str(&format!(",{}", (s * 31 + f * 7) % 100));
        }
        text.push('\n');
    }
    text.into_bytes()
}

fn ids(ids: &[&str]) -> Option<Vec<String>> {
    Some(ids.iter().map(|s| s.to_string()).collect())
}

#[tokio::test]
async fn test_scenario_a_full_size_matrix_completes() {
    let state = app(Arc::new(FixedBackend { accuracy: 0.95 }));

    let (samples, features) = (1063, 18432);
    let dataset = Dataset::from_parts(
        (0..samples).map(|i| format!("cell_{}", i)).collect(),
        (0..features).map(|i| format!("GENE{}", i)).collect(),
        vec![0.5; samples * features],
        None,
    )
    .unwrap()
    .with_filename("embryo_1063.csv");
    let dataset = state.datasets.insert(dataset);

    let started = analysis::start_analysis(&state, dataset.id(), ids(&["catboost", "xgboost"])).unwrap();
    let status = analysis::wait_for_job(&state, &started.job_id).await.unwrap();

    assert_eq!(status.state, JobState::Completed);
    assert_eq!(status.partial_results.len(), 2);
    for slot in status.partial_results.values() {
        let result = slot.result().unwrap();
        assert_eq!(result.predictions.len(), samples);
        assert!((0.0..=1.0).contains(&result.accuracy()));
    }
    assert_eq!(status.best_model.as_deref(), Some("catboost"));
}

#[tokio::test]
async fn test_upload_reports_shape() {
    let state = app(Arc::new(FixedBackend { accuracy: 0.95 }));
    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(60, 12), None).unwrap();

    assert_eq!(summary.sample_count, 60);
    assert_eq!(summary.feature_count, 12);
    assert_eq!(summary.feature_preview.len(), 10);
    assert_eq!(summary.filename, "embryo.csv");

    let err = datasets::upload_dataset(&state, "embryo.pdf", b"%PDF", None).unwrap_err();
    assert_eq!(err.code, "unsupported_format");

    let err = datasets::upload_dataset(&state, "small.csv", &csv_dataset(49, 3), Some("text/csv"))
        .unwrap_err();
    assert_eq!(err.code, "malformed_data");
}

#[tokio::test]
async fn test_scenario_b_unknown_model_rejected_without_job() {
    let state = app(Arc::new(FixedBackend { accuracy: 0.95 }));
    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(50, 4), None).unwrap();

    let err = analysis::start_analysis(&state, &summary.dataset_id, ids(&["catboost", "unknown-model"]))
        .unwrap_err();
    assert_eq!(err.code, "invalid_model_selection");
    assert_eq!(state.orchestrator.active_jobs(), 0);
    assert!(history::list_history(&state, &HistoryFilter::default()).is_empty());
}

#[tokio::test]
async fn test_scenario_c_timeout_is_partial_success() {
    let state = app(Arc::new(StalledBackend));
    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(50, 4), None).unwrap();

    let started =
        analysis::start_analysis(&state, &summary.dataset_id, ids(&["catboost", "xgboost"])).unwrap();
    let status = analysis::wait_for_job(&state, &started.job_id).await.unwrap();

    assert_eq!(status.state, JobState::Completed);
    assert!(status.partial_results["catboost"].is_success());
    assert!(matches!(
        status.partial_results["xgboost"],
        ModelSlot::Failed {
            kind: FailureKind::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_scenario_d_export_has_row_per_sample_in_request_order() {
    let state = app(Arc::new(FixedBackend { accuracy: 0.95 }));
    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(55, 4), None).unwrap();

    let started = analysis::start_analysis(
        &state,
        &summary.dataset_id,
        ids(&["randomforest", "catboost"]),
    )
    .unwrap();
    analysis::wait_for_job(&state, &started.job_id).await.unwrap();

    let payload = export::export_results(&state, &started.job_id, "csv").unwrap();
    let text = String::from_utf8(payload.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 1 + 55);
    assert_eq!(
        lines[0],
        "sample_id,randomforest_prediction,randomforest_confidence,catboost_prediction,catboost_confidence"
    );
    assert!(lines[1].starts_with("cell_0,TE,0.8,TE,0.8"));
    assert_eq!(payload.file_name, format!("analysis_{}_results.csv", started.job_id));
}

#[tokio::test]
async fn test_default_selection_history_and_delete() {
    let state = app(Arc::new(FixedBackend { accuracy: 0.95 }));
    let summary = datasets::upload_dataset(&state, "Day5_embryo.csv", &csv_dataset(50, 4), None).unwrap();

    let started = analysis::start_analysis(&state, &summary.dataset_id, None).unwrap();
    assert_eq!(started.model_ids, vec!["catboost", "xgboost"]);
    analysis::wait_for_job(&state, &started.job_id).await.unwrap();

    let found = history::list_history(
        &state,
        &HistoryFilter {
            search: Some("day5".to_string()),
            status: Some(JobState::Completed),
            model: Some("xgboost".to_string()),
        },
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, started.job_id);
    assert_eq!(found[0].best_accuracy, Some(0.97));
    assert_eq!((found[0].sample_count, found[0].feature_count), (50, 4));

    assert!(history::delete_history(&state, &started.job_id).unwrap().deleted);
    assert!(!history::delete_history(&state, &started.job_id).unwrap().deleted);
    assert!(state.datasets.get(&summary.dataset_id).is_none());
}

#[tokio::test]
async fn test_status_results_and_cancel_surface() {
    let state = app(Arc::new(StalledBackend));
    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(50, 4), None).unwrap();

    let started = analysis::start_analysis(&state, &summary.dataset_id, ids(&["xgboost"])).unwrap();
    let status = analysis::get_job_status(&state, &started.job_id).unwrap();
    assert_eq!(status.state, JobState::Running);
    assert_eq!(status.progress, 0.0);

    let err = analysis::get_job_results(&state, &started.job_id).unwrap_err();
    assert_eq!(err.code, "not_terminal");

    let cancelled = analysis::cancel_analysis(&state, &started.job_id).await.unwrap();
    assert_eq!(cancelled.state, JobState::Cancelled);

    let err = export::export_results(&state, &started.job_id, "csv").unwrap_err();
    assert_eq!(err.code, "not_exportable");

    let err = analysis::cancel_analysis(&state, &started.job_id).await.unwrap_err();
    assert_eq!(err.code, "job_already_finished");

    let models = models::list_models(&state);
    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["catboost", "xgboost", "randomforest"]);
}

#[tokio::test]
async fn test_history_record_present_as_soon_as_wait_returns() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryStore::open(&dir.path().join("history.json")).unwrap();
    let state = app_with_history(Arc::new(FixedBackend { accuracy: 0.95 }), history);

    for _ in 0..10 {
        let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(50, 4), None).unwrap();
        let started = analysis::start_analysis(&state, &summary.dataset_id, ids(&["catboost"])).unwrap();
        let status = analysis::wait_for_job(&state, &started.job_id).await.unwrap();

        let record = history::get_history_record(&state, &started.job_id).unwrap();
        assert_eq!(record.state, status.state);
    }
    assert_eq!(HistoryStore::open(&dir.path().join("history.json")).unwrap().len(), 10);
}

#[tokio::test]
async fn test_delete_releases_job_whose_history_write_failed() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let history = HistoryStore::open(&blocker.join("history.json")).unwrap();
    let state = app_with_history(Arc::new(FixedBackend { accuracy: 0.95 }), history);

    let summary = datasets::upload_dataset(&state, "embryo.csv", &csv_dataset(50, 4), None).unwrap();
    let started = analysis::start_analysis(&state, &summary.dataset_id, ids(&["catboost"])).unwrap();
    analysis::wait_for_job(&state, &started.job_id).await.unwrap();

    assert_eq!(
        analysis::get_job_status(&state, &started.job_id).unwrap().state,
        JobState::Completed
    );
    assert!(history::get_history_record(&state, &started.job_id).is_err());

    assert!(history::delete_history(&state, &started.job_id).unwrap().deleted);
    assert_eq!(
        analysis::get_job_status(&state, &started.job_id).unwrap_err().code,
        "job_not_found"
    );
    assert!(state.datasets.get(&summary.dataset_id).is_none());
}
