// Application state shared by every command handler

use crate::dataset::{DatasetStore, DatasetValidator};
use crate::file_manager::{initialize_json_file, read_json_file};
use crate::history::HistoryStore;
use crate::logging::init_logging;
use crate::models::Settings;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::registry::{self, load_registry, ModelRegistry};
use crate::utils::{
    get_artifacts_dir, get_history_json_path, get_models_json_path, get_settings_json_path,
    initialize_data_directories,
};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const DATASET_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct AppState {
    pub settings: Settings,
    pub validator: DatasetValidator,
    pub datasets: Arc<DatasetStore>,
    pub registry: Arc<ModelRegistry>,
    pub history: Arc<HistoryStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wire the components together. Must be called from within a Tokio runtime.
    pub fn new(settings: Settings, registry: Arc<ModelRegistry>, history: Arc<HistoryStore>) -> Self {
        let datasets = Arc::new(DatasetStore::new(settings.dataset_retention()));
        datasets.spawn_sweeper(DATASET_SWEEP_INTERVAL);

        let orchestrator = Orchestrator::new(
            registry.clone(),
            datasets.clone(),
            history.clone(),
            OrchestratorConfig::from(&settings),
            Handle::current(),
        );

        Self {
            validator: DatasetValidator::new(settings.min_samples),
            settings,
            datasets,
            registry,
            history,
            orchestrator,
        }
    }

    /// Load everything from the application directory
    pub fn bootstrap() -> Result<Self, String> {
        let settings = load_settings()?;
        init_logging(&settings);

        initialize_data_directories()?;

        let registry = load_registry(&get_models_json_path(), &get_artifacts_dir())
            .map_err(|e| e.to_string())?;
        let registry = match registry::init_global(registry) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("{}; reusing the installed registry", e);
                registry::global().ok_or_else(|| e.to_string())?
            }
        };

        let history = HistoryStore::open(&get_history_json_path()).map_err(|e| e.to_string())?;

        info!(
            "CellClassify ready: {} model(s), {} history record(s)",
            registry.len(),
            history.len()
        );

        Ok(Self::new(settings, registry, Arc::new(history)))
    }
}

/// Read `settings.json`, creating it with defaults on first start
pub fn load_settings() -> Result<Settings, String> {
    let path = get_settings_json_path();
    initialize_json_file(&path, &Settings::default())?;
    read_json_file(&path)
}
