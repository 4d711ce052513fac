use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

static APP_DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const HOME_ENV_VAR: &str = "CELLCLASSIFY_HOME";

pub fn get_app_data_dir() -> PathBuf {
    APP_DATA_DIR
        .get_or_init(|| {
            if let Ok(home) = std::env::var(HOME_ENV_VAR) {
                if !home.trim().is_empty() {
                    return PathBuf::from(home);
                }
            }
            let base_dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."));
            base_dir.join("CellClassify")
        })
        .clone()
}

pub fn get_data_dir() -> PathBuf {
    get_app_data_dir().join("data")
}

pub fn get_logs_dir() -> PathBuf {
    get_app_data_dir().join("logs")
}

pub fn get_artifacts_dir() -> PathBuf {
    get_app_data_dir().join("artifacts")
}

pub fn get_settings_json_path() -> PathBuf {
    get_data_dir().join("settings.json")
}

pub fn get_models_json_path() -> PathBuf {
    get_data_dir().join("models.json")
}

pub fn get_history_json_path() -> PathBuf {
    get_data_dir().join("history.json")
}

pub fn initialize_data_directories() -> Result<(), String> {
    let directories = [get_data_dir(), get_logs_dir(), get_artifacts_dir()];

    for dir in &directories {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                format!("Failed to create directory {:?}: {}", dir, e)
            })?;
            log::debug!("Created directory: {:?}", dir);
        }
    }

    log::info!("Data directories initialized at: {:?}", get_app_data_dir());
    Ok(())
}
