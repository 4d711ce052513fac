// Static model configuration loaded at startup

use super::{ModelDescriptor, ModelRegistry, RegistryError};
use crate::file_manager::read_json_file;
use crate::inference::{InferenceBackend, LinearBackend, PythonWorkerBackend};
use crate::models::{AccuracyTier, ModelInfo};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSpec {
    PythonWorker { script: String },
    Linear { artifact: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub priority: u32,
    pub accuracy_tier: AccuracyTier,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub recommended: bool,
    pub backend: BackendSpec,
}

impl ModelSpec {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority,
            accuracy_tier: self.accuracy_tier,
            speed: self.speed.clone(),
            recommended: self.recommended,
        }
    }

    fn build_backend(&self, artifacts_dir: &Path) -> Result<Arc<dyn InferenceBackend>, RegistryError> {
        match &self.backend {
            BackendSpec::PythonWorker { script } => {
                Ok(Arc::new(PythonWorkerBackend::new(self.id.clone(), script.clone())))
            }
            BackendSpec::Linear { artifact } => {
                let path = if artifact.is_absolute() {
                    artifact.clone()
                } else {
                    artifacts_dir.join(artifact)
                };
                let backend = LinearBackend::load(&path)
                    .map_err(|e| RegistryError::Config(format!("{}: {}", self.id, e)))?;
                Ok(Arc::new(backend))
            }
        }
    }
}

pub fn default_model_specs() -> Vec<ModelSpec> {
    vec![
        ModelSpec {
            id: "catboost".to_string(),
            name: "CatBoost".to_string(),
            description: "Gradient boosting with native categorical feature handling".to_string(),
            priority: 1,
            accuracy_tier: AccuracyTier::VeryHigh,
            speed: "fast".to_string(),
            recommended: true,
            backend: BackendSpec::PythonWorker {
                script: "catboost_classifier.py".to_string(),
            },
        },
        ModelSpec {
            id: "xgboost".to_string(),
            name: "XGBoost".to_string(),
            description: "Optimized extreme gradient boosting".to_string(),
            priority: 2,
            accuracy_tier: AccuracyTier::High,
            speed: "fast".to_string(),
            recommended: true,
            backend: BackendSpec::PythonWorker {
                script: "xgboost_classifier.py".to_string(),
            },
        },
        ModelSpec {
            id: "randomforest".to_string(),
            name: "Random Forest".to_string(),
            description: "Ensemble of decision trees".to_string(),
            priority: 3,
            accuracy_tier: AccuracyTier::Good,
            speed: "medium".to_string(),
            recommended: false,
            backend: BackendSpec::PythonWorker {
                script: "randomforest_classifier.py".to_string(),
            },
        },
    ]
}

pub fn build_registry(specs: &[ModelSpec], artifacts_dir: &Path) -> Result<ModelRegistry, RegistryError> {
    let mut registry = ModelRegistry::new();
    for spec in specs {
        let backend = spec.build_backend(artifacts_dir)?;
        registry.register(ModelDescriptor::new(spec.info(), backend))?;
    }
    Ok(registry)
}

/// Build the registry from `models.json`, or the default model set when absent
pub fn load_registry(config_path: &Path, artifacts_dir: &Path) -> Result<ModelRegistry, RegistryError> {
    let specs = if config_path.exists() {
        read_json_file::<Vec<ModelSpec>>(config_path).map_err(RegistryError::Config)?
    } else {
        default_model_specs()
    };

    let registry = build_registry(&specs, artifacts_dir)?;
    info!("Registered {} model(s)", registry.len());
    Ok(registry)
}
