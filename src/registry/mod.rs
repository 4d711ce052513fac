//! Model registry.
//!
//! Holds every classifier available to the orchestrator. The registry is
//! built once at startup (`register` needs `&mut self`) and then shared
//! read-only behind an `Arc`, so jobs never contend on it.

pub mod config;

use crate::inference::InferenceBackend;
use crate::models::ModelInfo;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

pub use config::{build_registry, default_model_specs, load_registry, BackendSpec, ModelSpec};

static GLOBAL_REGISTRY: OnceLock<Arc<ModelRegistry>> = OnceLock::new();

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    #[error("Model registry already initialized")]
    AlreadyInitialized,

    #[error("Model configuration error: {0}")]
    Config(String),
}

/// Metadata plus inference handle for one classifier
#[derive(Clone)]
pub struct ModelDescriptor {
    info: ModelInfo,
    backend: Arc<dyn InferenceBackend>,
}

impl ModelDescriptor {
    pub fn new(info: ModelInfo, backend: Arc<dyn InferenceBackend>) -> Self {
        Self { info, backend }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn priority(&self) -> u32 {
        self.info.priority
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn backend(&self) -> Arc<dyn InferenceBackend> {
        self.backend.clone()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>, // kept sorted by (priority, id)
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<(), RegistryError> {
        if self.models.iter().any(|m| m.id() == descriptor.id()) {
            return Err(RegistryError::DuplicateModel(descriptor.id().to_string()));
        }

        let position = self
            .models
            .partition_point(|m| (m.priority(), m.id()) < (descriptor.priority(), descriptor.id()));
        self.models.insert(position, descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ModelDescriptor, RegistryError> {
        self.models
            .iter()
            .find(|m| m.id() == id)
            .ok_or_else(|| RegistryError::ModelNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    /// All models in priority order
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn infos(&self) -> Vec<ModelInfo> {
        self.models.iter().map(|m| m.info().clone()).collect()
    }

    /// Rank of a model in the registry ordering; lower ranks first
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.models.iter().position(|m| m.id() == id)
    }

    /// Recommended models in priority order, falling back to the top model
    pub fn default_selection(&self) -> Vec<String> {
        let recommended: Vec<String> = self
            .models
            .iter()
            .filter(|m| m.info().recommended)
            .map(|m| m.id().to_string())
            .collect();

        if recommended.is_empty() {
            self.models.iter().take(1).map(|m| m.id().to_string()).collect()
        } else {
            recommended
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Install the process-wide registry; only the first call succeeds
pub fn init_global(registry: ModelRegistry) -> Result<Arc<ModelRegistry>, RegistryError> {
    let registry = Arc::new(registry);
    GLOBAL_REGISTRY
        .set(registry.clone())
        .map_err(|_| RegistryError::AlreadyInitialized)?;
    Ok(registry)
}

pub fn global() -> Option<Arc<ModelRegistry>> {
    GLOBAL_REGISTRY.get().cloned()
}
