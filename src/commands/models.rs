use crate::models::ModelInfo;
use crate::state::AppState;

/// Registered models in priority order
pub fn list_models(state: &AppState) -> Vec<ModelInfo> {
    state.registry.infos()
}
