// Classifier metadata models
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    VeryHigh,
    High,
    Good,
}

/// Public view of a registered classifier (no inference handle)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub priority: u32, // lower ranks first
    pub accuracy_tier: AccuracyTier,
    pub speed: String,
    pub recommended: bool,
}
