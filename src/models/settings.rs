// Settings data models
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a job when one of its models fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Job completes if at least one model succeeded
    #[default]
    PartialSuccess,
    /// First failing model fails the whole job
    FailFast,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub min_samples: usize,
    pub dataset_retention_hours: u64,
    pub model_timeout_secs: u64,
    pub failure_policy: FailurePolicy,
    pub max_concurrent_jobs: usize,
    pub log_level: String,
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_samples: 50,
            dataset_retention_hours: 24,
            model_timeout_secs: 120,
            failure_policy: FailurePolicy::PartialSuccess,
            max_concurrent_jobs: 4,
            log_level: String::from("info"),
            log_to_file: false,
        }
    }
}

impl Settings {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn dataset_retention(&self) -> Duration {
        Duration::from_secs(self.dataset_retention_hours * 60 * 60)
    }
}
