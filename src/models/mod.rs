// Data models (structs)
pub mod analysis_job;
pub mod history;
pub mod model_info;
pub mod prediction;
pub mod settings;

pub use analysis_job::*;
pub use history::*;
pub use model_info::*;
pub use prediction::*;
pub use settings::*;
