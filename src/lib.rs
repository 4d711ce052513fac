pub mod cli;
pub mod commands;
pub mod dataset;
pub mod export;
pub mod file_manager;
pub mod history;
pub mod inference;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod process_manager;
pub mod registry;
pub mod state;
pub mod utils;

pub use commands::CommandError;
pub use state::AppState;
