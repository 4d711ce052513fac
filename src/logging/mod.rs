//! Logging setup for CellClassify
//! Configures env_logger and handles log file cleanup for 7-day retention

use crate::models::Settings;
use crate::utils::get_logs_dir;
use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_FILE_PREFIX: &str = "cellclassify";

pub fn log_file_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(format!(
        "{}-{}.log",
        LOG_FILE_PREFIX,
        Local::now().format("%Y-%m-%d")
    ))
}

/// Install the global logger. `RUST_LOG` wins over the configured level.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(settings: &Settings) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()));
    builder.format_timestamp_millis();

    let mut file_error = None;
    if settings.log_to_file {
        let path = log_file_path(&get_logs_dir());
        let opened = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
        match opened {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => file_error = Some(format!("{:?}: {}", path, e)),
        }
    }

    if builder.try_init().is_err() {
        return;
    }

    if let Some(e) = file_error {
        warn!("Could not open log file, logging to stderr: {}", e);
    }

    if settings.log_to_file {
        cleanup_old_logs();
    }
}

pub fn cleanup_old_logs() {
    cleanup_logs_in(&get_logs_dir(), SystemTime::now());
}

fn cleanup_logs_in(logs_dir: &Path, now: SystemTime) -> usize {
    if !logs_dir.exists() {
        return 0;
    }

    let retention = Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);
    let mut removed = 0;

    if let Ok(entries) = fs::read_dir(logs_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "log") {
                if let Ok(meta) = fs::metadata(&path) {
                    if let Ok(modified) = meta.modified() {
                        if let Ok(age) = now.duration_since(modified) {
                            if age > retention && fs::remove_file(&path).is_ok() {
                                info!("Cleaned up old log: {:?}", path.file_name());
                                removed += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    removed
}
