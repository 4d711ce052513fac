// Python worker process management
// Spawns external model scripts and collects their JSON-lines output

use crate::utils::get_app_data_dir;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

pub const WORKERS_DIR_NAME: &str = "python_workers";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    Progress {
        percent: u8,
        stage: String,
    },
    Result {
        data: serde_json::Value,
    },
    Error {
        message: String,
    },
    Log {
        level: String,
        message: String,
    },
}

pub fn get_python_path() -> String {
    #[cfg(target_os = "windows")]
    let paths = ["python", "python3", "py"];

    #[cfg(not(target_os = "windows"))]
    let paths = ["python3", "python"];

    for path in paths {
        let mut cmd = std::process::Command::new(path);
        cmd.arg("--version");

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        if cmd.output().is_ok() {
            return path.to_string();
        }
    }

    "python".to_string()
}

/// Locate the python_workers directory: app data dir, next to the executable, then cwd
pub fn get_workers_dir() -> PathBuf {
    let app_workers = get_app_data_dir().join(WORKERS_DIR_NAME);
    if app_workers.exists() {
        return app_workers;
    }

    if let Ok(exe_path) = std::env::current_exe() {
        let mut current = exe_path.parent();
        for _ in 0..4 {
            match current {
                Some(dir) => {
                    let candidate = dir.join(WORKERS_DIR_NAME);
                    if candidate.exists() {
                        debug!("Found python workers at: {:?}", candidate);
                        return candidate;
                    }
                    current = dir.parent();
                }
                None => break,
            }
        }
    }

    let cwd_workers = std::env::current_dir()
        .unwrap_or_default()
        .join(WORKERS_DIR_NAME);

    debug!("Falling back to current dir python workers: {:?}", cwd_workers);
    cwd_workers
}

/// Interpret one stdout line; non-JSON lines are treated as plain log output
pub fn parse_worker_line(line: &str) -> Option<WorkerMessage> {
    serde_json::from_str::<WorkerMessage>(line).ok()
}

/// Spawn a Python worker, feed it `input` as JSON on stdin and return its result payload.
///
/// The child is killed if the returned future is dropped.
pub async fn spawn_python_worker_async<T: Serialize + ?Sized>(
    script: &str,
    input: &T,
    progress_callback: Option<mpsc::Sender<WorkerMessage>>,
) -> Result<serde_json::Value, String> {
    let python_path = get_python_path();
    let script_path = get_workers_dir().join(script);

    if !script_path.exists() {
        return Err(format!("Worker script not found: {:?}", script_path));
    }

    info!("Spawning Python worker: {:?}", script_path);

    let mut cmd = Command::new(&python_path);
    cmd.arg(&script_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("Failed to spawn Python process: {}", e))?;

    let input_json =
        serde_json::to_vec(input).map_err(|e| format!("Failed to serialize input: {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&input_json)
            .await
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        stdin
            .shutdown()
            .await
            .map_err(|e| format!("Failed to close stdin: {}", e))?;
    }

    // Drain stderr so a chatty worker can't block on a full pipe
    if let Some(stderr) = child.stderr.take() {
        let script_name = script.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[{} stderr] {}", script_name, line);
            }
        });
    }

    let stdout = child.stdout.take().ok_or("Failed to capture stdout")?;

    let mut reader = BufReader::new(stdout).lines();
    let mut last_result: Option<serde_json::Value> = None;
    let mut last_error: Option<String> = None;

    while let Ok(Some(line)) = reader.next_line().await {
        match parse_worker_line(&line) {
            Some(WorkerMessage::Result { data }) => last_result = Some(data),
            Some(WorkerMessage::Error { message }) => last_error = Some(message),
            Some(WorkerMessage::Log { level, message }) => match level.as_str() {
                "error" | "warning" | "warn" => warn!("[Python {}] {}", level, message),
                _ => debug!("[Python {}] {}", level, message),
            },
            Some(message @ WorkerMessage::Progress { .. }) => {
                if let Some(ref tx) = progress_callback {
                    let _ = tx.send(message).await;
                }
            }
            None => debug!("[Python] {}", line),
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    let exit_code = status.code().unwrap_or(-1);
    debug!("Python worker exited with code: {}", exit_code);

    if let Some(error) = last_error {
        return Err(error);
    }

    if exit_code != 0 {
        return Err(format!("Python worker exited with code: {}", exit_code));
    }

    last_result.ok_or_else(|| "No result from Python worker".to_string())
}
