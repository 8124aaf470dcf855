//! Where aut-runner keeps its config and logs.

use std::path::PathBuf;
use std::sync::OnceLock;

const DIR_NAME: &str = ".aut-runner";
const LOG_FILE: &str = "aut-runner.log";
const CONFIG_FILE: &str = "config.toml";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Pin the data directory for the rest of the process.
///
/// Only the first call takes effect; it returns `false` when the directory
/// was already pinned.
pub fn init_data_dir(custom: Option<PathBuf>) -> bool {
    let path = resolve(custom);
    match DATA_DIR.set(path) {
        Ok(()) => true,
        Err(rejected) => {
            tracing::debug!(
                rejected = %rejected.display(),
                current = %data_dir().display(),
                "Data directory already pinned"
            );
            false
        }
    }
}

fn resolve(custom: Option<PathBuf>) -> PathBuf {
    custom.unwrap_or_else(|| {
        dirs::home_dir()
            .map(|home| home.join(DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DIR_NAME))
    })
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(|| resolve(None))
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn log_file_path() -> PathBuf {
    logs_dir().join(LOG_FILE)
}

pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}
