mod config;
mod file;

pub use config::{Config, LoggingConfig, TimerConfig, TipsConfig};
pub use file::JsonFileSink;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `STUDYDESK_DATA_DIR` wins when set. Otherwise the directory is
/// `~/.config/studydesk[-dev]/`, picked by `STUDYDESK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("STUDYDESK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYDESK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studydesk-dev")
            } else {
                base_dir.join("studydesk")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
