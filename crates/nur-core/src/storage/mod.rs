mod cache;
mod config;

pub use cache::{ScheduleCache, SqliteScheduleCache, DEFAULT_MAX_AGE_DAYS};
pub use config::{CacheConfig, ClockConfig, Config, TimingSourceConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nur[-dev]/` based on NUR_ENV, or `NUR_DATA_DIR` if set.
///
/// Set NUR_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("NUR_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("NUR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nur-dev")
            } else {
                base_dir.join("nur")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
