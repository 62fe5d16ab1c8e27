mod config;
pub mod habit_db;
pub mod memory;
pub mod migrations;
mod store;

pub use config::{Config, HabitDefaults, LogConfig};
pub use habit_db::HabitDb;
pub use memory::MemoryStore;
pub use store::HabitStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the habitweek data directory, creating it if needed.
///
/// `HABITWEEK_DATA_DIR` wins when set. Otherwise `~/.config/habitweek[-dev]/`,
/// with the `-dev` suffix when `HABITWEEK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITWEEK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("HABITWEEK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("habitweek-dev")
            } else {
                base_dir.join("habitweek")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
