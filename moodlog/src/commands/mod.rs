//! Commands exposed to the command-line frontend
//!
//! This module organizes commands into logical submodules:
//! - `records`: Mood capture, listing, deletion and stats
//! - `settings`: Reminder schedule editing
//! - `reminders`: Foreground reminder scheduler
//! - `export`: Bundle and JSON export
//! - `remote`: Read-only remote mirror views

pub mod export;
pub mod records;
pub mod reminders;
pub mod remote;
pub mod settings;

use crate::app::AppState;

pub use export::*;
pub use records::*;
pub use reminders::*;
pub use remote::*;
pub use settings::*;

/// Application information structure
#[derive(Debug, serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
    pub cache_dir: String,
    pub remote_enabled: bool,
}

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.config.data_dir.to_string_lossy().to_string(),
        cache_dir: state.config.cache_dir.to_string_lossy().to_string(),
        remote_enabled: state.remote.is_some(),
    }
}
