//! Remote mirror commands
//!
//! Read-only views of the mirrored data. Unlike push and delete, these
//! report failures to the caller.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::remote::RemoteSurvey;
use crate::services::{HttpRemoteMirror, MoodStats};

fn mirror(state: &AppState) -> Result<&HttpRemoteMirror> {
    state.remote.as_ref().ok_or_else(|| {
        AppError::Remote("remote mirror is disabled; set remote.enabled in config.json".to_string())
    })
}

/// Fetch every record stored on the remote
pub async fn list_remote_records(state: &AppState) -> Result<Vec<RemoteSurvey>> {
    mirror(state)?.fetch_all().await
}

/// Fetch statistics computed by the remote
pub async fn get_remote_stats(state: &AppState) -> Result<MoodStats> {
    mirror(state)?.fetch_stats().await
}
