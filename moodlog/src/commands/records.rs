//! Record-related commands
//!
//! Capture, listing and deletion of mood records.

use crate::app::AppState;
use crate::database::{Location, NewRecord, SurveyRecord, VideoEntry};
use crate::error::{AppError, Result};
use crate::services::MoodStats;
use std::path::PathBuf;

/// Record a mood with optional location fix and captured clip
pub async fn record_mood(
    state: &AppState,
    mood: u8,
    latitude: Option<f64>,
    longitude: Option<f64>,
    video: Option<PathBuf>,
) -> Result<SurveyRecord> {
    let mut fields = NewRecord::new(mood);

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            fields = fields.with_location(Location {
                latitude,
                longitude,
                timestamp: Some(chrono::Utc::now().timestamp_millis()),
            });
        }
        (None, None) => {}
        _ => {
            return Err(AppError::Validation(
                "latitude and longitude must be given together".to_string(),
            ))
        }
    }

    if let Some(video) = video {
        fields = fields.with_video(video);
    }

    let record = state.records.append(fields).await?;

    // One-shot process: give the mirror push a chance before exit
    state.records.wait_for_sync().await;

    Ok(record)
}

/// List records, newest first when `newest_first` is set
pub async fn list_records(state: &AppState, newest_first: bool) -> Result<Vec<SurveyRecord>> {
    let mut records = state.records.list().await?;
    if newest_first {
        records.reverse();
    }
    Ok(records)
}

/// Delete one record; unknown ids are ignored
pub async fn delete_record(state: &AppState, id: &str) -> Result<bool> {
    let removed = state.records.delete_by_id(id).await?;
    state.records.wait_for_sync().await;
    Ok(removed)
}

/// Delete every record and its media
pub async fn clear_records(state: &AppState) -> Result<usize> {
    let removed = state.records.clear_all().await?;
    state.records.wait_for_sync().await;
    Ok(removed)
}

/// Records whose video is still on disk
pub async fn list_videos(state: &AppState) -> Result<Vec<VideoEntry>> {
    state.records.list_videos().await
}

/// Local mood statistics
pub async fn get_stats(state: &AppState) -> Result<MoodStats> {
    state.records.stats().await
}
