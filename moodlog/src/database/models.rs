//! Database models
//!
//! Rust structs representing persisted entities.
//! Field names serialize in camelCase to match the stored JSON documents
//! and the export manifest.

use crate::config::{MAX_MOOD, MIN_MOOD};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Geolocation attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Fix time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// One mood-journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub mood: u8,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub has_video: bool,
    /// Durable media path, present iff `has_video`
    #[serde(default)]
    pub video_uri: Option<PathBuf>,
    /// Identifier assigned by the remote mirror once synced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

/// Fields supplied by the capture flow when recording a mood
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub mood: u8,
    pub location: Option<Location>,
    /// Transient capture path of a recorded clip
    pub video: Option<PathBuf>,
}

impl NewRecord {
    pub fn new(mood: u8) -> Self {
        Self {
            mood,
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_video(mut self, video: impl Into<PathBuf>) -> Self {
        self.video = Some(video.into());
        self
    }

    /// Reject moods outside 1..=5
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MOOD..=MAX_MOOD).contains(&self.mood) {
            return Err(AppError::Validation(format!(
                "mood must be between {} and {}, got {}",
                MIN_MOOD, MAX_MOOD, self.mood
            )));
        }
        Ok(())
    }
}

/// A record whose media file still exists on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub uri: PathBuf,
    pub timestamp: DateTime<Utc>,
}

/// One daily reminder time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour,
            minute,
            enabled: true,
        }
    }

    /// Minutes since midnight, used for ordering
    pub fn minute_of_day(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(AppError::Validation(format!(
                "hour must be between 0 and 23, got {}",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(AppError::Validation(format!(
                "minute must be between 0 and 59, got {}",
                self.minute
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Reminder schedule persisted under `notification_settings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSchedule {
    pub enabled: bool,
    pub times: Vec<ReminderTime>,
}

impl Default for NotificationSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            times: vec![
                ReminderTime::new(9, 0),
                ReminderTime::new(16, 0),
                ReminderTime::new(22, 0),
            ],
        }
    }
}

impl NotificationSchedule {
    pub fn validate(&self) -> Result<()> {
        self.times.iter().try_for_each(ReminderTime::validate)
    }

    /// Enabled entries, in stored order
    pub fn active_times(&self) -> impl Iterator<Item = &ReminderTime> {
        self.times.iter().filter(|t| t.enabled)
    }

    /// Add a new enabled time, or move the entry at `index` to a new time.
    /// The list is re-sorted by time of day afterwards.
    pub fn upsert_time(&mut self, index: Option<usize>, hour: u8, minute: u8) -> Result<()> {
        let candidate = ReminderTime::new(hour, minute);
        candidate.validate()?;

        match index {
            Some(i) => {
                let entry = self.entry_mut(i)?;
                entry.hour = hour;
                entry.minute = minute;
            }
            None => self.times.push(candidate),
        }

        self.times.sort_by_key(ReminderTime::minute_of_day);
        Ok(())
    }

    pub fn remove_time(&mut self, index: usize) -> Result<ReminderTime> {
        self.entry_mut(index)?;
        Ok(self.times.remove(index))
    }

    /// Flip one entry's enabled flag, returning the new value
    pub fn toggle_time(&mut self, index: usize) -> Result<bool> {
        let entry = self.entry_mut(index)?;
        entry.enabled = !entry.enabled;
        Ok(entry.enabled)
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut ReminderTime> {
        let len = self.times.len();
        self.times.get_mut(index).ok_or_else(|| {
            AppError::Validation(format!("no reminder time at index {} (have {})", index, len))
        })
    }
}
