//! Settings service
//!
//! Persists the reminder schedule under `notification_settings`.
//! Rescheduling platform notifications is the caller's job; see
//! `RemindersService`.

use crate::config::NOTIFICATION_SETTINGS_KEY;
use crate::database::{NotificationSchedule, Repository};
use crate::error::Result;

/// Service for reading and writing the notification schedule
#[derive(Clone)]
pub struct SettingsStore {
    repo: Repository,
}

impl SettingsStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Stored schedule, or the three-entry default if none was saved yet
    pub async fn get(&self) -> Result<NotificationSchedule> {
        match self.repo.get_json(NOTIFICATION_SETTINGS_KEY).await? {
            Some(schedule) => Ok(schedule),
            None => {
                tracing::debug!("No notification settings stored, using defaults");
                Ok(NotificationSchedule::default())
            }
        }
    }

    /// Persist the schedule verbatim after range validation
    pub async fn set(&self, schedule: &NotificationSchedule) -> Result<()> {
        schedule.validate()?;
        self.repo.set_json(NOTIFICATION_SETTINGS_KEY, schedule).await?;

        tracing::info!(
            "Notification settings saved (enabled: {}, {} times)",
            schedule.enabled,
            schedule.times.len()
        );
        Ok(())
    }
}
