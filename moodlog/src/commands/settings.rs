//! Settings-related commands
//!
//! Every change to the reminder schedule is persisted and then re-applied,
//! replacing all previously registered reminders.

use crate::app::AppState;
use crate::database::NotificationSchedule;
use crate::error::Result;

/// Get the current reminder schedule
pub async fn get_notification_settings(state: &AppState) -> Result<NotificationSchedule> {
    state.settings.get().await
}

/// Turn all reminders on or off
pub async fn set_notifications_enabled(
    state: &AppState,
    enabled: bool,
) -> Result<NotificationSchedule> {
    update_schedule(state, |schedule| {
        schedule.enabled = enabled;
        Ok(())
    })
    .await
}

/// Add a reminder time
pub async fn add_reminder_time(
    state: &AppState,
    hour: u8,
    minute: u8,
) -> Result<NotificationSchedule> {
    update_schedule(state, |schedule| schedule.upsert_time(None, hour, minute)).await
}

/// Move the reminder at `index` to a new time
pub async fn edit_reminder_time(
    state: &AppState,
    index: usize,
    hour: u8,
    minute: u8,
) -> Result<NotificationSchedule> {
    update_schedule(state, |schedule| {
        schedule.upsert_time(Some(index), hour, minute)
    })
    .await
}

/// Remove the reminder at `index`
pub async fn remove_reminder_time(state: &AppState, index: usize) -> Result<NotificationSchedule> {
    update_schedule(state, |schedule| schedule.remove_time(index).map(|_| ())).await
}

/// Enable or disable the reminder at `index`
pub async fn toggle_reminder_time(state: &AppState, index: usize) -> Result<NotificationSchedule> {
    update_schedule(state, |schedule| schedule.toggle_time(index).map(|_| ())).await
}

async fn update_schedule<F>(state: &AppState, edit: F) -> Result<NotificationSchedule>
where
    F: FnOnce(&mut NotificationSchedule) -> Result<()>,
{
    let mut schedule = state.settings.get().await?;
    edit(&mut schedule)?;

    let registered = state.reminders.update_schedule(&schedule).await?;
    tracing::debug!("{} reminders registered after settings change", registered);

    Ok(schedule)
}
