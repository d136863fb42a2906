//! Reminder commands
//!
//! Runs the reminder scheduler in the foreground. The stored schedule is
//! polled every minute so changes made by other invocations are picked up.

use crate::app::AppState;
use crate::error::Result;
use std::time::Duration;

/// Interval between schedule checks
const SCHEDULE_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Apply the stored schedule and keep reminders firing until Ctrl-C
pub async fn run_reminders(state: &AppState) -> Result<()> {
    let mut applied = state.settings.get().await?;
    let count = state.reminders.apply(&applied).await?;
    state.cron.start().await?;

    tracing::info!("{} daily reminders active, press Ctrl-C to stop", count);

    let mut interval = tokio::time::interval(SCHEDULE_POLL_INTERVAL);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                match state.settings.get().await {
                    Ok(current) if current != applied => {
                        tracing::info!("Notification settings changed, rescheduling");
                        match state.reminders.apply(&current).await {
                            Ok(_) => applied = current,
                            Err(e) => tracing::error!("Failed to reschedule reminders: {}", e),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Error checking notification settings: {}", e),
                }
            }
        }
    }

    state.cron.shutdown().await?;
    Ok(())
}
