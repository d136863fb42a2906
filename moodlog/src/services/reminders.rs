//! Reminders service
//!
//! Applies the notification schedule to a notification backend. Every
//! application cancels all previously registered reminders and registers
//! one recurring daily trigger per enabled time.

use crate::config::{REMINDER_BODY, REMINDER_TITLE};
use crate::database::{NotificationSchedule, ReminderTime};
use crate::error::{AppError, Result};
use crate::services::settings::SettingsStore;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Content delivered when a reminder fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub title: String,
    pub body: String,
    pub time: ReminderTime,
}

impl ReminderNotification {
    pub fn daily(time: ReminderTime) -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            body: REMINDER_BODY.to_string(),
            time,
        }
    }
}

/// Platform notification backend
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Drop every reminder registered so far
    async fn cancel_all(&self) -> Result<()>;

    /// Register a reminder repeating daily at `notification.time`
    async fn schedule_daily(&self, notification: ReminderNotification) -> Result<()>;
}

/// Receives reminders as they fire
pub type NotificationSink = Arc<dyn Fn(&ReminderNotification) + Send + Sync>;

/// Reminder backend driven by cron jobs in local time
pub struct CronNotificationScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    job_ids: Arc<RwLock<Vec<Uuid>>>,
    sink: NotificationSink,
}

impl CronNotificationScheduler {
    /// Create a scheduler that logs each reminder as it fires
    pub async fn new() -> Result<Self> {
        Self::with_sink(Arc::new(|notification: &ReminderNotification| {
            tracing::info!(
                "Notification: {} - {} ({})",
                notification.title,
                notification.body,
                notification.time
            );
        }))
        .await
    }

    pub async fn with_sink(sink: NotificationSink) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            job_ids: Arc::new(RwLock::new(Vec::new())),
            sink,
        })
    }

    /// Start firing registered jobs
    pub async fn start(&self) -> Result<()> {
        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        tracing::info!("Reminder scheduler started");
        Ok(())
    }

    /// Number of reminders currently registered
    pub async fn scheduled_count(&self) -> usize {
        self.job_ids.read().await.len()
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Reminder scheduler shutdown");
        Ok(())
    }
}

/// Remove every tracked job. Ids whose removal failed stay tracked so a
/// later call can retry them; the first failure is reported.
async fn remove_jobs<F, Fut, E>(job_ids: &mut Vec<Uuid>, mut remove: F) -> Result<()>
where
    F: FnMut(Uuid) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), E>>,
    E: std::fmt::Display,
{
    let mut failed = Vec::new();
    let mut first_error = None;
    for job_id in std::mem::take(job_ids) {
        if let Err(e) = remove(job_id).await {
            tracing::warn!("Failed to remove reminder job {}: {}", job_id, e);
            failed.push(job_id);
            first_error.get_or_insert_with(|| e.to_string());
        }
    }
    *job_ids = failed;

    match first_error {
        Some(e) => Err(AppError::Scheduler(format!(
            "Failed to remove {} reminder jobs: {}",
            job_ids.len(),
            e
        ))),
        None => Ok(()),
    }
}

/// Six-field cron expression firing every day at `time`
pub fn daily_cron(time: &ReminderTime) -> String {
    format!("0 {} {} * * *", time.minute, time.hour)
}

#[async_trait]
impl NotificationScheduler for CronNotificationScheduler {
    async fn cancel_all(&self) -> Result<()> {
        let mut job_ids = self.job_ids.write().await;
        let guard = self.scheduler.read().await;
        let scheduler: &JobScheduler = &guard;

        remove_jobs(&mut job_ids, |job_id| async move { scheduler.remove(&job_id).await }).await?;

        tracing::debug!("All reminders cancelled");
        Ok(())
    }

    async fn schedule_daily(&self, notification: ReminderNotification) -> Result<()> {
        let cron_expr = daily_cron(&notification.time);
        let sink = Arc::clone(&self.sink);

        let job = Job::new_async_tz(cron_expr.clone(), chrono::Local, move |_uuid, _l| {
            let sink = Arc::clone(&sink);
            let notification = notification.clone();
            Box::pin(async move {
                sink(&notification);
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create reminder job: {}", e)))?;

        let job_id = job.guid();

        let scheduler = self.scheduler.read().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule job: {}", e)))?;

        self.job_ids.write().await.push(job_id);

        tracing::debug!("Daily reminder scheduled ({})", cron_expr);
        Ok(())
    }
}

/// Keeps registered reminders in line with the stored schedule
#[derive(Clone)]
pub struct RemindersService {
    settings: SettingsStore,
    scheduler: Arc<dyn NotificationScheduler>,
}

impl RemindersService {
    pub fn new(settings: SettingsStore, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self {
            settings,
            scheduler,
        }
    }

    /// Cancel everything, then register each enabled time.
    /// Returns the number of reminders registered.
    pub async fn apply(&self, schedule: &NotificationSchedule) -> Result<usize> {
        self.scheduler.cancel_all().await?;

        if !schedule.enabled {
            tracing::info!("Notifications are disabled");
            return Ok(0);
        }

        let mut count = 0;
        for time in schedule.active_times() {
            self.scheduler
                .schedule_daily(ReminderNotification::daily(*time))
                .await?;
            count += 1;
        }

        tracing::info!("Scheduled {} daily notifications", count);
        Ok(count)
    }

    /// Apply the stored schedule
    pub async fn reschedule(&self) -> Result<usize> {
        let schedule = self.settings.get().await?;
        self.apply(&schedule).await
    }

    /// Persist a new schedule and apply it
    pub async fn update_schedule(&self, schedule: &NotificationSchedule) -> Result<usize> {
        self.settings.set(schedule).await?;
        self.apply(schedule).await
    }
}
