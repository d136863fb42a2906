//! Services module
//!
//! Business logic services that coordinate between commands, the
//! repository and media storage.

pub mod export;
pub mod records;
pub mod reminders;
pub mod remote;
pub mod settings;
pub mod stats;

pub use export::{ExportProgress, ExportResult, ExportedRecord, Exporter, JsonExport};
pub use records::RecordStore;
pub use reminders::{
    CronNotificationScheduler, NotificationScheduler, ReminderNotification, RemindersService,
};
pub use remote::{HttpRemoteMirror, RemoteMirror};
pub use settings::SettingsStore;
pub use stats::MoodStats;
