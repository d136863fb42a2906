//! Application state and initialization
//!
//! This module wires every service from an `AppConfig`.
//! All services are created here and made available through AppState.

use crate::config::AppConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{
    CronNotificationScheduler, Exporter, HttpRemoteMirror, RecordStore, RemindersService,
    SettingsStore,
};
use crate::storage::MediaStore;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub records: RecordStore,
    pub settings: SettingsStore,
    pub exporter: Exporter,
    pub reminders: RemindersService,
    /// Cron backend behind `reminders`, started only by the `remind` command
    pub cron: Arc<CronNotificationScheduler>,
    /// Present when the remote mirror is enabled in config
    pub remote: Option<HttpRemoteMirror>,
}

impl AppState {
    /// Create directories, open the database and build the services
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", config.data_dir);

        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.cache_dir)?;

        let pool = create_pool(&config.database_path()).await?;
        let repo = Repository::new(pool);

        let media = MediaStore::new(config.video_dir());
        media.initialize().await?;

        let remote = if config.remote.enabled {
            tracing::info!("Remote mirror enabled: {}", config.remote.base_url);
            Some(HttpRemoteMirror::new(&config.remote)?)
        } else {
            None
        };

        let mut records = RecordStore::new(repo.clone(), media);
        if let Some(mirror) = &remote {
            records = records.with_mirror(Arc::new(mirror.clone()));
        }

        let settings = SettingsStore::new(repo);
        let exporter = Exporter::new(records.clone(), config.cache_dir.clone());

        let cron = Arc::new(CronNotificationScheduler::new().await?);
        let reminders = RemindersService::new(settings.clone(), cron.clone());

        tracing::info!("Application initialized successfully");

        Ok(Self {
            config,
            records,
            settings,
            exporter,
            reminders,
            cron,
            remote,
        })
    }
}
