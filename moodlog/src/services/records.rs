//! Record store
//!
//! Ordered list of survey records persisted as one JSON document. Every
//! mutation is a read-modify-write of the whole list under a single write
//! lock. Media cleanup and remote mirroring hang off the mutations as
//! best-effort side effects; their failures are logged and never reach the
//! caller.

use crate::config::{SURVEY_DATA_KEY, SURVEY_DATA_VERSION_KEY};
use crate::database::record_migrations::{self, CURRENT_VERSION, LEGACY_VERSION};
use crate::database::{NewRecord, Repository, SurveyRecord, VideoEntry};
use crate::error::Result;
use crate::services::remote::RemoteMirror;
use crate::services::stats::MoodStats;
use crate::storage::MediaStore;
use chrono::Utc;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Service for managing survey records
#[derive(Clone)]
pub struct RecordStore {
    repo: Repository,
    media: MediaStore,
    mirror: Option<Arc<dyn RemoteMirror>>,
    write_lock: Arc<Mutex<()>>,
    pending_sync: Arc<Mutex<JoinSet<()>>>,
}

impl RecordStore {
    pub fn new(repo: Repository, media: MediaStore) -> Self {
        Self {
            repo,
            media,
            mirror: None,
            write_lock: Arc::new(Mutex::new(())),
            pending_sync: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Attach a remote mirror that receives every new record
    pub fn with_mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Save a new record.
    ///
    /// The captured clip (if any) is committed to durable storage first. If
    /// that falls back to the transient path the record is saved without
    /// video. The remote push is dispatched after the local write commits
    /// and may never complete; its outcome is written back as `remote_id`.
    pub async fn append(&self, fields: NewRecord) -> Result<SurveyRecord> {
        fields.validate()?;

        let video_uri = match &fields.video {
            Some(temp) => {
                let stored = self.media.commit(temp).await;
                if self.media.is_durable(&stored) {
                    Some(stored)
                } else {
                    tracing::warn!("Video {:?} could not be stored durably, saving record without it", temp);
                    None
                }
            }
            None => None,
        };

        let record = {
            let _guard = self.write_lock.lock().await;
            let mut records = self.load().await?;

            let record = SurveyRecord {
                id: next_id(&records),
                timestamp: Utc::now(),
                mood: fields.mood,
                location: fields.location,
                has_video: video_uri.is_some(),
                video_uri,
                remote_id: None,
            };

            records.push(record.clone());
            self.save(&records).await?;
            record
        };

        tracing::info!("Saved record {} (mood {})", record.id, record.mood);

        if let Some(mirror) = self.mirror.clone() {
            let store = self.clone();
            let pushed = record.clone();
            self.spawn_sync(async move {
                if let Some(remote_id) = mirror.push(&pushed).await {
                    store.attach_remote_id(&pushed.id, remote_id, mirror.as_ref()).await;
                }
            })
            .await;
        }

        Ok(record)
    }

    /// All records in insertion order
    pub async fn list(&self) -> Result<Vec<SurveyRecord>> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }

    /// Delete one record with its media and remote copy.
    ///
    /// Unknown ids leave the list untouched. Returns whether a record was
    /// removed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let Some(position) = records.iter().position(|r| r.id == id) else {
            tracing::debug!("Delete of unknown record {} ignored", id);
            return Ok(false);
        };

        let removed = records.remove(position);
        self.release_resources(&removed).await;
        self.save(&records).await?;

        tracing::info!("Deleted record {}", id);
        Ok(true)
    }

    /// Delete every record with its media and remote copy.
    /// Returns the number of records removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let records = self.load().await?;

        for record in &records {
            self.release_resources(record).await;
        }

        self.repo.remove_value(SURVEY_DATA_KEY).await?;

        tracing::info!("Cleared {} records", records.len());
        Ok(records.len())
    }

    /// Records whose media file is still on disk
    pub async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
        let records = self.list().await?;
        let mut videos = Vec::new();

        for record in records {
            if let Some(uri) = record.video_uri {
                if self.media.exists(&uri).await {
                    videos.push(VideoEntry {
                        id: record.id,
                        uri,
                        timestamp: record.timestamp,
                    });
                }
            }
        }

        Ok(videos)
    }

    pub async fn stats(&self) -> Result<MoodStats> {
        Ok(MoodStats::from_records(&self.list().await?))
    }

    /// Wait for every dispatched mirror call to finish
    pub async fn wait_for_sync(&self) {
        loop {
            // Await outside the lock so finishing tasks can dispatch follow-ups
            let mut batch = std::mem::take(&mut *self.pending_sync.lock().await);
            if batch.is_empty() {
                break;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(e) = result {
                    tracing::warn!("Remote sync task failed: {}", e);
                }
            }
        }
    }

    /// Media first, then the remote copy
    async fn release_resources(&self, record: &SurveyRecord) {
        if let Some(uri) = &record.video_uri {
            if let Err(e) = self.media.remove(uri).await {
                tracing::warn!("Failed to delete video {:?} of record {}: {}", uri, record.id, e);
            }
        }

        if let (Some(mirror), Some(remote_id)) = (self.mirror.clone(), record.remote_id.clone()) {
            self.spawn_sync(async move {
                mirror.delete(&remote_id).await;
            })
            .await;
        }
    }

    async fn attach_remote_id(&self, id: &str, remote_id: String, mirror: &dyn RemoteMirror) {
        let result: Result<bool> = async {
            let _guard = self.write_lock.lock().await;
            let mut records = self.load().await?;
            match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.remote_id = Some(remote_id.clone());
                    self.save(&records).await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .await;

        match result {
            Ok(true) => tracing::debug!("Record {} linked to remote {}", id, remote_id),
            Ok(false) => {
                tracing::info!("Record {} was deleted before sync finished, removing remote copy", id);
                mirror.delete(&remote_id).await;
            }
            Err(e) => tracing::warn!("Failed to store remote id for record {}: {}", id, e),
        }
    }

    async fn spawn_sync<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending_sync.lock().await;
        // Reap finished tasks so the set does not grow without bound
        while pending.try_join_next().is_some() {}
        pending.spawn(task);
    }

    /// Read and, if needed, upgrade the stored list. Caller holds the lock.
    async fn load(&self) -> Result<Vec<SurveyRecord>> {
        let Some(raw) = self.repo.get_value(SURVEY_DATA_KEY).await? else {
            return Ok(Vec::new());
        };

        let version = match self.repo.get_value(SURVEY_DATA_VERSION_KEY).await? {
            Some(v) => v.trim().parse().unwrap_or(LEGACY_VERSION),
            None => LEGACY_VERSION,
        };

        let mut values: Vec<Value> = serde_json::from_str(&raw)?;
        let upgraded = record_migrations::upgrade(&mut values, version);

        let records = values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<SurveyRecord>, _>>()?;

        if upgraded {
            self.save(&records).await?;
        }

        Ok(records)
    }

    /// Persist the full list together with its format version
    async fn save(&self, records: &[SurveyRecord]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.repo
            .set_values(&[
                (SURVEY_DATA_KEY, raw),
                (SURVEY_DATA_VERSION_KEY, CURRENT_VERSION.to_string()),
            ])
            .await
    }
}

/// Creation epoch-ms, kept strictly above the previous record's id
fn next_id(records: &[SurveyRecord]) -> String {
    let now = Utc::now().timestamp_millis();
    let after_last = records
        .last()
        .and_then(|r| r.id.parse::<i64>().ok())
        .map(|last| last.saturating_add(1))
        .unwrap_or(i64::MIN);

    now.max(after_last).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_pool, Location};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Mirror that records calls and answers with a fixed outcome
    #[derive(Default)]
    struct FakeMirror {
        fail: bool,
        pushes: AtomicUsize,
        deletes: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteMirror for FakeMirror {
        async fn push(&self, record: &SurveyRecord) -> Option<String> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            (!self.fail).then(|| format!("remote-{}", record.id))
        }

        async fn delete(&self, remote_id: &str) -> bool {
            self.deletes.lock().unwrap().push(remote_id.to_string());
            !self.fail
        }
    }

    async fn create_test_store() -> (RecordStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = create_pool(&temp_dir.path().join("db.sqlite")).await.unwrap();
        let media = MediaStore::new(temp_dir.path().join("videos"));
        (RecordStore::new(Repository::new(pool), media), temp_dir)
    }

    fn capture(temp: &TempDir, name: &str) -> PathBuf {
        let dir = temp.path().join("capture");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"clip").unwrap();
        path
    }

    #[tokio::test]
    async fn test_append_every_valid_mood() {
        let (store, _temp) = create_test_store().await;

        let mut ids = Vec::new();
        for mood in 1..=5 {
            let record = store.append(NewRecord::new(mood)).await.unwrap();
            assert_eq!(record.mood, mood);
            ids.push(record.id);
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 5);
        for (record, mood) in listed.iter().zip(1..=5) {
            assert_eq!(record.mood, mood);
        }

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_mood_writes_nothing() {
        let (store, _temp) = create_test_store().await;

        assert!(store.append(NewRecord::new(0)).await.is_err());
        assert!(store.append(NewRecord::new(6)).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_increase_monotonically() {
        let (store, _temp) = create_test_store().await;

        let a = store.append(NewRecord::new(3)).await.unwrap();
        let b = store.append(NewRecord::new(3)).await.unwrap();

        assert!(b.id.parse::<i64>().unwrap() > a.id.parse::<i64>().unwrap());
    }

    #[tokio::test]
    async fn test_append_with_location_and_video() {
        let (store, temp) = create_test_store().await;
        let clip = capture(&temp, "clip.mp4");

        let record = store
            .append(
                NewRecord::new(4)
                    .with_location(Location {
                        latitude: 25.03,
                        longitude: 121.56,
                        timestamp: Some(1_700_000_000_000),
                    })
                    .with_video(&clip),
            )
            .await
            .unwrap();

        assert!(record.has_video);
        let uri = record.video_uri.clone().unwrap();
        assert!(store.media().is_durable(&uri));
        assert!(uri.exists());
        assert_eq!(store.list().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_failed_media_commit_saves_without_video() {
        let (store, temp) = create_test_store().await;

        let record = store
            .append(NewRecord::new(2).with_video(temp.path().join("missing.mp4")))
            .await
            .unwrap();

        assert!(!record.has_video);
        assert!(record.video_uri.is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_media() {
        let (store, temp) = create_test_store().await;
        let a = store.append(NewRecord::new(4)).await.unwrap();
        let b = store
            .append(NewRecord::new(2).with_video(capture(&temp, "b.mp4")))
            .await
            .unwrap();
        let b_video = b.video_uri.clone().unwrap();

        assert!(store.delete_by_id(&b.id).await.unwrap());

        assert_eq!(store.list().await.unwrap(), vec![a]);
        assert!(!b_video.exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (store, _temp) = create_test_store().await;
        store.append(NewRecord::new(1)).await.unwrap();
        let before = store.list().await.unwrap();

        assert!(!store.delete_by_id("does-not-exist").await.unwrap());

        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_media() {
        let (store, temp) = create_test_store().await;
        let record = store
            .append(NewRecord::new(5).with_video(capture(&temp, "c.mp4")))
            .await
            .unwrap();
        std::fs::remove_file(record.video_uri.as_ref().unwrap()).unwrap();

        assert!(store.delete_by_id(&record.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_removes_every_video() {
        let (store, temp) = create_test_store().await;
        let mut videos = Vec::new();
        for i in 0..3 {
            let record = store
                .append(NewRecord::new(3).with_video(capture(&temp, &format!("{}.mp4", i))))
                .await
                .unwrap();
            videos.push(record.video_uri.unwrap());
        }
        store.append(NewRecord::new(1)).await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 4);

        assert!(store.list().await.unwrap().is_empty());
        assert!(videos.iter().all(|v| !v.exists()));
    }

    #[tokio::test]
    async fn test_list_videos_skips_missing_files() {
        let (store, temp) = create_test_store().await;
        let kept = store
            .append(NewRecord::new(3).with_video(capture(&temp, "kept.mp4")))
            .await
            .unwrap();
        let lost = store
            .append(NewRecord::new(3).with_video(capture(&temp, "lost.mp4")))
            .await
            .unwrap();
        store.append(NewRecord::new(3)).await.unwrap();
        std::fs::remove_file(lost.video_uri.unwrap()).unwrap();

        let videos = store.list_videos().await.unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_mirror_push_attaches_remote_id() {
        let (store, _temp) = create_test_store().await;
        let mirror = Arc::new(FakeMirror::default());
        let store = store.with_mirror(mirror.clone());

        let record = store.append(NewRecord::new(4)).await.unwrap();
        assert_eq!(record.remote_id, None);
        store.wait_for_sync().await;

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].remote_id, Some(format!("remote-{}", record.id)));
        assert_eq!(mirror.pushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mirror_failure_keeps_local_save() {
        let (store, _temp) = create_test_store().await;
        let mirror = Arc::new(FakeMirror {
            fail: true,
            ..FakeMirror::default()
        });
        let store = store.with_mirror(mirror);

        let record = store.append(NewRecord::new(2)).await.unwrap();
        store.wait_for_sync().await;

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, record.id);
        assert_eq!(listed[0].remote_id, None);
    }

    #[tokio::test]
    async fn test_delete_mirrors_to_remote() {
        let (store, _temp) = create_test_store().await;
        let mirror = Arc::new(FakeMirror::default());
        let store = store.with_mirror(mirror.clone());

        let record = store.append(NewRecord::new(4)).await.unwrap();
        store.wait_for_sync().await;
        store.delete_by_id(&record.id).await.unwrap();
        store.wait_for_sync().await;

        assert_eq!(
            *mirror.deletes.lock().unwrap(),
            vec![format!("remote-{}", record.id)]
        );
    }

    #[tokio::test]
    async fn test_unsynced_records_skip_remote_delete() {
        let (store, _temp) = create_test_store().await;
        store.append(NewRecord::new(4)).await.unwrap();

        let mirror = Arc::new(FakeMirror::default());
        let store = store.with_mirror(mirror.clone());
        store.clear_all().await.unwrap();
        store.wait_for_sync().await;

        assert!(mirror.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_data_is_upgraded_on_read() {
        let (store, _temp) = create_test_store().await;
        let legacy = serde_json::json!([{
            "id": "1600000000000",
            "timestamp": "2020-09-13T12:26:40.000Z",
            "mood": 4,
            "location": {"coords": {"latitude": 1.0, "longitude": 2.0}, "timestamp": 5},
            "hasVideo": false,
            "videoUri": null,
            "backendId": "r-1"
        }]);
        store
            .repo
            .set_value(SURVEY_DATA_KEY, &legacy.to_string())
            .await
            .unwrap();

        let records = store.list().await.unwrap();

        assert_eq!(records[0].location.as_ref().unwrap().latitude, 1.0);
        assert_eq!(records[0].remote_id.as_deref(), Some("r-1"));
        assert_eq!(
            store.repo.get_value(SURVEY_DATA_VERSION_KEY).await.unwrap(),
            Some(CURRENT_VERSION.to_string())
        );
        let stored = store.repo.get_value(SURVEY_DATA_KEY).await.unwrap().unwrap();
        assert!(!stored.contains("coords"));
    }

    #[tokio::test]
    async fn test_flat_legacy_fractional_timestamp_loads() {
        let (store, _temp) = create_test_store().await;
        let legacy = serde_json::json!([{
            "id": "1699999999000",
            "timestamp": "2023-11-14T22:13:19.000Z",
            "mood": 3,
            "location": {"latitude": 25.03, "longitude": 121.56, "timestamp": 1699999999123.6},
            "hasVideo": false,
            "videoUri": null
        }]);
        store
            .repo
            .set_value(SURVEY_DATA_KEY, &legacy.to_string())
            .await
            .unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(
            records[0].location.as_ref().unwrap().timestamp,
            Some(1699999999124)
        );

        // The upgraded list stays writable
        store.append(NewRecord::new(5)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[test]
    fn test_next_id_after_max_id_does_not_overflow() {
        let last = SurveyRecord {
            id: i64::MAX.to_string(),
            timestamp: Utc::now(),
            mood: 1,
            location: None,
            has_video: false,
            video_uri: None,
            remote_id: None,
        };

        assert_eq!(next_id(std::slice::from_ref(&last)), i64::MAX.to_string());
    }

    #[test]
    fn test_next_id_after_future_id() {
        let future = SurveyRecord {
            id: (Utc::now().timestamp_millis() + 60_000).to_string(),
            timestamp: Utc::now(),
            mood: 1,
            location: None,
            has_video: false,
            video_uri: None,
            remote_id: None,
        };

        let next: i64 = next_id(std::slice::from_ref(&future)).parse().unwrap();

        assert_eq!(next, future.id.parse::<i64>().unwrap() + 1);
    }
}
