//! Durable media storage
//!
//! Captured clips land in a transient location the OS may reclaim. The media
//! store copies them under `<data-dir>/videos/` as `video_<epoch-ms>.mp4` and
//! removes them again when their record is deleted.

use crate::error::Result;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::{fs, io};

/// Durable media directory
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a new media store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the media store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Media store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Copy a transient capture into durable storage.
    ///
    /// On any failure the original path is returned unchanged and the error
    /// is logged; callers can tell the two cases apart with `is_durable`.
    pub async fn commit(&self, temp_path: &Path) -> PathBuf {
        match self.try_commit(temp_path).await {
            Ok(path) => {
                tracing::info!("Video stored at: {:?}", path);
                path
            }
            Err(e) => {
                tracing::error!("Failed to store video {:?}: {}", temp_path, e);
                temp_path.to_path_buf()
            }
        }
    }

    async fn try_commit(&self, temp_path: &Path) -> Result<PathBuf> {
        self.initialize().await?;

        let mut source = fs::File::open(temp_path).await?;
        let (path, mut target) = self.reserve_path().await?;

        let copied = async {
            io::copy(&mut source, &mut target).await?;
            target.sync_all().await
        }
        .await;

        if let Err(e) = copied {
            drop(target);
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        Ok(path)
    }

    /// Create the next free `video_<epoch-ms>.mp4`, bumping the stamp
    /// while the name is taken. Creation is exclusive, so concurrent
    /// commits never share a file.
    async fn reserve_path(&self) -> Result<(PathBuf, fs::File)> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let candidate = self.root.join(format!("video_{}.mp4", millis));
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// True if `path` lies inside the durable directory
    pub fn is_durable(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !path
                .components()
                .any(|component| matches!(component, Component::ParentDir))
    }

    /// True if the file at `path` exists
    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Delete a durable media file.
    ///
    /// Paths outside the media directory are left alone. Returns whether a
    /// file was removed.
    pub async fn remove(&self, path: &Path) -> Result<bool> {
        if !self.is_durable(path) {
            tracing::warn!("Refusing to delete media outside {:?}: {:?}", self.root, path);
            return Ok(false);
        }

        if !self.exists(path).await {
            return Ok(false);
        }

        fs::remove_file(path).await?;

        tracing::debug!("Deleted video: {:?}", path);

        Ok(true)
    }

    /// Get media store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
