//! Remote mirror
//!
//! Best-effort network replica of local records. The local store stays the
//! source of truth: `push` and `delete` never return errors, only whether the
//! remote accepted the call. There is no retry and no replay queue.

use crate::config::RemoteConfig;
use crate::database::SurveyRecord;
use crate::error::{AppError, Result};
use crate::services::stats::MoodStats;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Collaborator receiving copies of local records
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Push a freshly saved record. Returns the server-assigned id, or
    /// `None` on any failure.
    async fn push(&self, record: &SurveyRecord) -> Option<String>;

    /// Mirror a local deletion. Returns whether the remote confirmed it.
    async fn delete(&self, remote_id: &str) -> bool;
}

/// Location as the remote API models it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Body of `POST /api/surveys`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub mood: u8,
    pub location: Option<RemoteLocation>,
    pub has_video: bool,
    pub video_uri: Option<String>,
    pub video_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushResponse {
    id: String,
    #[serde(default)]
    has_video_data: bool,
}

/// A record as returned by `GET /api/surveys`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSurvey {
    pub id: String,
    pub mood: u8,
    #[serde(default)]
    pub location: Option<RemoteLocation>,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default)]
    pub video_uri: Option<String>,
    pub timestamp: String,
}

/// HTTP implementation of the remote mirror
#[derive(Clone)]
pub struct HttpRemoteMirror {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteMirror {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the push body, embedding the media file when it can be read
    pub async fn build_payload(record: &SurveyRecord) -> PushPayload {
        let video_base64 = match (&record.video_uri, record.has_video) {
            (Some(path), true) => match tokio::fs::read(path).await {
                Ok(bytes) => {
                    tracing::debug!("Encoded video {:?} ({} bytes)", path, bytes.len());
                    Some(STANDARD.encode(bytes))
                }
                Err(e) => {
                    tracing::warn!("Failed to read video {:?} for upload: {}", path, e);
                    None
                }
            },
            _ => None,
        };

        PushPayload {
            mood: record.mood,
            location: record.location.as_ref().map(|l| RemoteLocation {
                latitude: l.latitude,
                longitude: l.longitude,
            }),
            has_video: record.has_video,
            video_uri: record
                .video_uri
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            video_base64,
        }
    }

    /// Fetch every mirrored record
    pub async fn fetch_all(&self) -> Result<Vec<RemoteSurvey>> {
        let response = self
            .client
            .get(format!("{}/api/surveys", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Remote(format!("GET /api/surveys returned {}", status)));
        }

        let surveys: Vec<RemoteSurvey> = response.json().await?;
        tracing::info!("Fetched {} records from remote", surveys.len());
        Ok(surveys)
    }

    /// Fetch aggregate statistics computed by the remote
    pub async fn fetch_stats(&self) -> Result<MoodStats> {
        let response = self
            .client
            .get(format!("{}/api/stats", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Remote(format!("GET /api/stats returned {}", status)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteMirror for HttpRemoteMirror {
    async fn push(&self, record: &SurveyRecord) -> Option<String> {
        let payload = Self::build_payload(record).await;

        let response = match self
            .client
            .post(format!("{}/api/surveys", self.base_url))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Remote unreachable, keeping record {} local only: {}", record.id, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Remote push of {} failed: {} {}", record.id, status, body);
            return None;
        }

        match response.json::<PushResponse>().await {
            Ok(result) => {
                tracing::info!(
                    "Record {} mirrored as {} (video received: {})",
                    record.id,
                    result.id,
                    result.has_video_data
                );
                Some(result.id)
            }
            Err(e) => {
                tracing::warn!("Failed to parse remote push response: {}", e);
                None
            }
        }
    }

    async fn delete(&self, remote_id: &str) -> bool {
        let result = self
            .client
            .delete(format!("{}/api/surveys/{}", self.base_url, remote_id))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Remote record deleted: {}", remote_id);
                true
            }
            Ok(response) => {
                tracing::warn!("Remote delete of {} returned {}", remote_id, response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Remote unreachable, could not delete {}: {}", remote_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Location;
    use tempfile::TempDir;

    fn record(has_video: bool, video_uri: Option<std::path::PathBuf>) -> SurveyRecord {
        SurveyRecord {
            id: "1".to_string(),
            timestamp: chrono::Utc::now(),
            mood: 2,
            location: Some(Location {
                latitude: 25.0,
                longitude: 121.5,
                timestamp: Some(1),
            }),
            has_video,
            video_uri,
            remote_id: None,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mirror = HttpRemoteMirror::new(&RemoteConfig {
            enabled: true,
            base_url: "http://localhost:8000/".to_string(),
            timeout_secs: Some(5),
        })
        .unwrap();

        assert_eq!(mirror.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_payload_embeds_video() {
        let temp = TempDir::new().unwrap();
        let video = temp.path().join("video_1.mp4");
        std::fs::write(&video, b"abc").unwrap();

        let payload = HttpRemoteMirror::build_payload(&record(true, Some(video))).await;

        assert_eq!(payload.video_base64.as_deref(), Some("YWJj"));
        assert_eq!(
            payload.location,
            Some(RemoteLocation {
                latitude: 25.0,
                longitude: 121.5
            })
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("videoBase64").is_some());
        assert!(json["location"].get("timestamp").is_none());
    }

    #[tokio::test]
    async fn test_payload_without_readable_video() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone.mp4");

        let payload = HttpRemoteMirror::build_payload(&record(true, Some(missing))).await;
        assert_eq!(payload.video_base64, None);

        let payload = HttpRemoteMirror::build_payload(&record(false, None)).await;
        assert_eq!(payload.video_base64, None);
        assert!(!payload.has_video);
    }
}
