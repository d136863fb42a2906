//! Export service
//!
//! Snapshots every record plus its media into a self-contained bundle:
//! `<cache>/export_<date>/survey_data.json` followed by `video_1.mp4`,
//! `video_2.mp4`, ... numbered by order of appearance in the record list.
//! Bundles can be packed into a single ZIP for sharing.

use crate::config::EXPORT_MANIFEST_NAME;
use crate::database::SurveyRecord;
use crate::error::{AppError, Result};
use crate::services::records::RecordStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use zip::write::FileOptions;
use zip::ZipWriter;

/// One manifest entry: the record plus its export annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedRecord {
    #[serde(flatten)]
    pub record: SurveyRecord,
    /// Name of the copied media file inside the bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file_name: Option<String>,
    /// Set when the record references media that was gone at export time
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub video_missing: bool,
}

/// Progress event, one per copied media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    /// 1-based index of the media file just copied
    pub video_index: usize,
    pub file_name: String,
}

/// Outcome of a bundle export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub bundle_dir: PathBuf,
    /// Manifest first, then media files in copy order
    pub files: Vec<PathBuf>,
    pub manifest_path: PathBuf,
    pub video_count: usize,
    pub total_records: usize,
}

/// Outcome of a JSON-only export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport {
    pub json_path: PathBuf,
    /// Records referencing media (not included in the file)
    pub video_count: usize,
}

/// Export service
#[derive(Clone)]
pub struct Exporter {
    records: RecordStore,
    cache_dir: PathBuf,
}

impl Exporter {
    pub fn new(records: RecordStore, cache_dir: PathBuf) -> Self {
        Self { records, cache_dir }
    }

    /// Export all records and media into today's bundle directory
    pub async fn export_all(&self) -> Result<ExportResult> {
        self.export_all_with_progress(|_| {}).await
    }

    /// Export all records, reporting each copied media file
    pub async fn export_all_with_progress<F>(&self, mut on_progress: F) -> Result<ExportResult>
    where
        F: FnMut(ExportProgress),
    {
        let records = self.records.list().await?;
        if records.is_empty() {
            return Err(AppError::NothingToExport);
        }

        let bundle_dir = self.cache_dir.join(format!("export_{}", date_stamp()));
        tracing::info!("Exporting {} records to {:?}", records.len(), bundle_dir);

        // Same-day re-export replaces the previous bundle
        if fs::try_exists(&bundle_dir).await? {
            fs::remove_dir_all(&bundle_dir).await?;
        }
        fs::create_dir_all(&bundle_dir).await?;

        let total_records = records.len();
        let mut media_files = Vec::new();
        let mut entries = Vec::with_capacity(total_records);

        for record in records {
            let mut entry = ExportedRecord {
                record,
                video_file_name: None,
                video_missing: false,
            };

            if let Some(source) = entry.record.video_uri.clone() {
                if self.records.media().exists(&source).await {
                    let video_index = media_files.len() + 1;
                    let file_name = format!("video_{}.mp4", video_index);
                    let target = bundle_dir.join(&file_name);

                    fs::copy(&source, &target).await?;

                    media_files.push(target);
                    entry.video_file_name = Some(file_name.clone());
                    on_progress(ExportProgress {
                        video_index,
                        file_name,
                    });
                } else {
                    tracing::warn!(
                        "Media for record {} missing at {:?}, exporting without it",
                        entry.record.id,
                        source
                    );
                    entry.video_missing = true;
                }
            }

            entries.push(entry);
        }

        let manifest_path = bundle_dir.join(EXPORT_MANIFEST_NAME);
        fs::write(&manifest_path, serde_json::to_string_pretty(&entries)?).await?;

        let video_count = media_files.len();
        let mut files = Vec::with_capacity(video_count + 1);
        files.push(manifest_path.clone());
        files.extend(media_files);

        tracing::info!(
            "Export complete: {} records, {} videos",
            total_records,
            video_count
        );

        Ok(ExportResult {
            bundle_dir,
            files,
            manifest_path,
            video_count,
            total_records,
        })
    }

    /// Pack an exported bundle into `<bundle_dir>.zip`
    pub async fn package(&self, export: &ExportResult) -> Result<PathBuf> {
        let zip_path = export.bundle_dir.with_extension("zip");
        let files = export.files.clone();
        let target = zip_path.clone();

        tokio::task::spawn_blocking(move || write_zip(&target, &files))
            .await
            .map_err(|e| AppError::Generic(format!("ZIP task failed: {}", e)))??;

        let size = fs::metadata(&zip_path).await?.len();
        tracing::info!("Bundle packaged: {:?} ({} bytes)", zip_path, size);

        Ok(zip_path)
    }

    /// Write the records alone as `survey_data_<date>.json` in `dir`
    pub async fn export_json(&self, dir: &Path) -> Result<JsonExport> {
        let records = self.records.list().await?;
        if records.is_empty() {
            return Err(AppError::NothingToExport);
        }

        fs::create_dir_all(dir).await?;
        let json_path = dir.join(format!("survey_data_{}.json", date_stamp()));
        fs::write(&json_path, serde_json::to_string_pretty(&records)?).await?;

        let video_count = records.iter().filter(|r| r.video_uri.is_some()).count();
        tracing::info!("Records exported to {:?}", json_path);

        Ok(JsonExport {
            json_path,
            video_count,
        })
    }
}

/// Calendar date (UTC) used in export names
fn date_stamp() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn write_zip(zip_path: &Path, files: &[PathBuf]) -> Result<()> {
    let file = std::fs::File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Generic(format!("Invalid file name in bundle: {:?}", path)))?;

        zip.start_file(name, options)?;
        let mut source = std::fs::File::open(path)?;
        std::io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
