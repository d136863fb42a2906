//! Export commands
//!
//! Bundle export, optional ZIP packaging and JSON-only export.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{ExportProgress, ExportResult, JsonExport};
use std::path::PathBuf;

/// Export every record and video into today's bundle directory.
/// With `zip`, the bundle is also packed into a single archive.
pub async fn export_bundle<F>(
    state: &AppState,
    zip: bool,
    on_progress: F,
) -> Result<(ExportResult, Option<PathBuf>)>
where
    F: FnMut(ExportProgress),
{
    let result = state.exporter.export_all_with_progress(on_progress).await?;

    let archive = if zip {
        Some(state.exporter.package(&result).await?)
    } else {
        None
    };

    Ok((result, archive))
}

/// Export records only, into the configured documents directory
pub async fn export_json(state: &AppState) -> Result<JsonExport> {
    state.exporter.export_json(&state.config.documents_dir).await
}
