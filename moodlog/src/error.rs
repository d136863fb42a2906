//! Error types for moodlog
//!
//! All errors use thiserror for structured error handling.
//! Media and remote-mirror failures never reach this type; they are logged
//! at the point of failure and swallowed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Invalid value: {0}")]
    Validation(String),

    /// The store holds no records, so there is nothing to export.
    /// Callers show a neutral message rather than an error dialog.
    #[error("No records to export")]
    NothingToExport,

    #[error("Remote mirror error: {0}")]
    Remote(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True for the "nothing to export" precondition failure.
    pub fn is_nothing_to_export(&self) -> bool {
        matches!(self, AppError::NothingToExport)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
