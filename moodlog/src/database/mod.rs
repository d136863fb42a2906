//! Database module
//!
//! moodlog keeps its documents in a small SQLite key-value table:
//! - `schema`: table creation and numbered SQL migrations
//! - `repository`: typed get/set over `kv_store`
//! - `record_migrations`: upgrades of the stored record document itself
//! - `models`: records, reminder schedule and related types

pub mod models;
pub mod record_migrations;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Concurrent connections in the application pool
const MAX_CONNECTIONS: u32 = 4;

fn store_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
}

/// Open the store at `db_path`, creating and migrating it as needed.
///
/// Migrations run on their own single connection, closed before the
/// application pool opens.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening store at {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let setup = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(store_options(db_path))
        .await?;
    initialize_database(&setup).await?;
    setup.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(store_options(db_path))
        .await?;

    tracing::debug!("Store pool ready ({} connections max)", MAX_CONNECTIONS);
    Ok(pool)
}
