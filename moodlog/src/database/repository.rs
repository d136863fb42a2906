//! Repository layer for the key-value store
//!
//! Every persisted entity lives under one key as a JSON document.
//! Multi-key writes go through a single transaction.

use crate::error::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Repository for key-value persistence
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the raw value stored under `key`
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Insert or replace the value stored under `key`
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set key: {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Write several keys in one transaction
    pub async fn set_values(&self, entries: &[(&str, String)]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(*key)
            .bind(value.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!("Set {} keys in one transaction", entries.len());
        Ok(())
    }

    /// Remove `key`; removing a missing key is not an error
    pub async fn remove_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Removed key: {}", key);
        Ok(())
    }

    /// Get and deserialize a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_value(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON document
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_pool;
    use serde::Deserialize;
    use tempfile::TempDir;

    async fn create_test_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = create_pool(&temp_dir.path().join("test.db")).await.unwrap();
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (repo, _temp) = create_test_repo().await;

        assert_eq!(repo.get_value("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_overwrite() {
        let (repo, _temp) = create_test_repo().await;

        repo.set_value("theme", "dark").await.unwrap();
        assert_eq!(repo.get_value("theme").await.unwrap(), Some("dark".to_string()));

        repo.set_value("theme", "light").await.unwrap();
        assert_eq!(repo.get_value("theme").await.unwrap(), Some("light".to_string()));
    }

    #[tokio::test]
    async fn test_remove_value() {
        let (repo, _temp) = create_test_repo().await;

        repo.set_value("k", "v").await.unwrap();
        repo.remove_value("k").await.unwrap();
        repo.remove_value("k").await.unwrap();

        assert_eq!(repo.get_value("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_values_writes_all_keys() {
        let (repo, _temp) = create_test_repo().await;

        repo.set_values(&[("a", "1".to_string()), ("b", "2".to_string())])
            .await
            .unwrap();

        assert_eq!(repo.get_value("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(repo.get_value("b").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Doc {
            name: String,
            count: u32,
        }

        let (repo, _temp) = create_test_repo().await;
        let doc = Doc {
            name: "mood".to_string(),
            count: 3,
        };

        repo.set_json("doc", &doc).await.unwrap();
        let loaded: Option<Doc> = repo.get_json("doc").await.unwrap();

        assert_eq!(loaded, Some(doc));
    }

    #[tokio::test]
    async fn test_corrupt_json_is_an_error() {
        let (repo, _temp) = create_test_repo().await;

        repo.set_value("doc", "{not json").await.unwrap();
        let loaded: Result<Option<Vec<u32>>> = repo.get_json("doc").await;

        assert!(loaded.is_err());
    }
}
