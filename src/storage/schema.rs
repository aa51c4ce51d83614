use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::{is_lock_error, DatabaseError};

// ============================================================================
// Database
// ============================================================================

/// SQLite-backed key-value store for cached catalog metadata.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// `path` may be `:memory:` for a throwaway store.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InstanceLocked` if another process holds the
    /// database lock, `DatabaseError::Migration` if the schema cannot be
    /// created, and `DatabaseError::Other` for anything else.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // SEC-010: Cache files are created owner-only before the pool opens them
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::OpenOptionsExt;
            let db_path = std::path::Path::new(path);
            if !db_path.exists() {
                if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), error = %e, "Failed to create cache directory");
                    }
                }
                // If creation fails, SQLite reports the error at connect_with
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok();
            }
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // An in-memory database lives and dies with its one connection
        let in_memory = path == ":memory:";
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .idle_timeout((!in_memory).then_some(Duration::from_secs(600)))
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            if is_lock_error(&e.to_string()) {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        tracing::debug!(path = %path, "Opened metadata cache database");
        Ok(db)
    }

    /// Creates the schema. Idempotent.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reads the raw value stored under `key`.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(row.map(|(value,)| value))
    }

    /// Inserts or replaces the value under `key`.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }

    /// Number of stored keys.
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_and_round_trip() {
        let db = Database::open(":memory:").await.unwrap();
        assert_eq!(db.get_value("missing").await.unwrap(), None);

        db.set_value("k", "v1").await.unwrap();
        db.set_value("k", "v2").await.unwrap();
        assert_eq!(db.get_value("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(db.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = std::env::temp_dir().join("podcast_gallery_db_persist");
        std::fs::remove_dir_all(&dir).ok();
        let path = dir.join("cache.db");
        let path = path.to_string_lossy().into_owned();

        {
            let db = Database::open(&path).await.unwrap();
            db.set_value("podcast:a", "{}").await.unwrap();
            db.pool.close().await;
        }

        let db = Database::open(&path).await.unwrap();
        assert_eq!(db.get_value("podcast:a").await.unwrap().as_deref(), Some("{}"));
        db.pool.close().await;

        std::fs::remove_dir_all(&dir).ok();
    }
}
