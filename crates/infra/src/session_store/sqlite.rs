//! SQLite-backed durable session store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use super::{SessionStore, StoreError};

/// SQLite-backed session store (survives application restarts).
///
/// The `SessionStore` interface is synchronous; each call runs its query on a
/// one-off runtime. Fine for this store's usage pattern: one small record,
/// written on step transitions and promo changes.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    /// Shared SQLite connection pool, initialized lazily on first use.
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteSessionStore {
    /// Create a new store (lazy initialization).
    ///
    /// The database will be initialized on first use.
    pub fn new() -> Self {
        Self {
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        let db_path = store_db_path()
            .context("failed to determine session store DB path - ensure app data directory is accessible")?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session store directory at {:?}", parent))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());

        let pool = SqlitePool::connect(&db_url)
            .await
            .with_context(|| format!("failed to create SQLite pool for session store at {:?}", db_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key      TEXT PRIMARY KEY,
                value    TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_entries table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        pool_guard
            .as_ref()
            .cloned()
            .context("session store pool not initialized")
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rt = Runtime::new().map_err(|e| StoreError::Read(e.to_string()))?;

        let result: anyhow::Result<Option<String>> = rt.block_on(async {
            let pool = self.get_pool().await?;
            let row = sqlx::query(
                r#"
                SELECT value
                FROM session_entries
                WHERE key = ?1
                "#,
            )
            .bind(key)
            .fetch_optional(&pool)
            .await
            .context("failed to fetch session entry")?;

            match row {
                Some(row) => Ok(Some(row.try_get("value")?)),
                None => Ok(None),
            }
        });

        result.map_err(|e| StoreError::Read(format!("{e:#}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let rt = Runtime::new().map_err(|e| StoreError::Write(e.to_string()))?;
        let saved_at = Utc::now().to_rfc3339();

        let result: anyhow::Result<()> = rt.block_on(async {
            let pool = self.get_pool().await?;
            sqlx::query(
                r#"
                INSERT INTO session_entries (key, value, saved_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key)
                DO UPDATE SET
                    value = excluded.value,
                    saved_at = excluded.saved_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(&saved_at)
            .execute(&pool)
            .await
            .context("failed to upsert session entry")?;
            Ok(())
        });

        result.map_err(|e| StoreError::Write(format!("{e:#}")))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let rt = Runtime::new().map_err(|e| StoreError::Write(e.to_string()))?;

        let result: anyhow::Result<()> = rt.block_on(async {
            let pool = self.get_pool().await?;
            sqlx::query(
                r#"
                DELETE FROM session_entries
                WHERE key = ?1
                "#,
            )
            .bind(key)
            .execute(&pool)
            .await
            .context("failed to delete session entry")?;
            Ok(())
        });

        result.map_err(|e| StoreError::Write(format!("{e:#}")))
    }
}

impl Default for SqliteSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the path to the SQLite store database:
/// `{app_data_dir}/tutorflow/session.db`.
fn store_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("tutorflow");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create session store directory at {:?}", dir))?;

    dir.push("session.db");

    Ok(dir)
}
