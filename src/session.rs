//! Session shell: the persisted "logged in" flag.
//!
//! The flag is the only client state that outlives a request. It lives in a
//! [`SessionStore`] handed to the application state at startup, so the
//! shell can be exercised against [`MemorySessionStore`] in tests and
//! against [`SqliteSessionStore`] in production, where it survives restarts.
//!
//! This gate performs no credential verification: any login with a
//! non-blank username and password is accepted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::SessionError;

/// Storage key of the authenticated flag.
pub const AUTH_KEY: &str = "isAuthenticated";

/// Value stored under [`AUTH_KEY`] while logged in.
const AUTH_VALUE: &str = "true";

/// Durable string key-value storage for session flags.
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Read a key, `None` when absent.
    fn get(&self, key: &str) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    /// Insert or replace a key.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Delete a key. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// SQLite-backed session store.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open the store and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:soilwatch.db?mode=rwc" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        Ok(store)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_flags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value FROM session_flags WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_flags (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM session_flags WHERE key = ?
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory session store, discarded with the process.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Login form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    fn is_filled(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

/// Response of `GET /session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
}

/// Login gate over a [`SessionStore`].
#[derive(Clone)]
pub struct Session<S> {
    store: S,
}

impl<S: SessionStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Whether the persisted flag says the user is logged in.
    pub async fn is_authenticated(&self) -> Result<bool, SessionError> {
        let value = self.store.get(AUTH_KEY).await?;
        Ok(value.as_deref() == Some(AUTH_VALUE))
    }

    /// Current session state.
    pub async fn state(&self) -> Result<SessionState, SessionError> {
        Ok(SessionState {
            authenticated: self.is_authenticated().await?,
        })
    }

    /// Accept any filled-in login and persist the flag.
    pub async fn login(&self, request: &LoginRequest) -> Result<SessionState, SessionError> {
        if !request.is_filled() {
            return Err(SessionError::InvalidLogin);
        }
        self.store.set(AUTH_KEY, AUTH_VALUE).await?;
        info!("Session opened");
        Ok(SessionState {
            authenticated: true,
        })
    }

    /// Clear the flag.
    pub async fn logout(&self) -> Result<SessionState, SessionError> {
        self.store.remove(AUTH_KEY).await?;
        info!("Session closed");
        Ok(SessionState {
            authenticated: false,
        })
    }
}
