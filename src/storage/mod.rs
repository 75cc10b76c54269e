//! Local key-value persistence
//!
//! [`LocalStore`] is a flat string-to-string store kept in a single SQLite
//! file. It plays the part browser local storage plays for a web client:
//! the chat collection, the theme preference, the signed-in user mirror and
//! the session cookie each live under one key.

use crate::error::{GrowthError, Result};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Key-value store backed by a SQLite file
///
/// Each operation opens its own connection, so clones of the store can be
/// handed to independent components and separate processes may share the
/// same file.
#[derive(Debug, Clone)]
pub struct LocalStore {
    db_path: PathBuf,
}

impl LocalStore {
    /// Create a store in the user's data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "growth", "growth-chat")
            .ok_or_else(|| GrowthError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| GrowthError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("growth.db"))
    }

    /// Create a store that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use growth_chat::storage::LocalStore;
    ///
    /// let dir = tempfile::TempDir::new().unwrap();
    /// let store = LocalStore::new_with_path(dir.path().join("growth.db")).unwrap();
    /// store.set("growth-theme", "dark").unwrap();
    /// assert_eq!(store.get("growth-theme").unwrap().as_deref(), Some("dark"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for store")
                    .map_err(|e| GrowthError::Storage(e.to_string()))?;
            }
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Open the configured store: an explicit path when given, the data
    /// directory otherwise
    pub fn open(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                tracing::debug!("Using local store at {}", p);
                Self::new_with_path(p)
            }
            None => Self::new(),
        }
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open store")
            .map_err(|e| GrowthError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| GrowthError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read key")
            .map_err(|e| GrowthError::Storage(e.to_string()))?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write key")
        .map_err(|e| GrowthError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Remove `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to remove key")
            .map_err(|e| GrowthError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Read and deserialize a JSON value stored under `key`
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse stored value for {}", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it under `key`
    pub fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}
