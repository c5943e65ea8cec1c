//! Persistent preference store.
//!
//! JSON key-value storage over the same database as the cache store, used
//! by the site for theme selection, favorites, and recent searches. Values
//! are arbitrary JSON; a stored value that no longer parses falls back to
//! the caller's default rather than failing the read.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use crate::Error;
use crate::cache::CacheDb;

/// How many recent searches are retained.
const RECENT_SEARCH_LIMIT: usize = 10;

/// Site color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// Preference store handle.
#[derive(Clone, Debug)]
pub struct Prefs {
    db: CacheDb,
}

impl Prefs {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }

    /// Get a value, returning `default` when the key is absent or the
    /// stored value fails to parse.
    pub async fn get(&self, key: &str, default: Value) -> Result<Value, Error> {
        let key = key.to_string();
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value_json FROM prefs WHERE key = ?1", params![key], |row| {
                        row.get::<_, String>(0)
                    });
                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(value),
                Err(err) => {
                    tracing::warn!(%err, "stored preference failed to parse, using default");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// Set a value, serialized as JSON. Overwrites any previous value.
    pub async fn set(&self, key: &str, value: &Value) -> Result<(), Error> {
        let key = key.to_string();
        let value_json = value.to_string();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO prefs (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![key, value_json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a key. Returns whether a value was present.
    pub async fn remove(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove every stored preference.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.db
            .conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM prefs", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn get_typed<T: Serialize + DeserializeOwned>(&self, key: &str, default: T) -> Result<T, Error> {
        let default_value = serde_json::to_value(&default).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let value = self.get(key, default_value).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Ok(typed),
            Err(err) => {
                tracing::warn!(%err, key, "preference has unexpected shape, using default");
                Ok(default)
            }
        }
    }

    /// Favorited image ids.
    pub async fn favorites(&self) -> Result<Vec<String>, Error> {
        self.get_typed("favorites", Vec::new()).await
    }

    pub async fn set_favorites(&self, favorites: &[String]) -> Result<(), Error> {
        let value = serde_json::to_value(favorites).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        self.set("favorites", &value).await
    }

    /// Theme preference, defaulting to [`Theme::Auto`].
    pub async fn theme(&self) -> Result<Theme, Error> {
        self.get_typed("theme", Theme::Auto).await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), Error> {
        let value = serde_json::to_value(theme).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        self.set("theme", &value).await
    }

    /// Recent search terms, oldest first.
    pub async fn recent_searches(&self) -> Result<Vec<String>, Error> {
        self.get_typed("recent_searches", Vec::new()).await
    }

    /// Store recent searches, keeping only the newest entries.
    pub async fn set_recent_searches(&self, searches: &[String]) -> Result<(), Error> {
        let start = searches.len().saturating_sub(RECENT_SEARCH_LIMIT);
        let value = serde_json::to_value(&searches[start..]).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        self.set("recent_searches", &value).await
    }
}
