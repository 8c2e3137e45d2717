//! On-disk cache of successful service responses.
//!
//! One JSON file per request path, holding the raw body and when it was
//! fetched. Stale or unreadable entries are treated as misses; cache problems
//! are logged and never fail a request.

use crate::utils::error::{GuildError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    body: String,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    directory: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new<P: AsRef<Path>>(directory: P, ttl_hours: i64) -> Result<Self> {
        let ttl = Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl >= Duration::zero())
            .ok_or_else(|| GuildError::InvalidConfigValueError {
                field: "cache.ttl_hours".to_string(),
                value: ttl_hours.to_string(),
                reason: "TTL out of range".to_string(),
            })?;

        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
            ttl,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Utc::now()).await
    }

    async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.entry_path(key);
        let raw = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        if now - entry.fetched_at > self.ttl {
            tracing::debug!("Cache entry for {} is stale", key);
            return None;
        }

        tracing::debug!("Cache hit for {}", key);
        Some(entry.body)
    }

    pub async fn put(&self, key: &str, body: &str) {
        let entry = CacheEntry {
            fetched_at: Utc::now(),
            body: body.to_string(),
        };
        if let Err(e) = self.write_entry(key, &entry).await {
            tracing::warn!("Could not cache response for {}: {}", key, e);
        }
    }

    async fn write_entry(&self, key: &str, entry: &CacheEntry) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let data = serde_json::to_vec(entry)?;
        tokio::fs::write(self.entry_path(key), data).await
    }

    /// Percent-encodes everything outside `[A-Za-z0-9-]` so keys map to
    /// distinct, flat file names.
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(byte as char);
            } else {
                file_name.push_str(&format!("%{:02X}", byte));
            }
        }
        file_name.push_str(".json");
        self.directory.join(file_name)
    }
}
