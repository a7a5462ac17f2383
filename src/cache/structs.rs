use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::cache_context;

/// File-based cache of finished simulation runs, keyed by request hash
pub struct Cache {
    cache_dir: PathBuf,
    runs_dir: PathBuf,
}

impl Cache {
    /// Create a new cache instance
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        let runs_dir = cache_dir.join("runs");

        fs::create_dir_all(&runs_dir).context("Failed to create run cache directory")?;

        Ok(Self {
            cache_dir,
            runs_dir,
        })
    }

    /// Stable key for any serializable request: xxh3 of its canonical JSON
    pub fn key_for<T: Serialize>(request: &T) -> Result<String> {
        let canonical = serde_json::to_vec(request).context("Failed to serialize cache key")?;
        Ok(format!("{:016x}", xxh3_64(&canonical)))
    }

    /// Save data to cache
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let file_path = self.build_path(key);
        let json = serde_json::to_string_pretty(data).with_context(|| cache_context("serialize", key))?;
        fs::write(&file_path, json).with_context(|| cache_context("write", key))?;

        info!("Saved run to cache: {}", file_path.display());
        Ok(())
    }

    /// Load data from cache
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.build_path(key);
        if !file_path.exists() {
            debug!("Cache miss for key {}", key);
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path).with_context(|| cache_context("read", key))?;
        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. First 200 chars: {}",
                file_path,
                json.chars().take(200).collect::<String>()
            )
        })?;

        info!("Loaded run from cache: {}", file_path.display());
        Ok(Some(data))
    }

    /// Check if cached data exists
    pub fn exists(&self, key: &str) -> bool {
        self.build_path(key).exists()
    }

    /// Clear all cached data
    pub fn clear(&self) -> Result<()> {
        fs::remove_dir_all(&self.cache_dir).context("Failed to clear cache")?;
        fs::create_dir_all(&self.runs_dir).context("Failed to recreate cache directory")?;

        info!("Cleared cache directory");
        Ok(())
    }

    fn build_path(&self, key: &str) -> PathBuf {
        self.runs_dir.join(format!("{}.json", key))
    }
}
