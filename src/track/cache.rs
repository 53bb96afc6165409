use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

/// File suffix for cache entries
const CACHE_SUFFIX: &str = "bin";

/// Subdirectory of the output dir holding cache entries
const CACHE_DIR: &str = "cache";

/// Persisted raw state of a track: identity plus decoded mono samples.
///
/// Derived features are deliberately absent; they are regenerated from the
/// samples on every activation, so a cached and a freshly decoded track are
/// indistinguishable downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub name: String,
    pub source_path: PathBuf,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Raw-state cache backed by one bincode file per track
pub struct RawCache;

impl RawCache {
    /// Deterministic cache location for a track name
    pub fn entry_path(output_dir: &Path, name: &str) -> PathBuf {
        output_dir
            .join(CACHE_DIR)
            .join(format!("{}.{}", name, CACHE_SUFFIX))
    }

    /// Read an entry. Every failure mode (absent, unreadable, undecodable)
    /// is a recoverable miss.
    pub fn load(path: &Path) -> std::result::Result<CacheEntry, CacheError> {
        let bytes = fs::read(path).map_err(|_| CacheError::Miss {
            path: path.display().to_string(),
        })?;

        bincode::deserialize(&bytes).map_err(|_| CacheError::Miss {
            path: path.display().to_string(),
        })
    }

    /// Persist an entry unless one is already present. Entries are immutable
    /// once written; the first writer wins and later writers are no-ops.
    pub fn store(path: &Path, entry: &CacheEntry) -> Result<()> {
        if path.exists() {
            debug!("Cache entry already present, keeping it: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::WriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let bytes = bincode::serialize(entry).map_err(|e| CacheError::SerializeFailed {
            reason: e.to_string(),
        })?;

        fs::write(path, bytes).map_err(|e| CacheError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(
            "Persisted cache entry for '{}': {}",
            entry.name,
            path.display()
        );
        Ok(())
    }
}
