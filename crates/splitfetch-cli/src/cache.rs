//! Probed metadata kept next to the target between runs.
//!
//! A rerun after a failure or Ctrl-C plans from the cached [`Meta`] so the
//! chunk layout matches the stores already on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use splitfetch::Meta;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct MetaCache {
    url: String,
    meta: Meta,
}

/// `<save_as>.meta.json`
pub fn cache_path(save_as: &Path) -> PathBuf {
    let mut name = save_as.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Cached metadata for `url`, if any. Unreadable or foreign caches are ignored.
pub fn load(save_as: &Path, url: &str) -> Option<Meta> {
    let path = cache_path(save_as);
    let raw = fs::read(&path).ok()?;
    match serde_json::from_slice::<MetaCache>(&raw) {
        Ok(cache) if cache.url == url => {
            debug!(path = %path.display(), "loaded cached metadata");
            Some(cache.meta)
        }
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable metadata cache");
            None
        }
    }
}

pub fn store(save_as: &Path, url: &str, meta: &Meta) -> Result<()> {
    let path = cache_path(save_as);
    let cache = MetaCache {
        url: url.to_string(),
        meta: meta.clone(),
    };
    let json = serde_json::to_vec_pretty(&cache)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn remove(save_as: &Path) {
    let path = cache_path(save_as);
    if let Err(e) = fs::remove_file(&path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove metadata cache");
    }
}
