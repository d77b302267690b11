//! URL-keyed local disk cache for archive files.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};

use crate::types::{HelioError, HelioResult};

/// Environment variable overriding the cache location.
pub const CACHE_ENV: &str = "HELIOSPEC_CACHE";

/// Local disk cache for downloaded files, keyed by URL.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// A cache rooted at a given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A cache at the default location: `$HELIOSPEC_CACHE` if set,
    /// `~/.heliospec/cache` otherwise.
    pub fn with_default_root() -> Self {
        Self::new(default_root())
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a URL lives in the cache: one directory per URL digest,
    /// keeping the remote file name.
    pub fn cached_path(&self, url: &str) -> PathBuf {
        let digest = sha256_hex(url);
        self.root.join(digest).join(url_filename(url))
    }

    /// Whether a URL is already cached.
    pub fn contains(&self, url: &str) -> bool {
        self.cached_path(url).exists()
    }

    /// Fetch a URL into the cache and return the local path, downloading
    /// only when absent or when `update` is set.
    pub fn fetch(&self, client: &Client, url: &str, update: bool) -> HelioResult<PathBuf> {
        let path = self.cached_path(url);
        if path.exists() && !update {
            tracing::debug!(url, path = %path.display(), "cache hit");
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(url, "downloading into cache");
        let response = client.get(url).send()?;
        if !response.status().is_success() {
            return Err(HelioError::Download(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }
        let bytes = response.bytes()?;
        std::fs::write(&path, &bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "cached");
        Ok(path)
    }

    /// Remove everything in the cache.
    pub fn clear(&self) -> HelioResult<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Default cache root: `$HELIOSPEC_CACHE`, or `~/.heliospec/cache`.
pub fn default_root() -> PathBuf {
    if let Ok(dir) = std::env::var(CACHE_ENV) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".heliospec").join("cache")
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Last path segment of a URL, without any query string.
fn url_filename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        "download"
    } else {
        name
    }
}
