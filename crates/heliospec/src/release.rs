//! Data releases of the remote file archive.

use reqwest::blocking::Client;

use crate::types::{HelioError, HelioResult};

/// Base URL of the public file archive.
pub const DEFAULT_BASE_URL: &str = "https://spice.osups.universite-paris-saclay.fr/spice-data/";

/// A tagged data release in the file archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Release tag, e.g. "2.0".
    pub tag: String,
    /// Archive base URL, with a trailing slash.
    pub base_url: String,
}

impl Release {
    /// A release in the default archive.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_base_url(tag, DEFAULT_BASE_URL)
    }

    /// A release under a custom archive base URL.
    pub fn with_base_url(tag: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            tag: tag.into(),
            base_url,
        }
    }

    /// The latest release published in the default archive.
    pub fn latest(client: &Client) -> HelioResult<Self> {
        let tag = latest_tag(client, DEFAULT_BASE_URL)?;
        Ok(Self::new(tag))
    }

    /// Release URL.
    pub fn url(&self) -> String {
        format!("{}release-{}/", self.base_url, self.tag)
    }

    /// URL of the catalog for this release.
    pub fn catalog_url(&self) -> String {
        format!("{}catalog.csv", self.url())
    }

    /// Whether this release is the latest one published in its archive.
    pub fn is_latest(&self, client: &Client) -> HelioResult<bool> {
        Ok(self.tag == latest_tag(client, &self.base_url)?)
    }

    /// Whether the release is accessible online.
    pub fn exists(&self, client: &Client) -> HelioResult<bool> {
        let response = client.get(self.url()).send()?;
        Ok(response.status().is_success())
    }
}

/// Tag of the latest release, from the archive metadata (first line of
/// `metadata/latest-release.txt`).
pub fn latest_tag(client: &Client, base_url: &str) -> HelioResult<String> {
    let url = format!("{base_url}metadata/latest-release.txt");
    tracing::debug!(%url, "fetching latest release tag");
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(HelioError::Release(format!(
            "could not fetch latest release tag: HTTP {} for {url}",
            response.status()
        )));
    }
    let text = response.text()?;
    let tag = text.lines().next().unwrap_or("").trim().to_string();
    if tag.is_empty() {
        return Err(HelioError::Release(format!("empty release tag at {url}")));
    }
    Ok(tag)
}
